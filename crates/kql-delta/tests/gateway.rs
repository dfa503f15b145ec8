//! Gateway factory tests.

mod common;
use common::*;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use kql_delta::parameters::{TokenParameterization, TokenProviderParameterization};
use kql_delta::prelude::*;

fn token_provider(uris: &[&str]) -> TokenProviderParameterization {
    TokenProviderParameterization {
        login: None,
        tokens: Some(
            uris.iter()
                .enumerate()
                .map(|(i, uri)| {
                    (
                        format!("t{i}"),
                        TokenParameterization {
                            cluster_uri: (*uri).to_string(),
                            token: format!("token-{i}"),
                        },
                    )
                })
                .collect(),
        ),
    }
}

#[test]
fn concurrent_callers_connect_once_per_cluster() {
    let connector = RecordingConnector {
        connect_delay: Some(Duration::from_millis(20)),
        ..RecordingConnector::default()
    };
    let factory = Arc::new(GatewayFactory::new(
        connector,
        Some(token_provider(&[CLUSTER, "https://other.kusto.windows.net"])),
    ));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let factory = Arc::clone(&factory);
            std::thread::spawn(move || {
                let uri = if i % 2 == 0 {
                    CLUSTER.to_uppercase()
                } else {
                    String::from("https://other.kusto.windows.net ")
                };
                factory
                    .create_gateway(&uri, &format!("db{i}"))
                    .map(|gateway| gateway.cluster().clone())
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(factory.connector().connections.load(Ordering::SeqCst), 2);
    assert_eq!(factory.provider_count(), 2);
}

#[tokio::test]
async fn gateways_share_the_provider() {
    let connector = RecordingConnector::default().with_schema("db1", ".create table T (a:string)");
    let factory = GatewayFactory::new(connector, Some(token_provider(&[CLUSTER])));

    let first = factory.create_gateway(CLUSTER, "db1").unwrap();
    let second = factory.create_gateway(CLUSTER, "db2").unwrap();

    assert_eq!(
        first.fetch_schema_script().await.unwrap(),
        ".create table T (a:string)"
    );
    assert!(second.fetch_schema_script().await.unwrap().is_empty());

    second
        .execute_commands(&[String::from(".drop table X")])
        .await
        .unwrap();
    assert_eq!(
        factory.connector().executed(),
        vec![(String::from("db2"), String::from(".drop table X"))]
    );
    assert_eq!(factory.connector().connections.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_resolution_leaves_cache_empty() {
    let factory = GatewayFactory::new(
        RecordingConnector::default(),
        Some(token_provider(&[CLUSTER])),
    );
    let err = factory
        .create_gateway("https://unknown.kusto.windows.net", "db")
        .err()
        .unwrap();
    assert_eq!(
        err.to_string(),
        "No token was provided for https://unknown.kusto.windows.net"
    );
    assert_eq!(factory.provider_count(), 0);
    assert_eq!(factory.connector().connections.load(Ordering::SeqCst), 0);
}
