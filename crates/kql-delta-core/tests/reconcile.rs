//! Integration tests for the reconciliation engine.

mod common;
use common::*;

use pretty_assertions::assert_eq;

use kql_delta_core::command::CommandKind;
use kql_delta_core::delta::rank;
use kql_delta_core::{reconcile, ReconcileError, ReconcileOptions, Reconciler};

const SCHEMA_V1: &str = "\
.create table Events (Timestamp:datetime, Level:string, Message:string)
.create table Sessions (Id:guid, Start:datetime)
.alter table Events policy retention '{\"SoftDeletePeriod\":\"90d\",\"Recoverability\":\"Enabled\"}'
.alter database Telemetry policy ingestionbatching '{\"MaximumBatchingTimeSpan\":\"00:05:00\"}'
.create-or-alter function with (folder='views') Errors() { Events | where Level == 'Error' }
.create-or-alter function Active() { Sessions | where isnull(End) }
";

const SCHEMA_V2: &str = "\
.create table Events (Timestamp:datetime, Level:string, Message:string, Host:string)
.create table Users (Id:guid, Name:string)
.alter table Events policy retention '{\"SoftDeletePeriod\":\"30d\",\"Recoverability\":\"Enabled\"}'
.alter table Users policy retention '{\"SoftDeletePeriod\":\"365d\"}'
.alter database Telemetry policy ingestionbatching '{\"MaximumBatchingTimeSpan\":\"5m\"}'
.create-or-alter function with (folder='views') Errors() {
    Events
    | where Level == 'Error'
}
";

// =============================================================================
// Identity
// =============================================================================

#[test]
fn identity_is_empty() {
    assert!(delta(SCHEMA_V1, SCHEMA_V1).is_empty());
    assert!(delta(SCHEMA_V2, SCHEMA_V2).is_empty());
    assert!(delta("", "").is_empty());
}

#[test]
fn v1_to_v2() {
    assert_eq!(
        delta(SCHEMA_V1, SCHEMA_V2),
        vec![
            ".drop function Active",
            ".create table Users (Id:guid, Name:string)",
            ".alter-merge table Events (Host:string)",
            ".alter table Events policy retention ```{\"Recoverability\":\"Enabled\",\"SoftDeletePeriod\":\"30.00:00:00\"}```",
            ".alter table Users policy retention ```{\"SoftDeletePeriod\":\"365.00:00:00\"}```",
            ".drop table Sessions",
        ]
    );
}

// =============================================================================
// Create / delete symmetry
// =============================================================================

#[test]
fn create_and_delete_are_symmetric() {
    let forward = delta("", ".create table T (a:string)\n.create function F() { T }");
    let backward = delta(".create table T (a:string)\n.create function F() { T }", "");
    assert_eq!(
        forward,
        vec![
            ".create table T (a:string)",
            ".create-or-alter function F() {\nT\n}",
        ]
    );
    assert_eq!(backward, vec![".drop function F", ".drop table T"]);
}

#[test]
fn policy_symmetry() {
    let set = ".alter table T policy ingestionbatching '{\"MaximumNumberOfItems\":10}'";
    assert_eq!(
        delta("", set),
        vec![".alter table T policy ingestionbatching ```{\"MaximumNumberOfItems\":10}```"]
    );
    assert_eq!(
        delta(set, ""),
        vec![".delete table T policy ingestionbatching"]
    );
}

// =============================================================================
// Policy conventions
// =============================================================================

#[test]
fn explicit_delete_in_target_is_emitted() {
    assert_eq!(
        delta(
            ".create table T (a:string)",
            ".create table T (a:string)\n.delete table T policy retention"
        ),
        vec![".delete table T policy retention"]
    );
}

#[test]
fn absent_policy_in_target_is_no_opinion() {
    assert!(delta(
        ".create table T (a:string)\n.delete table T policy retention",
        ".create table T (a:string)"
    )
    .is_empty());
}

#[test]
fn delete_replaces_set_policy() {
    assert_eq!(
        delta(
            ".alter table T policy retention '{\"SoftDeletePeriod\":\"1d\"}'",
            ".delete table T policy retention"
        ),
        vec![".delete table T policy retention"]
    );
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn container_before_dependents_on_create() {
    let commands = delta(
        "",
        ".alter table T policy retention '{}'\n\
         .alter-merge table T (b:long)\n\
         .create table T (a:string)",
    );
    assert_eq!(commands[0], ".create table T (b:long, a:string)");
    assert!(commands[1].starts_with(".alter table T policy retention"));
}

#[test]
fn dependents_before_container_on_delete() {
    let commands = delta(
        ".create table T (a:string)\n.alter table T policy retention '{}'",
        "",
    );
    assert_eq!(
        commands,
        vec![".delete table T policy retention", ".drop table T"]
    );
}

#[test]
fn rank_table_is_total_and_consistent() {
    let kinds = [
        CommandKind::DropFunction,
        CommandKind::DropTableColumns,
        CommandKind::CreateTable,
        CommandKind::AlterMergeTableColumns,
        CommandKind::AlterColumnType,
        CommandKind::CreateFunction,
        CommandKind::AlterRetentionPolicy,
        CommandKind::DeleteRetentionPolicy,
        CommandKind::DropTable,
    ];
    for pair in kinds.windows(2) {
        assert!(rank(pair[0]) < rank(pair[1]), "{pair:?}");
    }
    assert_eq!(
        rank(CommandKind::AlterRetentionPolicy),
        rank(CommandKind::AlterIngestionBatchingPolicy)
    );
    assert_eq!(
        rank(CommandKind::DeleteRetentionPolicy),
        rank(CommandKind::DeleteIngestionBatchingPolicy)
    );
}

// =============================================================================
// Options and errors
// =============================================================================

#[test]
fn recreate_strategy_for_type_changes() {
    let current = parse(".create table T (a:string, b:int)");
    let target = parse(".create table T (a:string, b:long)");
    let options = ReconcileOptions::new().with_recreated_columns();
    let commands = Reconciler::with_options(options)
        .reconcile(&current, &target)
        .unwrap();
    assert_eq!(
        render(&commands),
        ".drop table T columns (b)\n\n.alter-merge table T (b:long)\n"
    );
}

#[test]
fn unsupported_state_command_names_friendly_name() {
    let current = parse(".create table T (a:string)");
    let target = parse(".alter column T.a type=long");
    let err = reconcile(&current, &target).unwrap_err();
    assert!(matches!(err, ReconcileError::Unsupported { .. }));
    assert!(err.to_string().contains(".alter column type"));
}
