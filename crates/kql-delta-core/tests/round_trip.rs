//! Rendering then re-parsing every supported command yields equal
//! commands.

mod common;
use common::*;

use kql_delta_core::{ScriptRenderer, ScriptingContext};

#[test]
fn tables_and_columns() {
    round_trip(".create table T (a:string, b:long, c:datetime)");
    round_trip(".create-merge table ['My Table'] (['odd col']:dynamic, [x]:guid)");
    round_trip(".alter-merge table T (d:decimal, e:timespan)");
    round_trip(".drop table T");
    round_trip(".drop table T columns (a, ['b c'])");
    round_trip(".drop column T.a");
    round_trip(".alter column ['T-1'].a type=boolean");
}

#[test]
fn type_aliases_render_canonically() {
    let commands = parse(".create table T (a:boolean, b:double, c:int64, d:uniqueid)");
    assert_eq!(
        render(&commands),
        ".create table T (a:bool, b:real, c:long, d:guid)\n"
    );
}

#[test]
fn functions() {
    round_trip(".create function F() { T }");
    round_trip(
        ".create-or-alter function with (folder=\"Reports\\\\Daily\", docstring='Daily \"top\" rows') \
         TopRows(t:(*), n:long) {\n  t\n  | top n by Timestamp desc\n}",
    );
    round_trip(
        ".create-or-alter function Typed(t:(Level:string, Count:long)) { t | summarize sum(Count) by Level }",
    );
    round_trip(
        ".create-or-alter function Nested() {\n  let f = (x:long) { x + 1 };\n  range i from 1 to 3 step 1 | extend j = f(i)\n}",
    );
}

#[test]
fn function_body_with_strings_and_brackets() {
    round_trip(
        ".create-or-alter function Q() { T | where Name == '}' | extend d = dynamic({\"a\": [1, 2]}) }",
    );
}

#[test]
fn database_policies_keep_their_name_under_another_context() {
    let scripts = [
        ".delete database dev policy retention",
        ".delete database dev policy ingestionbatching",
        ".alter database dev policy retention '{\"SoftDeletePeriod\": \"30d\"}'",
        ".alter database dev policy ingestionbatching '{\"MaximumNumberOfItems\": 500}'",
        ".delete table dev policy retention",
    ];
    for script in scripts {
        round_trip_with_context(script, "other");
        round_trip_with_context(script, "dev");
    }
    let commands = parse(scripts[0]);
    let rendered = ScriptRenderer::new(ScriptingContext::for_database("other")).render(&commands);
    assert_eq!(rendered, ".delete database dev policy retention\n");
}

#[test]
fn policies() {
    round_trip(".delete table T policy retention");
    round_trip(".delete database D policy retention");
    round_trip(".delete table ['my table'] policy ingestionbatching");
    round_trip(".delete database D policy ingestionbatching");
    round_trip(
        ".alter table T policy retention '{\"SoftDeletePeriod\": \"30d\", \"Recoverability\": \"Enabled\"}'",
    );
    round_trip(
        ".alter database D policy ingestionbatching ```\n{\n  \"MaximumBatchingTimeSpan\": \"00:05:00\",\n  \"MaximumNumberOfItems\": 500,\n  \"MaximumRawDataSizeMB\": 1024\n}\n```",
    );
}

#[test]
fn whole_script() {
    round_trip(
        "// schema\n\
         .create table Events (Timestamp:datetime, Level:string)\n\
         .create table Metrics (Name:string, Value:real)\n\
         .alter table Events policy retention @'{\"SoftDeletePeriod\":\"365.00:00:00\"}'\n\
         .create-or-alter function with (folder='views') Errors() { Events | where Level == 'Error' }\n\
         .delete database Telemetry policy ingestionbatching",
    );
}
