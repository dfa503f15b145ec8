#![allow(dead_code)]

use kql_delta_core::{
    parse_script, reconcile, Command, ParseScriptError, ScriptRenderer, ScriptingContext,
};

pub fn parse(script: &str) -> Vec<Command> {
    parse_script(script).unwrap_or_else(|e| panic!("Failed to parse: {script}\nError: {e}"))
}

pub fn parse_err(script: &str) -> ParseScriptError {
    parse_script(script).expect_err(&format!("Expected parse error for: {script}"))
}

pub fn render(commands: &[Command]) -> String {
    ScriptRenderer::new(ScriptingContext::new()).render(commands)
}

/// Delta between two scripts, rendered one statement per entry.
pub fn delta(current: &str, target: &str) -> Vec<String> {
    let ctx = ScriptingContext::new();
    reconcile(&parse(current), &parse(target))
        .unwrap_or_else(|e| panic!("Failed to reconcile\nError: {e}"))
        .iter()
        .map(|c| c.to_script(&ctx))
        .collect()
}

/// Verifies that rendering is a fixed point: parsing the rendered script
/// gives back equal commands that render to the same text.
pub fn round_trip(script: &str) {
    let commands = parse(script);
    let rendered1 = render(&commands);
    let reparsed = parse(&rendered1);
    let rendered2 = render(&reparsed);
    assert_eq!(commands, reparsed, "Commands changed.\n  Input: {script}\n  Rendered: {rendered1}");
    assert_eq!(
        rendered1, rendered2,
        "Round-trip failed.\n  Input:    {script}\n  First:    {rendered1}\n  Second:   {rendered2}"
    );
}

/// Round-trips `script` rendered for `database`. Database-scoped commands
/// naming another database keep their name; the text must also match the
/// rendering without a context.
pub fn round_trip_with_context(script: &str, database: &str) {
    let commands = parse(script);
    let plain = render(&commands);
    let rendered = ScriptRenderer::new(ScriptingContext::for_database(database)).render(&commands);
    let reparsed = parse(&rendered);
    assert_eq!(
        commands, reparsed,
        "Commands changed under context '{database}'.\n  Input: {script}\n  Rendered: {rendered}"
    );
    assert_eq!(
        plain, rendered,
        "Context '{database}' changed the text.\n  Input: {script}\n  Rendered: {rendered}"
    );
}
