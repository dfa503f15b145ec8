//! Script rendering.

use crate::command::{Command, ScriptingContext};

/// Renders command sequences into script text.
///
/// Statements appear in the given order, separated by a blank line. Output
/// depends only on the commands and the context, so rendering twice gives
/// identical text.
#[derive(Debug, Clone, Default)]
pub struct ScriptRenderer {
    context: ScriptingContext,
    headers: bool,
}

impl ScriptRenderer {
    /// Creates a renderer for `context`.
    #[must_use]
    pub const fn new(context: ScriptingContext) -> Self {
        Self {
            context,
            headers: false,
        }
    }

    /// Precedes each statement with a `// <friendly name>` comment line.
    #[must_use]
    pub const fn with_headers(mut self) -> Self {
        self.headers = true;
        self
    }

    #[must_use]
    pub const fn context(&self) -> &ScriptingContext {
        &self.context
    }

    /// Renders every command, one statement per block.
    #[must_use]
    pub fn render(&self, commands: &[Command]) -> String {
        let mut script = String::new();
        for (i, command) in commands.iter().enumerate() {
            if i > 0 {
                script.push_str("\n\n");
            }
            if self.headers {
                script.push_str("// ");
                script.push_str(command.friendly_name());
                script.push('\n');
            }
            script.push_str(&command.to_script(&self.context));
        }
        if !script.is_empty() {
            script.push('\n');
        }
        script
    }
}
