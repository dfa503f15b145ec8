//! Entity names and kinds.

use std::fmt;

use super::error::CommandError;
use crate::lexer::Keyword;

/// The kind of schema object a command acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    Database,
    Table,
    Column,
    Function,
    Cluster,
}

impl EntityType {
    /// Returns the keyword used for this entity type in scripts.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Table => "table",
            Self::Column => "column",
            Self::Function => "function",
            Self::Cluster => "cluster",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized entity identifier.
///
/// Names are trimmed and case-preserving; two names are equal when their
/// trimmed text is equal. Quoting is a rendering concern: the stored text
/// never carries brackets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityName(String);

impl EntityName {
    /// Creates a name from unquoted text.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_string())
    }

    /// Builds a name from a raw identifier token, stripping `[name]`,
    /// `['name']` and `["name"]` quoting.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidName` when the token is empty or its
    /// quoting is malformed.
    pub fn from_code(raw: &str) -> Result<Self, CommandError> {
        let raw = raw.trim();
        let name = match raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            Some(inner) => unquote(inner.trim()).ok_or_else(|| CommandError::InvalidName(raw.into()))?,
            None => raw.to_string(),
        };
        let name = Self::new(name);
        if name.0.is_empty() {
            return Err(CommandError::InvalidName(raw.into()));
        }
        Ok(name)
    }

    /// Returns the unquoted name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Renders the name so the grammar reads it back unchanged.
    #[must_use]
    pub fn to_script(&self) -> String {
        if is_plain_identifier(&self.0) {
            self.0.clone()
        } else {
            let escaped = self.0.replace('\\', "\\\\").replace('\'', "\\'");
            format!("['{escaped}']")
        }
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Strips the quotes of a bracketed name body; bare bodies pass through.
fn unquote(inner: &str) -> Option<String> {
    let quote = match inner.chars().next() {
        Some(q @ ('\'' | '"')) => q,
        _ => return Some(inner.to_string()),
    };
    let body = inner
        .strip_prefix(quote)
        .and_then(|s| s.strip_suffix(quote))?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(chars.next()?);
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// `[A-Za-z_][A-Za-z0-9_]*` and not a reserved word.
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    head_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && Keyword::from_str(name).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_surrounding_whitespace() {
        assert_eq!(EntityName::new("  T "), EntityName::new("T"));
        assert_ne!(EntityName::new("t"), EntityName::new("T"));
    }

    #[test]
    fn test_from_code_strips_quoting() {
        assert_eq!(EntityName::from_code("T").unwrap().name(), "T");
        assert_eq!(EntityName::from_code("[T]").unwrap().name(), "T");
        assert_eq!(
            EntityName::from_code("['my table']").unwrap().name(),
            "my table"
        );
        assert_eq!(EntityName::from_code("[\"x-y\"]").unwrap().name(), "x-y");
        assert_eq!(EntityName::from_code(r"['it\'s']").unwrap().name(), "it's");
    }

    #[test]
    fn test_from_code_rejects_empty() {
        assert!(EntityName::from_code("").is_err());
        assert!(EntityName::from_code("['']").is_err());
        assert!(EntityName::from_code("['unterminated]").is_err());
    }

    #[test]
    fn test_to_script_quotes_when_needed() {
        assert_eq!(EntityName::new("Events").to_script(), "Events");
        assert_eq!(EntityName::new("_x1").to_script(), "_x1");
        assert_eq!(EntityName::new("my table").to_script(), "['my table']");
        assert_eq!(EntityName::new("1st").to_script(), "['1st']");
        assert_eq!(EntityName::new("it's").to_script(), r"['it\'s']");
        // reserved words must be quoted to be read back as names
        assert_eq!(EntityName::new("table").to_script(), "['table']");
    }

    #[test]
    fn test_to_script_round_trips_through_from_code() {
        for raw in ["Events", "my table", "it's", "back\\slash", "policy", "a.b-c"] {
            let name = EntityName::new(raw);
            assert_eq!(EntityName::from_code(&name.to_script()).unwrap(), name);
        }
    }
}
