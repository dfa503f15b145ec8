//! Rendering context.

use super::entity::EntityName;

/// Context a script is rendered for.
///
/// Carries the database the rendered script will run against. A
/// database-scoped command naming that database renders the context's
/// spelling of it; any other database renders literally. Created once per
/// render or diff session and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptingContext {
    current_database_name: Option<EntityName>,
}

impl ScriptingContext {
    /// A context without a current database: names render literally.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current_database_name: None,
        }
    }

    /// A context targeting `database`.
    #[must_use]
    pub fn for_database(database: impl Into<EntityName>) -> Self {
        Self {
            current_database_name: Some(database.into()),
        }
    }

    /// Returns the current database, if any.
    #[must_use]
    pub const fn current_database_name(&self) -> Option<&EntityName> {
        self.current_database_name.as_ref()
    }

    /// Resolves the name a database-scoped command should render.
    #[must_use]
    pub fn database_name<'a>(&'a self, declared: &'a EntityName) -> &'a EntityName {
        match &self.current_database_name {
            Some(current) if current == declared => current,
            _ => declared,
        }
    }
}

impl From<EntityName> for ScriptingContext {
    fn from(database: EntityName) -> Self {
        Self::for_database(database)
    }
}
