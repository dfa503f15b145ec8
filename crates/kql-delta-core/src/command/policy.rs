//! Entity-scoped policy commands.
//!
//! Policies attach to a table or a database. The payload is typed per
//! policy kind and compared structurally, so two scripts that format the
//! same JSON differently declare the same policy.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::context::ScriptingContext;
use super::entity::{EntityName, EntityType};
use super::error::CommandError;
use super::{Command, ControlCommand};
use crate::ast::{SyntaxElement, SyntaxKind, SyntaxNode};
use crate::lexer::{Keyword, Token, TokenKind};

/// Supported policy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PolicyKind {
    Retention,
    IngestionBatching,
}

impl PolicyKind {
    /// The policy keyword used in scripts.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Retention => "retention",
            Self::IngestionBatching => "ingestionbatching",
        }
    }

    const fn alter_friendly_name(self) -> &'static str {
        match self {
            Self::Retention => ".alter <entity> policy retention",
            Self::IngestionBatching => ".alter <entity> policy ingestionbatching",
        }
    }

    const fn delete_friendly_name(self) -> &'static str {
        match self {
            Self::Retention => ".delete <entity> policy retention",
            Self::IngestionBatching => ".delete <entity> policy ingestionbatching",
        }
    }

    const fn alter_description(self) -> &'static str {
        match self {
            Self::Retention => "Alter retention policy",
            Self::IngestionBatching => "Alter ingestion batching policy",
        }
    }

    const fn delete_description(self) -> &'static str {
        match self {
            Self::Retention => "Delete retention policy",
            Self::IngestionBatching => "Delete ingestion batching policy",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A duration as written in policies: `1.00:00:00`, `00:05:00`, `30d`,
/// `5m`. Stored in milliseconds and rendered as `[d.]hh:mm:ss[.fff]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct Timespan {
    millis: u64,
}

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;

impl Timespan {
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Returns `None` when the span doesn't fit in milliseconds.
    #[must_use]
    pub const fn from_days(days: u64) -> Option<Self> {
        match days.checked_mul(MILLIS_PER_DAY) {
            Some(millis) => Some(Self::from_millis(millis)),
            None => None,
        }
    }

    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.millis
    }

    fn parse_clock(text: &str) -> Option<u64> {
        let (days, clock) = match text.split_once('.') {
            Some((days, clock)) if clock.contains(':') => (days.parse::<u64>().ok()?, clock),
            _ => (0, text),
        };
        let mut parts = clock.split(':');
        let hours: u64 = parts.next()?.parse().ok()?;
        let minutes: u64 = parts.next()?.parse().ok()?;
        let seconds = parts.next().unwrap_or("0");
        if parts.next().is_some() || minutes >= 60 {
            return None;
        }
        let (whole, fraction) = seconds.split_once('.').unwrap_or((seconds, ""));
        let whole: u64 = whole.parse().ok()?;
        if whole >= 60 || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let fraction_millis = format!("{fraction:0<3}")
            .get(..3)
            .and_then(|ms| ms.parse::<u64>().ok())?;
        days.checked_mul(MILLIS_PER_DAY)?
            .checked_add(hours.checked_mul(MILLIS_PER_HOUR)?)?
            .checked_add(minutes * MILLIS_PER_MINUTE)?
            .checked_add(whole * MILLIS_PER_SECOND)?
            .checked_add(fraction_millis)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn parse_literal(text: &str) -> Option<u64> {
        let split = text.find(|c: char| c.is_ascii_alphabetic())?;
        let (amount, unit) = text.split_at(split);
        let amount: f64 = amount.trim().parse().ok()?;
        let unit_millis = match unit.trim().to_ascii_lowercase().as_str() {
            "d" | "day" | "days" => MILLIS_PER_DAY,
            "h" | "hr" | "hrs" | "hour" | "hours" => MILLIS_PER_HOUR,
            "m" | "min" | "minute" | "minutes" => MILLIS_PER_MINUTE,
            "s" | "sec" | "second" | "seconds" => MILLIS_PER_SECOND,
            "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => 1,
            _ => return None,
        };
        let millis = (amount * unit_millis as f64).round();
        if !millis.is_finite() || millis < 0.0 || millis >= u64::MAX as f64 {
            return None;
        }
        Some(millis as u64)
    }
}

impl FromStr for Timespan {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let millis = if text.contains(':') {
            Self::parse_clock(text)
        } else {
            Self::parse_literal(text)
        };
        millis
            .map(Self::from_millis)
            .ok_or_else(|| CommandError::InvalidTimespan(text.to_string()))
    }
}

impl TryFrom<String> for Timespan {
    type Error = CommandError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.millis / MILLIS_PER_DAY;
        let hours = self.millis % MILLIS_PER_DAY / MILLIS_PER_HOUR;
        let minutes = self.millis % MILLIS_PER_HOUR / MILLIS_PER_MINUTE;
        let seconds = self.millis % MILLIS_PER_MINUTE / MILLIS_PER_SECOND;
        let millis = self.millis % MILLIS_PER_SECOND;
        if days > 0 {
            write!(f, "{days}.")?;
        }
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")?;
        if millis > 0 {
            write!(f, ".{millis:03}")?;
        }
        Ok(())
    }
}

/// Whether data is recoverable after soft deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Recoverability {
    Enabled,
    Disabled,
}

impl Recoverability {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Disabled => "Disabled",
        }
    }
}

/// A typed policy payload.
pub trait Policy: fmt::Debug + Clone + PartialEq + DeserializeOwned {
    /// The policy kind this payload belongs to.
    const KIND: PolicyKind;

    /// Serializes the payload, omitting unset properties.
    fn to_json(&self) -> Value;
}

/// Retention policy payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct RetentionPolicy {
    pub soft_delete_period: Option<Timespan>,
    pub recoverability: Option<Recoverability>,
}

impl Policy for RetentionPolicy {
    const KIND: PolicyKind = PolicyKind::Retention;

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        if let Some(period) = self.soft_delete_period {
            map.insert("SoftDeletePeriod".into(), period.to_string().into());
        }
        if let Some(recoverability) = self.recoverability {
            map.insert("Recoverability".into(), recoverability.as_str().into());
        }
        Value::Object(map)
    }
}

/// Ingestion batching policy payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct IngestionBatchingPolicy {
    pub maximum_batching_time_span: Option<Timespan>,
    pub maximum_number_of_items: Option<u64>,
    #[serde(rename = "MaximumRawDataSizeMB")]
    pub maximum_raw_data_size_mb: Option<u64>,
}

impl Policy for IngestionBatchingPolicy {
    const KIND: PolicyKind = PolicyKind::IngestionBatching;

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        if let Some(span) = self.maximum_batching_time_span {
            map.insert("MaximumBatchingTimeSpan".into(), span.to_string().into());
        }
        if let Some(items) = self.maximum_number_of_items {
            map.insert("MaximumNumberOfItems".into(), items.into());
        }
        if let Some(size) = self.maximum_raw_data_size_mb {
            map.insert("MaximumRawDataSizeMB".into(), size.into());
        }
        Value::Object(map)
    }
}

/// The table or database a policy command acts on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityPolicyTarget {
    entity_type: EntityType,
    entity_name: EntityName,
}

impl EntityPolicyTarget {
    /// Creates a target.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::UnsupportedEntityType` unless `entity_type`
    /// is a table or a database.
    pub fn new(
        entity_type: EntityType,
        entity_name: impl Into<EntityName>,
    ) -> Result<Self, CommandError> {
        match entity_type {
            EntityType::Table | EntityType::Database => Ok(Self {
                entity_type,
                entity_name: entity_name.into(),
            }),
            _ => Err(CommandError::UnsupportedEntityType { entity_type }),
        }
    }

    #[must_use]
    pub fn table(name: impl Into<EntityName>) -> Self {
        Self {
            entity_type: EntityType::Table,
            entity_name: name.into(),
        }
    }

    #[must_use]
    pub fn database(name: impl Into<EntityName>) -> Self {
        Self {
            entity_type: EntityType::Database,
            entity_name: name.into(),
        }
    }

    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    #[must_use]
    pub const fn entity_name(&self) -> &EntityName {
        &self.entity_name
    }

    /// Points a database target at `database`. Table targets are unchanged.
    #[must_use]
    pub fn with_database(self, database: &EntityName) -> Self {
        match self.entity_type {
            EntityType::Database => Self::database(database.clone()),
            EntityType::Table | EntityType::Column | EntityType::Function | EntityType::Cluster => {
                self
            }
        }
    }

    /// Reads the target of a policy statement: the first `table` or
    /// `database` keyword, then the first name reference.
    fn from_code(node: &SyntaxNode, command: &'static str) -> Result<Self, CommandError> {
        let keyword = node
            .find_first(|e| e.is_keyword(Keyword::Table) || e.is_keyword(Keyword::Database))
            .and_then(SyntaxElement::as_token)
            .and_then(Token::as_keyword)
            .ok_or(CommandError::MissingEntityKeyword { command })?;
        let entity_type = if keyword == Keyword::Table {
            EntityType::Table
        } else {
            EntityType::Database
        };
        let name = node
            .first_name_reference()
            .ok_or(CommandError::MissingName { command })?;
        Self::new(entity_type, EntityName::from_code(name.name())?)
    }

    /// A database matching the context's current database renders as the
    /// context names it; any other name renders as written.
    fn to_script(&self, ctx: &ScriptingContext) -> String {
        let name = match self.entity_type {
            EntityType::Database => ctx.database_name(&self.entity_name),
            _ => &self.entity_name,
        };
        format!("{} {}", self.entity_type, name.to_script())
    }
}

fn policy_payload<P: Policy>(node: &SyntaxNode) -> Result<P, CommandError> {
    let text = node
        .first_node(SyntaxKind::PolicyPayload)
        .and_then(|payload| {
            payload.child_tokens().find_map(|t| match &t.kind {
                TokenKind::String(value) => Some(value.as_str()),
                _ => None,
            })
        })
        .ok_or(CommandError::MissingElement {
            command: P::KIND.alter_description(),
            element: "policy payload",
        })?;
    serde_json::from_str(text).map_err(|source| CommandError::InvalidPolicy {
        policy: P::KIND,
        source,
    })
}

/// `.alter <table|database> N policy <kind> ```{json}````
#[derive(Debug, Clone, PartialEq)]
pub struct AlterPolicyCommand<P> {
    target: EntityPolicyTarget,
    policy: P,
}

impl<P: Policy> AlterPolicyCommand<P> {
    #[must_use]
    pub const fn new(target: EntityPolicyTarget, policy: P) -> Self {
        Self { target, policy }
    }

    #[must_use]
    pub const fn target(&self) -> &EntityPolicyTarget {
        &self.target
    }

    #[must_use]
    pub const fn policy(&self) -> &P {
        &self.policy
    }

    #[must_use]
    pub fn with_database(self, database: &EntityName) -> Self {
        Self::new(self.target.with_database(database), self.policy)
    }
}

impl<P: Policy> ControlCommand for AlterPolicyCommand<P> {
    const FRIENDLY_NAME: &'static str = P::KIND.alter_friendly_name();

    fn from_code(node: &SyntaxNode) -> Result<Self, CommandError> {
        let target = EntityPolicyTarget::from_code(node, P::KIND.alter_description())?;
        Ok(Self::new(target, policy_payload(node)?))
    }

    fn to_script(&self, ctx: &ScriptingContext) -> String {
        format!(
            ".alter {} policy {} ```{}```",
            self.target.to_script(ctx),
            P::KIND,
            self.policy.to_json()
        )
    }
}

/// `.delete <table|database> N policy <kind>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePolicyCommand<P> {
    target: EntityPolicyTarget,
    kind: PhantomData<P>,
}

impl<P: Policy> DeletePolicyCommand<P> {
    #[must_use]
    pub const fn new(target: EntityPolicyTarget) -> Self {
        Self {
            target,
            kind: PhantomData,
        }
    }

    #[must_use]
    pub const fn target(&self) -> &EntityPolicyTarget {
        &self.target
    }

    #[must_use]
    pub fn with_database(self, database: &EntityName) -> Self {
        Self::new(self.target.with_database(database))
    }
}

impl<P: Policy> ControlCommand for DeletePolicyCommand<P> {
    const FRIENDLY_NAME: &'static str = P::KIND.delete_friendly_name();

    fn from_code(node: &SyntaxNode) -> Result<Self, CommandError> {
        let target = EntityPolicyTarget::from_code(node, P::KIND.delete_description())?;
        Ok(Self::new(target))
    }

    fn to_script(&self, ctx: &ScriptingContext) -> String {
        format!(".delete {} policy {}", self.target.to_script(ctx), P::KIND)
    }
}

pub type AlterRetentionPolicyCommand = AlterPolicyCommand<RetentionPolicy>;
pub type DeleteRetentionPolicyCommand = DeletePolicyCommand<RetentionPolicy>;
pub type AlterIngestionBatchingPolicyCommand = AlterPolicyCommand<IngestionBatchingPolicy>;
pub type DeleteIngestionBatchingPolicyCommand = DeletePolicyCommand<IngestionBatchingPolicy>;

impl From<AlterRetentionPolicyCommand> for Command {
    fn from(cmd: AlterRetentionPolicyCommand) -> Self {
        Self::AlterRetentionPolicy(cmd)
    }
}

impl From<DeleteRetentionPolicyCommand> for Command {
    fn from(cmd: DeleteRetentionPolicyCommand) -> Self {
        Self::DeleteRetentionPolicy(cmd)
    }
}

impl From<AlterIngestionBatchingPolicyCommand> for Command {
    fn from(cmd: AlterIngestionBatchingPolicyCommand) -> Self {
        Self::AlterIngestionBatchingPolicy(cmd)
    }
}

impl From<DeleteIngestionBatchingPolicyCommand> for Command {
    fn from(cmd: DeleteIngestionBatchingPolicyCommand) -> Self {
        Self::DeleteIngestionBatchingPolicy(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timespan_forms() {
        let day = Timespan::from_days(1).unwrap();
        assert_eq!("1.00:00:00".parse::<Timespan>().unwrap(), day);
        assert_eq!("1d".parse::<Timespan>().unwrap(), day);
        assert_eq!("24:00:00".parse::<Timespan>().unwrap(), day);
        assert_eq!("00:05:00".parse::<Timespan>().unwrap(), "5m".parse().unwrap());
        assert_eq!(
            "00:00:01.5".parse::<Timespan>().unwrap(),
            Timespan::from_millis(1_500)
        );
        assert!("soon".parse::<Timespan>().is_err());
        assert!("00:61:00".parse::<Timespan>().is_err());
    }

    #[test]
    fn test_oversized_timespans_are_rejected() {
        for text in [
            "999999999999999.00:00:00",
            "9999999999999999999:00:00",
            "99999999999999999999d",
        ] {
            assert!(
                matches!(text.parse::<Timespan>(), Err(CommandError::InvalidTimespan(_))),
                "{text}"
            );
        }
        assert_eq!(Timespan::from_days(u64::MAX), None);
    }

    #[test]
    fn test_timespan_display() {
        assert_eq!(Timespan::from_days(365).unwrap().to_string(), "365.00:00:00");
        assert_eq!("5m".parse::<Timespan>().unwrap().to_string(), "00:05:00");
        assert_eq!(Timespan::from_millis(1_500).to_string(), "00:00:01.500");
    }

    #[test]
    fn test_unknown_payload_properties_are_rejected() {
        assert!(serde_json::from_str::<RetentionPolicy>(
            r#"{"SoftDeletePeriod":"1d","Recoverability":"Enabled","Bogus":42}"#
        )
        .is_err());
        assert!(serde_json::from_str::<IngestionBatchingPolicy>(
            r#"{"MaximumNumberOfItems":5,"MaximumRawDataSizeMb":1}"#
        )
        .is_err());
    }

    #[test]
    fn test_payload_equality_ignores_formatting() {
        let a: RetentionPolicy =
            serde_json::from_str(r#"{"SoftDeletePeriod":"10d","Recoverability":"Enabled"}"#)
                .unwrap();
        let b: RetentionPolicy = serde_json::from_str(
            r#"{ "Recoverability": "Enabled",
                 "SoftDeletePeriod": "10.00:00:00" }"#,
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_payload_json_omits_unset_fields() {
        let policy = IngestionBatchingPolicy {
            maximum_batching_time_span: Some("00:05:00".parse().unwrap()),
            maximum_number_of_items: None,
            maximum_raw_data_size_mb: Some(1024),
        };
        assert_eq!(
            policy.to_json().to_string(),
            r#"{"MaximumBatchingTimeSpan":"00:05:00","MaximumRawDataSizeMB":1024}"#
        );
    }

    #[test]
    fn test_target_rejects_cluster_and_column() {
        for entity_type in [EntityType::Cluster, EntityType::Column, EntityType::Function] {
            assert!(matches!(
                EntityPolicyTarget::new(entity_type, "x"),
                Err(CommandError::UnsupportedEntityType { .. })
            ));
        }
        assert!(EntityPolicyTarget::new(EntityType::Table, "T").is_ok());
    }

    #[test]
    fn test_database_target_renders_its_own_name() {
        let cmd = DeleteRetentionPolicyCommand::new(EntityPolicyTarget::database("dev"));
        assert_eq!(
            cmd.to_script(&ScriptingContext::new()),
            ".delete database dev policy retention"
        );
        assert_eq!(
            cmd.to_script(&ScriptingContext::for_database("prod")),
            ".delete database dev policy retention"
        );
        assert_eq!(
            cmd.to_script(&ScriptingContext::for_database("dev")),
            ".delete database dev policy retention"
        );

        let table = DeleteRetentionPolicyCommand::new(EntityPolicyTarget::table("T"));
        assert_eq!(
            table.to_script(&ScriptingContext::for_database("prod")),
            ".delete table T policy retention"
        );
    }

    #[test]
    fn test_alter_script() {
        let cmd = AlterRetentionPolicyCommand::new(
            EntityPolicyTarget::table("T"),
            RetentionPolicy {
                soft_delete_period: Timespan::from_days(10),
                recoverability: Some(Recoverability::Disabled),
            },
        );
        assert_eq!(
            cmd.to_script(&ScriptingContext::new()),
            ".alter table T policy retention ```{\"Recoverability\":\"Disabled\",\"SoftDeletePeriod\":\"10.00:00:00\"}```"
        );
    }
}
