//! Read-only access to a New API database.

pub mod sql;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ExportConfig;
use crate::error::Result;
use crate::models::{Ability, Channel, Token, User};
use crate::retry::RetryConfig;

pub use sql::{normalize_mysql_dsn, Dialect, SqlRepository};

/// Entity tables the exporter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// `channels`
    Channel,
    /// `tokens`
    Token,
    /// `users`
    User,
    /// `abilities`
    Ability,
}

impl EntityKind {
    /// All kinds, in export order.
    pub const ALL: [Self; 4] = [Self::Channel, Self::Token, Self::User, Self::Ability];

    /// Table name.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Channel => "channels",
            Self::Token => "tokens",
            Self::User => "users",
            Self::Ability => "abilities",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Entity counts of a source database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStats {
    /// Channel count.
    pub channels: u64,
    /// Token count.
    pub tokens: u64,
    /// User count.
    pub users: u64,
    /// Ability count.
    pub abilities: u64,
}

/// Read-only repository over the four New API entity tables.
///
/// Soft-deleted users and tokens are never returned or counted.
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Get the source type name.
    fn source_type(&self) -> &'static str;

    /// Connect to the source.
    async fn connect(&mut self) -> Result<()>;

    /// Check that the connection is alive.
    async fn ping(&self) -> Result<()>;

    /// All channels.
    async fn fetch_channels(&self) -> Result<Vec<Channel>>;

    /// One channel by ID.
    async fn fetch_channel(&self, id: i64) -> Result<Option<Channel>>;

    /// All users.
    async fn fetch_users(&self) -> Result<Vec<User>>;

    /// One user by ID.
    async fn fetch_user(&self, id: i64) -> Result<Option<User>>;

    /// Users that own at least one token.
    async fn fetch_users_with_tokens(&self) -> Result<Vec<User>>;

    /// All tokens.
    async fn fetch_tokens(&self) -> Result<Vec<Token>>;

    /// One token by ID.
    async fn fetch_token(&self, id: i64) -> Result<Option<Token>>;

    /// Tokens owned by a user.
    async fn fetch_tokens_by_user(&self, user_id: i64) -> Result<Vec<Token>>;

    /// All abilities.
    async fn fetch_abilities(&self) -> Result<Vec<Ability>>;

    /// Abilities served by a channel.
    async fn fetch_abilities_by_channel(&self, channel_id: i64) -> Result<Vec<Ability>>;

    /// Abilities of a group.
    async fn fetch_abilities_by_group(&self, group: &str) -> Result<Vec<Ability>>;

    /// Number of rows of an entity kind.
    async fn count(&self, kind: EntityKind) -> Result<u64>;

    /// Number of enabled rows of an entity kind.
    async fn count_active(&self, kind: EntityKind) -> Result<u64>;

    /// Counts of all four entity kinds.
    async fn stats(&self) -> Result<DatabaseStats> {
        Ok(DatabaseStats {
            channels: self.count(EntityKind::Channel).await?,
            tokens: self.count(EntityKind::Token).await?,
            users: self.count(EntityKind::User).await?,
            abilities: self.count(EntityKind::Ability).await?,
        })
    }

    /// Close the connection and release resources.
    async fn close(&mut self) -> Result<()>;
}

/// Create a source repository from configuration.
///
/// # Errors
///
/// Returns an error if the source configuration cannot be turned into a
/// connection URL.
pub fn create_repository(config: &ExportConfig) -> Result<Box<dyn SourceRepository>> {
    let retry = RetryConfig::with_retries(config.options.connect_retries);
    Ok(Box::new(SqlRepository::new(&config.source, retry)?))
}
