//! School persistence: a durable SQLite store, a volatile in-memory store,
//! and a `Backend` that routes between them at request time.
//!
//! Which stores exist is decided once at startup; there is no module-level
//! mutable state. `FallbackPolicy` settles what happens when the durable
//! store errors mid-request.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::fmt;

use crate::school::{NewSchool, School};

/// Which store served a request. Echoed in API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Sqlite,
    Memory,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Storage errors.
#[derive(Debug)]
pub enum StorageError {
    /// The underlying database failed or rejected the operation.
    Database(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(msg) => write!(f, "database error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}

/// The persistence seam: assign an id on insert, list everything back.
#[async_trait]
pub trait SchoolStore: Send + Sync {
    async fn insert(&self, school: &NewSchool) -> Result<School, StorageError>;
    async fn list_all(&self) -> Result<Vec<School>, StorageError>;
    fn kind(&self) -> StorageKind;
}

/// What to do when the durable store fails mid-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Retry the operation against the in-memory store.
    #[default]
    Fallback,
    /// Surface the failure to the caller.
    Strict,
}

/// A backend result, tagged with the store that served it and whether the
/// durable store was bypassed.
#[derive(Debug)]
pub struct Served<T> {
    pub value: T,
    pub storage: StorageKind,
    pub degraded: bool,
}

/// Routes operations to the durable store when one is configured, degrading
/// to memory according to the policy.
pub struct Backend {
    primary: Option<SqliteStore>,
    fallback: MemoryStore,
    policy: FallbackPolicy,
    /// A durable store was requested but never came up; every response is
    /// memory-served and marked degraded.
    degraded_from_start: bool,
}

impl Backend {
    pub fn durable(primary: SqliteStore, policy: FallbackPolicy) -> Self {
        Self {
            primary: Some(primary),
            fallback: MemoryStore::new(),
            policy,
            degraded_from_start: false,
        }
    }

    /// Volatile-only backend. Responses are labeled `memory` but never
    /// marked degraded: memory is what was asked for.
    pub fn volatile() -> Self {
        Self {
            primary: None,
            fallback: MemoryStore::new(),
            policy: FallbackPolicy::Fallback,
            degraded_from_start: false,
        }
    }

    /// Volatile backend standing in for a durable store that could not be
    /// opened at startup. Responses carry the degradation note.
    pub fn volatile_fallback() -> Self {
        Self {
            degraded_from_start: true,
            ..Self::volatile()
        }
    }

    pub async fn insert(&self, school: &NewSchool) -> Result<Served<School>, StorageError> {
        match &self.primary {
            Some(store) => match store.insert(school).await {
                Ok(value) => Ok(Served {
                    value,
                    storage: store.kind(),
                    degraded: false,
                }),
                Err(e) => match self.policy {
                    FallbackPolicy::Fallback => {
                        log_fallback("insert", &e);
                        let value = self.fallback.insert(school).await?;
                        Ok(Served {
                            value,
                            storage: StorageKind::Memory,
                            degraded: true,
                        })
                    }
                    FallbackPolicy::Strict => Err(e),
                },
            },
            None => {
                let value = self.fallback.insert(school).await?;
                Ok(Served {
                    value,
                    storage: StorageKind::Memory,
                    degraded: self.degraded_from_start,
                })
            }
        }
    }

    pub async fn list_all(&self) -> Result<Served<Vec<School>>, StorageError> {
        match &self.primary {
            Some(store) => match store.list_all().await {
                Ok(value) => Ok(Served {
                    value,
                    storage: store.kind(),
                    degraded: false,
                }),
                Err(e) => match self.policy {
                    FallbackPolicy::Fallback => {
                        log_fallback("list", &e);
                        let value = self.fallback.list_all().await?;
                        Ok(Served {
                            value,
                            storage: StorageKind::Memory,
                            degraded: true,
                        })
                    }
                    FallbackPolicy::Strict => Err(e),
                },
            },
            None => {
                let value = self.fallback.list_all().await?;
                Ok(Served {
                    value,
                    storage: StorageKind::Memory,
                    degraded: self.degraded_from_start,
                })
            }
        }
    }
}

fn log_fallback(op: &str, e: &StorageError) {
    eprintln!(
        "[{}] storage: durable {} failed ({}); using in-memory fallback",
        Utc::now().format("%H:%M:%S"),
        op,
        e,
    );
}
