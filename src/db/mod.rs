//! Database handle abstraction
//!
//! The managed realtime database exposes four primitives: read a path,
//! overwrite a path, push a child under a generated key and run an atomic
//! read-modify-write transaction. [`Database`] captures exactly those, so
//! the concert helpers can run against the REST service or an in-process
//! tree.

pub mod memory;
pub mod push_id;
pub mod rest;

use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub use memory::MemoryDatabase;
pub use rest::RestDatabase;

/// Attempts a transaction makes before giving up on a contended path
pub const TRANSACTION_MAX_RETRIES: usize = 25;

/// Closure applied by [`Database::transaction`]; receives `None` for an absent
/// value. An error aborts the transaction without writing.
pub type TransactionUpdate<'a> = &'a (dyn Fn(Option<&Value>) -> AppResult<Value> + Send + Sync);

#[async_trait]
pub trait Database: Send + Sync {
    /// Read the value at `path`, `None` when nothing is stored there
    async fn get(&self, path: &DbPath) -> AppResult<Option<Value>>;

    /// Overwrite the value at `path`; `null` removes it
    async fn set(&self, path: &DbPath, value: Value) -> AppResult<()>;

    /// Append `value` under a new chronologically ordered key and return the key
    async fn push(&self, path: &DbPath, value: Value) -> AppResult<String>;

    /// Atomically replace the value at `path` with `update(current)` and
    /// return the committed value
    async fn transaction(&self, path: &DbPath, update: TransactionUpdate<'_>) -> AppResult<Value>;
}

/// A validated slash-separated location in the database tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DbPath {
    segments: Vec<String>,
}

impl DbPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(path: &str) -> AppResult<Self> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let segments = trimmed
            .split('/')
            .map(|segment| validate_segment(path, segment).map(|_| segment.to_string()))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self { segments })
    }

    pub fn child(&self, segment: &str) -> AppResult<Self> {
        validate_segment(segment, segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

fn validate_segment(path: &str, segment: &str) -> AppResult<()> {
    if segment.is_empty() {
        return Err(AppError::Validation(format!(
            "Invalid database path '{}': empty segment",
            path
        )));
    }

    if let Some(bad) = segment
        .chars()
        .find(|c| matches!(c, '.' | '$' | '#' | '[' | ']' | '/') || c.is_ascii_control())
    {
        return Err(AppError::Validation(format!(
            "Invalid database path '{}': segment '{}' contains {:?}",
            path, segment, bad
        )));
    }

    Ok(())
}

impl FromStr for DbPath {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DbPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        f.write_str(&self.segments.join("/"))
    }
}
