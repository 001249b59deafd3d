//! Concert data helpers
//!
//! Layout of the remote tree:
//!
//! ```text
//! concerts/
//!   links/           push-keyed concert link URLs, append only
//!   concerts_count   integer counter, bumped by transaction
//!   revid            integer revision id, overwritten wholesale
//! ```

use crate::db::{Database, DbPath};
use crate::utils::error::{AppError, AppResult};
use futures::future::try_join_all;
use rand::Rng;
use serde_json::{Value, json};
use std::sync::Arc;

pub const CONCERTS_PATH: &str = "concerts";
pub const LINKS_KEY: &str = "links";
pub const COUNT_KEY: &str = "concerts_count";
pub const REVID_KEY: &str = "revid";

/// CRUD helpers sharing one database handle
#[derive(Clone)]
pub struct ConcertStore {
    db: Arc<dyn Database>,
}

impl ConcertStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    fn root(&self) -> AppResult<DbPath> {
        DbPath::root().child(CONCERTS_PATH)
    }

    fn path(&self, key: &str) -> AppResult<DbPath> {
        self.root()?.child(key)
    }

    /// Read whatever is stored at `path`
    pub async fn get_data(&self, path: &str) -> AppResult<Option<Value>> {
        let db_path = DbPath::parse(path)?;
        self.db.get(&db_path).await.inspect_err(|e| {
            tracing::error!(path = %db_path, error = %e, "Error getting data");
        })
    }

    pub async fn set_revid(&self, id: i64) -> AppResult<()> {
        if id == 0 {
            return Err(AppError::Validation(
                "revid must be a valid number".to_string(),
            ));
        }

        let path = self.path(REVID_KEY)?;
        self.db
            .set(&path, json!(id))
            .await
            .map_err(|e| e.context("Failed to set revid"))
    }

    pub async fn get_revid(&self) -> AppResult<Option<i64>> {
        let path = self.path(REVID_KEY)?;
        let value = self.db.get(&path).await.inspect_err(|e| {
            tracing::error!(error = %e, "Error getting revid");
        })?;
        value.map(|v| as_integer(&v, &path)).transpose()
    }

    /// Push every link concurrently and wait for all of them
    pub async fn set_concerts_links(&self, links: &[String]) -> AppResult<Vec<String>> {
        if links.is_empty() {
            return Err(AppError::Validation(
                "concerts/links must be non-empty array".to_string(),
            ));
        }

        let path = self.path(LINKS_KEY)?;
        let pushes = links.iter().map(|link| self.db.push(&path, json!(link)));
        try_join_all(pushes)
            .await
            .map_err(|e| e.context("Failed to set concertsLinks"))
    }

    pub async fn add_new_concert_link(&self, link: &str) -> AppResult<String> {
        if link.trim().is_empty() {
            return Err(AppError::Validation(
                "concertLink must be a valid string".to_string(),
            ));
        }

        let path = self.path(LINKS_KEY)?;
        self.db
            .push(&path, json!(link))
            .await
            .map_err(|e| e.context("Failed to add new concert link"))
    }

    /// All stored links in push order
    pub async fn get_links(&self) -> AppResult<Vec<String>> {
        let path = self.path(LINKS_KEY)?;
        let value = self.db.get(&path).await.inspect_err(|e| {
            tracing::error!(error = %e, "Error getting concert links");
        })?;
        links_from(value.as_ref(), &path)
    }

    /// Pick a random link from one consistent snapshot of `concerts`.
    ///
    /// Returns `None` when the count or the link list is missing or empty.
    pub async fn get_rand_concert(&self) -> AppResult<Option<String>> {
        let root = self.root()?;
        let snapshot = self.db.get(&root).await.inspect_err(|e| {
            tracing::error!(error = %e, "Error getting random concert");
        })?;

        let Some(snapshot) = snapshot else {
            return Ok(None);
        };

        let count = match snapshot.get(COUNT_KEY) {
            Some(value) => as_integer(value, &self.path(COUNT_KEY)?)?,
            None => 0,
        };
        let links = links_from(snapshot.get(LINKS_KEY), &self.path(LINKS_KEY)?)?;

        if count > 0 && count as usize != links.len() {
            tracing::warn!(count, links = links.len(), "concert count and link list disagree");
        }

        Ok(pick_link(&links, count, &mut rand::thread_rng()).map(str::to_string))
    }

    /// Atomically add one to the concert count, treating a missing value as 0
    pub async fn update_count(&self) -> AppResult<i64> {
        let path = self.path(COUNT_KEY)?;
        let committed = self
            .db
            .transaction(&path, &|current| {
                let current = match current {
                    Some(value) => as_integer(value, &path)?,
                    None => 0,
                };
                current
                    .checked_add(1)
                    .map(|next| json!(next))
                    .ok_or_else(|| AppError::Database(format!("counter at {} would overflow", path)))
            })
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, "Error updating concerts count");
            })?;
        as_integer(&committed, &path)
    }

    pub async fn get_count(&self) -> AppResult<Option<i64>> {
        let path = self.path(COUNT_KEY)?;
        let value = self.db.get(&path).await.inspect_err(|e| {
            tracing::error!(error = %e, "Error getting concerts count");
        })?;
        value.map(|v| as_integer(&v, &path)).transpose()
    }

    pub async fn set_count(&self, count: i64) -> AppResult<()> {
        let path = self.path(COUNT_KEY)?;
        self.db.set(&path, json!(count)).await.inspect_err(|e| {
            tracing::error!(error = %e, "Error setting concerts count");
        })
    }
}

/// Choose a link uniformly from the first `min(count, links.len())` entries
pub fn pick_link<'a, R: Rng>(links: &'a [String], count: i64, rng: &mut R) -> Option<&'a str> {
    let bound = usize::try_from(count).ok()?.min(links.len());
    if bound == 0 {
        return None;
    }
    links.get(rng.gen_range(0..bound)).map(String::as_str)
}

fn as_integer(value: &Value, path: &DbPath) -> AppResult<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| is_integral_i64(*f)).map(|f| f as i64))
        .ok_or_else(|| AppError::Database(format!("unexpected value at {}: {}", path, value)))
}

/// Whole floats inside the i64 range; `i64::MAX as f64` rounds up to 2^63, hence `<`
fn is_integral_i64(f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

/// Links come back either as a push-keyed object or, for data written as an
/// array, as a JSON array. Object keys sort in push order.
fn links_from(value: Option<&Value>, path: &DbPath) -> AppResult<Vec<String>> {
    let as_link = |v: &Value| {
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| AppError::Database(format!("unexpected value at {}: {}", path, v)))
    };

    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(map)) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            entries.into_iter().map(|(_, v)| as_link(v)).collect()
        }
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(as_link)
            .collect(),
        Some(other) => Err(AppError::Database(format!(
            "unexpected value at {}: {}",
            path, other
        ))),
    }
}
