use super::push_id::PushIdGenerator;
use super::{Database, DbPath, TransactionUpdate};
use crate::utils::error::AppResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// In-process database tree with the same semantics as the hosted service:
/// `null` deletes, empty objects vanish, pushes get ordered keys.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    root: Mutex<Value>,
    ids: PushIdGenerator,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing tree, e.g. a JSON export of the real database
    pub fn with_data(data: Value) -> Self {
        Self {
            root: Mutex::new(normalize(data)),
            ids: PushIdGenerator::new(),
        }
    }

    pub async fn snapshot(&self) -> Value {
        self.root.lock().await.clone()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn get(&self, path: &DbPath) -> AppResult<Option<Value>> {
        let root = self.root.lock().await;
        Ok(lookup(&root, path.segments()).cloned())
    }

    async fn set(&self, path: &DbPath, value: Value) -> AppResult<()> {
        let mut root = self.root.lock().await;
        write(&mut root, path.segments(), normalize(value));
        Ok(())
    }

    async fn push(&self, path: &DbPath, value: Value) -> AppResult<String> {
        let key = self.ids.next_id();
        let child = path.child(&key)?;
        self.set(&child, value).await?;
        Ok(key)
    }

    async fn transaction(&self, path: &DbPath, update: TransactionUpdate<'_>) -> AppResult<Value> {
        // The lock is held across read and write, so no retries are needed here
        let mut root = self.root.lock().await;
        let next = normalize(update(lookup(&root, path.segments()))?);
        write(&mut root, path.segments(), next.clone());
        Ok(next)
    }
}

fn lookup<'a>(node: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let found = segments
        .iter()
        .try_fold(node, |current, segment| current.as_object()?.get(segment))?;
    (!found.is_null()).then_some(found)
}

fn write(node: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }

    if let Value::Object(map) = node {
        let child = map.entry(head.clone()).or_insert(Value::Null);
        write(child, rest, value);
        if child.is_null() {
            map.remove(head);
        }
    }

    if node.as_object().is_some_and(Map::is_empty) {
        *node = Value::Null;
    }
}

/// Drop `null` members and the empty objects they leave behind
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Object(cleaned)
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AppError;
    use serde_json::json;

    fn path(p: &str) -> DbPath {
        DbPath::parse(p).unwrap()
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let db = MemoryDatabase::new();
        db.set(&path("concerts/revid"), json!(42)).await.unwrap();

        assert_eq!(db.get(&path("concerts/revid")).await.unwrap(), Some(json!(42)));
        assert_eq!(
            db.get(&path("concerts")).await.unwrap(),
            Some(json!({"revid": 42}))
        );
        assert_eq!(db.get(&path("concerts/missing")).await.unwrap(), None);
        assert_eq!(db.get(&path("concerts/revid/deeper")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_null_prunes_empty_parents() {
        let db = MemoryDatabase::with_data(json!({"concerts": {"revid": 1}, "other": true}));
        db.set(&path("concerts/revid"), Value::Null).await.unwrap();

        assert_eq!(db.snapshot().await, json!({"other": true}));
    }

    #[tokio::test]
    async fn test_set_replaces_scalar_parent() {
        let db = MemoryDatabase::with_data(json!({"concerts": 5}));
        db.set(&path("concerts/concerts_count"), json!(1)).await.unwrap();

        assert_eq!(db.snapshot().await, json!({"concerts": {"concerts_count": 1}}));
    }

    #[tokio::test]
    async fn test_push_keys_keep_insertion_order() {
        let db = MemoryDatabase::new();
        let links = path("concerts/links");

        let mut keys = Vec::new();
        for link in ["a", "b", "c"] {
            keys.push(db.push(&links, json!(link)).await.unwrap());
        }

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        let stored = db.get(&links).await.unwrap().unwrap();
        assert_eq!(stored.as_object().unwrap().len(), 3);
        assert_eq!(stored[&keys[1]], json!("b"));
    }

    #[tokio::test]
    async fn test_transaction_sees_absent_value() {
        let db = MemoryDatabase::new();
        let count = path("concerts/concerts_count");

        let committed = db
            .transaction(&count, &|current| {
                assert!(current.is_none());
                Ok(json!(1))
            })
            .await
            .unwrap();

        assert_eq!(committed, json!(1));
        assert_eq!(db.get(&count).await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_failed_update_writes_nothing() {
        let db = MemoryDatabase::with_data(json!({"concerts": {"concerts_count": 3}}));
        let count = path("concerts/concerts_count");

        let result = db
            .transaction(&count, &|_| Err(AppError::Database("refused".to_string())))
            .await;

        assert_eq!(result, Err(AppError::Database("refused".to_string())));
        assert_eq!(db.get(&count).await.unwrap(), Some(json!(3)));
    }

    #[test]
    fn test_normalize_strips_nulls() {
        let value = normalize(json!({"a": null, "b": {"c": null}, "d": [1, null]}));
        assert_eq!(value, json!({"d": [1, null]}));
    }
}
