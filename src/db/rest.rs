use super::{Database, DbPath, TRANSACTION_MAX_RETRIES, TransactionUpdate};
use crate::config::DatabaseConfig;
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::header::{ETAG, HeaderMap, IF_MATCH};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

/// Request header asking the service to return the value's ETag
const ETAG_REQUEST_HEADER: &str = "X-Firebase-ETag";

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// Realtime database accessed through its REST API
pub struct RestDatabase {
    client: Client,
    base: Url,
    auth_token: Option<String>,
    auth_uid: Option<String>,
}

impl RestDatabase {
    pub fn new(config: &DatabaseConfig) -> AppResult<Self> {
        let base = Url::parse(config.url.trim())
            .map_err(|e| AppError::Config(format!("Invalid database URL '{}': {}", config.url, e)))?;

        if base.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "Database URL cannot be used as a base: {}",
                config.url
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("concertdb/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base,
            auth_token: config.auth_token.clone(),
            auth_uid: config.auth_uid.clone(),
        })
    }

    fn url_for(&self, path: &DbPath) -> AppResult<Url> {
        let mut url = self.base.clone();
        {
            let mut parts = url.path_segments_mut().map_err(|_| {
                AppError::Config(format!("Database URL cannot be used as a base: {}", self.base))
            })?;
            parts.pop_if_empty();
            match path.segments().split_last() {
                Some((last, parents)) => {
                    parts.extend(parents);
                    parts.push(&format!("{}.json", last));
                }
                None => {
                    parts.push(".json");
                }
            }
        }

        if self.auth_token.is_some() || self.auth_uid.is_some() {
            let mut query = url.query_pairs_mut();
            if let Some(token) = &self.auth_token {
                query.append_pair("auth", token);
            }
            if let Some(uid) = &self.auth_uid {
                query.append_pair("auth_variable_override", &json!({ "uid": uid }).to_string());
            }
        }

        Ok(url)
    }

    async fn read_with_etag(&self, url: &Url, path: &DbPath) -> AppResult<(Value, String)> {
        let response = self
            .client
            .get(url.clone())
            .header(ETAG_REQUEST_HEADER, "true")
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Failed to read '{}': {}", path, e)))?;

        let response = ensure_success(response, "read", path).await?;
        let etag = etag_from(response.headers(), path)?;
        let value = decode_json(response, path).await?;
        Ok((value, etag))
    }
}

async fn ensure_success(response: Response, action: &str, path: &DbPath) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    Err(AppError::Network(format!(
        "Failed to {} '{}': {} - {}",
        action, path, status, error_text
    )))
}

async fn decode_json<T: serde::de::DeserializeOwned>(response: Response, path: &DbPath) -> AppResult<T> {
    response
        .json()
        .await
        .map_err(|e| AppError::Network(format!("Failed to parse response for '{}': {}", path, e)))
}

fn etag_from(headers: &HeaderMap, path: &DbPath) -> AppResult<String> {
    headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| AppError::Database(format!("No ETag returned for '{}'", path)))
}

#[async_trait]
impl Database for RestDatabase {
    async fn get(&self, path: &DbPath) -> AppResult<Option<Value>> {
        let url = self.url_for(path)?;
        tracing::debug!(%path, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Failed to read '{}': {}", path, e)))?;

        let response = ensure_success(response, "read", path).await?;
        let value: Value = decode_json(response, path).await?;
        Ok((!value.is_null()).then_some(value))
    }

    async fn set(&self, path: &DbPath, value: Value) -> AppResult<()> {
        let url = self.url_for(path)?;
        tracing::debug!(%path, "PUT");

        let response = self
            .client
            .put(url)
            .json(&value)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Failed to write '{}': {}", path, e)))?;

        ensure_success(response, "write", path).await?;
        Ok(())
    }

    async fn push(&self, path: &DbPath, value: Value) -> AppResult<String> {
        let url = self.url_for(path)?;
        tracing::debug!(%path, "POST");

        let response = self
            .client
            .post(url)
            .json(&value)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Failed to push to '{}': {}", path, e)))?;

        let response = ensure_success(response, "push to", path).await?;
        let pushed: PushResponse = decode_json(response, path).await?;
        Ok(pushed.name)
    }

    async fn transaction(&self, path: &DbPath, update: TransactionUpdate<'_>) -> AppResult<Value> {
        let url = self.url_for(path)?;
        let (mut current, mut etag) = self.read_with_etag(&url, path).await?;

        for attempt in 1..=TRANSACTION_MAX_RETRIES {
            let next = update((!current.is_null()).then_some(&current))?;
            tracing::debug!(%path, attempt, "conditional PUT");

            let response = self
                .client
                .put(url.clone())
                .header(IF_MATCH, etag.as_str())
                .json(&next)
                .send()
                .await
                .map_err(|e| AppError::Network(format!("Failed to write '{}': {}", path, e)))?;

            if response.status() == StatusCode::PRECONDITION_FAILED {
                // The conflict reply carries the fresh value and its ETag
                etag = etag_from(response.headers(), path)?;
                current = decode_json(response, path).await?;
                continue;
            }

            ensure_success(response, "write", path).await?;
            return Ok(next);
        }

        Err(AppError::Database(format!(
            "Transaction on '{}' gave up after {} conflicting attempts",
            path, TRANSACTION_MAX_RETRIES
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn database(url: &str, token: Option<&str>, uid: Option<&str>) -> RestDatabase {
        RestDatabase::new(&DatabaseConfig {
            url: url.to_string(),
            auth_token: token.map(str::to_string),
            auth_uid: uid.map(str::to_string),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_url_without_auth() {
        let db = database("https://example-rtdb.firebaseio.com", None, None);
        let url = db.url_for(&DbPath::parse("concerts/links").unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://example-rtdb.firebaseio.com/concerts/links.json");
    }

    #[test]
    fn test_url_for_root_and_trailing_slash() {
        let db = database("https://example-rtdb.firebaseio.com/", None, None);
        let url = db.url_for(&DbPath::root()).unwrap();
        assert_eq!(url.as_str(), "https://example-rtdb.firebaseio.com/.json");
    }

    #[test]
    fn test_url_with_auth_and_override() {
        let db = database("http://localhost:9000", Some("secret"), Some("concert-bot"));
        let url = db.url_for(&DbPath::parse("concerts/revid").unwrap()).unwrap();

        assert_eq!(url.path(), "/concerts/revid.json");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("auth".to_string(), "secret".to_string()),
                (
                    "auth_variable_override".to_string(),
                    r#"{"uid":"concert-bot"}"#.to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let db = database("http://localhost:9000", None, None);
        let url = db.url_for(&DbPath::parse("concerts/big show").unwrap()).unwrap();
        assert_eq!(url.path(), "/concerts/big%20show.json");
    }

    #[test]
    fn test_rejects_invalid_url() {
        let result = RestDatabase::new(&DatabaseConfig {
            url: "not a url".to_string(),
            auth_token: None,
            auth_uid: None,
            timeout_secs: 5,
        });
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_etag_from_headers() {
        let path = DbPath::parse("concerts/concerts_count").unwrap();
        let mut headers = HeaderMap::new();
        assert!(matches!(etag_from(&headers, &path), Err(AppError::Database(_))));

        headers.insert(ETAG, HeaderValue::from_static("abc123="));
        assert_eq!(etag_from(&headers, &path).unwrap(), "abc123=");
    }

    mod against_server {
        use super::*;
        use std::sync::Mutex;
        use wiremock::matchers::{body_json, header, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const COUNT_PATH: &str = "/concerts/concerts_count.json";

        fn count_path() -> DbPath {
            DbPath::parse("concerts/concerts_count").unwrap()
        }

        #[tokio::test]
        async fn test_get_null_is_absent() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(COUNT_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
                .mount(&server)
                .await;

            let db = database(&server.uri(), None, None);
            assert_eq!(db.get(&count_path()).await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_error_status_becomes_network_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(COUNT_PATH))
                .respond_with(ResponseTemplate::new(401).set_body_string("Permission denied"))
                .mount(&server)
                .await;

            let db = database(&server.uri(), None, None);
            match db.get(&count_path()).await {
                Err(AppError::Network(msg)) => {
                    assert!(msg.contains("401"), "{}", msg);
                    assert!(msg.contains("Permission denied"), "{}", msg);
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_push_returns_generated_name() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/concerts/links.json"))
                .and(query_param("auth", "secret"))
                .and(body_json(json!("https://a")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "-Nabc" })))
                .expect(1)
                .mount(&server)
                .await;

            let db = database(&server.uri(), Some("secret"), None);
            let links = DbPath::parse("concerts/links").unwrap();
            assert_eq!(db.push(&links, json!("https://a")).await.unwrap(), "-Nabc");
        }

        #[tokio::test]
        async fn test_transaction_reapplies_update_on_conflict() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(COUNT_PATH))
                .and(header(ETAG_REQUEST_HEADER, "true"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!(5)).insert_header("ETag", "e1"))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("PUT"))
                .and(path(COUNT_PATH))
                .and(header("if-match", "e1"))
                .respond_with(ResponseTemplate::new(412).set_body_json(json!(7)).insert_header("ETag", "e2"))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("PUT"))
                .and(path(COUNT_PATH))
                .and(header("if-match", "e2"))
                .and(body_json(json!(8)))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!(8)))
                .expect(1)
                .mount(&server)
                .await;

            let db = database(&server.uri(), None, None);
            let seen = Mutex::new(Vec::new());
            let committed = db
                .transaction(&count_path(), &|current: Option<&Value>| {
                    seen.lock().unwrap().push(current.cloned());
                    Ok(json!(current.and_then(Value::as_i64).unwrap_or(0) + 1))
                })
                .await
                .unwrap();

            assert_eq!(committed, json!(8));
            assert_eq!(*seen.lock().unwrap(), vec![Some(json!(5)), Some(json!(7))]);
        }

        #[tokio::test]
        async fn test_transaction_gives_up_after_max_conflicts() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(COUNT_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!(1)).insert_header("ETag", "e1"))
                .mount(&server)
                .await;
            Mock::given(method("PUT"))
                .and(path(COUNT_PATH))
                .respond_with(ResponseTemplate::new(412).set_body_json(json!(1)).insert_header("ETag", "e1"))
                .expect(TRANSACTION_MAX_RETRIES as u64)
                .mount(&server)
                .await;

            let db = database(&server.uri(), None, None);
            let result = db.transaction(&count_path(), &|_| Ok(json!(2))).await;

            assert!(matches!(result, Err(AppError::Database(_))), "{:?}", result);
        }

        #[tokio::test]
        async fn test_failed_update_sends_no_write() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(COUNT_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!("many")).insert_header("ETag", "e1"))
                .mount(&server)
                .await;
            Mock::given(method("PUT"))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(&server)
                .await;

            let db = database(&server.uri(), None, None);
            let result = db
                .transaction(&count_path(), &|_| Err(AppError::Database("not a number".to_string())))
                .await;

            assert_eq!(result, Err(AppError::Database("not a number".to_string())));
        }
    }
}
