pub mod count;
pub mod data;
pub mod init;
pub mod links;
pub mod revid;

use crate::concerts::ConcertStore;
use crate::config::Config;
use crate::db::{MemoryDatabase, RestDatabase};
use crate::utils::error::AppResult;
use std::sync::Arc;

/// Build the store over the configured remote database, or an empty
/// in-process one when `memory` is set
pub fn open_store(config: &Config, memory: bool) -> AppResult<ConcertStore> {
    if memory {
        tracing::info!("using in-process database");
        return Ok(ConcertStore::new(Arc::new(MemoryDatabase::new())));
    }

    tracing::debug!(url = %config.database.url, "connecting to realtime database");
    let db = RestDatabase::new(&config.database)?;
    Ok(ConcertStore::new(Arc::new(db)))
}
