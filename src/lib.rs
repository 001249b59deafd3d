//! concertdb - CRUD helpers over a realtime database
//!
//! The database holds a push-ordered list of concert links, a concert
//! count and a revision id under `concerts/`. All consistency guarantees
//! come from the database service; this crate validates arguments and
//! passes each operation through to a shared [`db::Database`] handle.

pub mod cli;
pub mod commands;
pub mod concerts;
pub mod config;
pub mod db;
pub mod utils;

pub use concerts::{ConcertStore, pick_link};
pub use db::{Database, DbPath, MemoryDatabase, RestDatabase};
pub use utils::error::{AppError, AppResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
