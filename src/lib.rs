//! In-process key-value store with per-key expiration and snapshot persistence.
//!
//! ```rust,no_run
//! use inmemstore::{Store, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> inmemstore::Result<()> {
//!     let store = Store::open(StoreConfig::default().with_snapshot_path("data.snapshot"));
//!     let _sweeper = store.spawn_sweeper();
//!
//!     store.set("greeting".to_string(), "hello".to_string());
//!     store.expire("greeting", 30);
//!     assert_eq!(store.get("greeting"), Some("hello".to_string()));
//!
//!     store.persist()?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

pub mod commands;
pub mod config;
pub mod persistence;
pub mod reply;
pub mod storage;
pub mod sweeper;

pub use commands::Command;
pub use config::StoreConfig;
pub use persistence::ValueEntry;
pub use reply::Reply;
pub use storage::Store;
pub use sweeper::{Sweeper, SweeperHandle};

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Command error: {0}")]
    Command(String),
}

pub type Result<T> = std::result::Result<T, Error>;
