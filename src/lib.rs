//! # refdb
//!
//! A data-access helper for hierarchical JSON databases. It gives you CRUD
//! operations over a tree of JSON nodes, and keeps native timestamps intact on
//! the way in and out:
//!
//! - **Serialize** — timestamps become date markers,
//!   `{ "value": <epoch ms>, "type": "date" }`, and top-level `null`
//!   properties are dropped
//! - **Parse** — date markers become timestamps again
//!
//! ## Quick Start
//!
//! ```ignore
//! use refdb::{RefDb, Timestamp, Value};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = RefDb::in_memory();
//!
//!     let id = db
//!         .insert(
//!             "users",
//!             &Value::object([
//!                 ("name", Value::from("Alice")),
//!                 ("joined", Value::from(Timestamp::now())),
//!             ]),
//!         )
//!         .await?;
//!
//!     let user = db.get("users", &id).await?;
//!     println!("joined at {}", user["joined"]);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! 1. **Transforms** (`convert`, `serializer`, `parser`) - pure, synchronous
//!    deep object transforms over [`Value`] trees
//! 2. **Façade** (`core`) - argument checks, path resolution, and the
//!    serialize → store → parse sequence
//! 3. **Store** (`store`) - the [`RemoteStore`] trait and the in-process
//!    [`MemoryStore`], with snapshot persistence in `persistence`
//!
//! ## Known limitation
//!
//! Arrays are leaves for both transforms. A timestamp inside an object inside
//! an array is not converted to a marker, and a marker inside an array is not
//! parsed back.

mod core;
mod error;

pub mod config;
pub mod convert;
pub mod guard;
pub mod parser;
pub mod path;
pub mod persistence;
pub mod push_id;
pub mod serializer;
pub mod store;
pub mod value;

// Public API exports
pub use crate::core::{ID_FIELD, RefDb};
pub use config::RefDbConfig;
pub use convert::{convert_by_predicate, convert_by_type};
pub use error::{RefDbError, RefDbResult};
pub use parser::parse;
pub use path::RefPath;
pub use serializer::serialize;
pub use store::{MemoryStore, RemoteStore};
pub use value::{Kind, Map, NodeType, Timestamp, Value};

// Re-export commonly used external types for convenience
pub use chrono::{DateTime, Utc};
pub use serde_json::{Value as JsonValue, json};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use refdb::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::RefDbConfig;
    pub use crate::core::RefDb;
    pub use crate::error::{RefDbError, RefDbResult};
    pub use crate::parser::parse;
    pub use crate::serializer::serialize;
    pub use crate::store::{MemoryStore, RemoteStore};
    pub use crate::value::{Timestamp, Value};
    pub use serde_json::{Value as JsonValue, json};
}
