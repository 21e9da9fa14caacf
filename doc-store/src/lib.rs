//! Document Store collaborator for the PDF chat backend.
//!
//! - [`models`]: `Document`, `ChatTurn`, `Role`, `UserPlan`.
//! - [`store::DocumentStore`]: the async seam the orchestrator talks to.
//! - [`memory::MemoryDocumentStore`] and [`sqlite::SqliteDocumentStore`]: backends.
//! - [`history::ChatHistory`]: the bounded, most-recent-first history adapter.
//!
//! Every operation takes the owning `user_id` explicitly; a document owned
//! by somebody else is reported exactly like a missing one.

pub mod config;
pub mod errors;
pub mod history;
pub mod memory;
pub mod models;
pub mod sqlite;
pub mod store;

pub use config::{DocStoreConfig, StoreBackend, open_store};
pub use errors::StoreError;
pub use history::{ChatHistory, DEFAULT_HISTORY_LIMIT};
pub use memory::MemoryDocumentStore;
pub use models::{ChatTurn, Document, Role, UserPlan};
pub use sqlite::SqliteDocumentStore;
pub use store::DocumentStore;
