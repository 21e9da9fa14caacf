//! Question answering over a user's uploaded document.
//!
//! Public entry point: [`AskService::ask`]. It enforces the [`QuotaPolicy`],
//! records the question, makes sure the document's namespace is embedded,
//! rewrites the question against the recent history, retrieves context
//! from that namespace, asks the model and records the answer.

mod api_types;
mod ask;
mod cfg;
mod error;
mod pipeline;

pub mod prompt;
pub mod quota;

pub use api_types::{AskOutcome, AskResult, GENERIC_FAILURE_MESSAGE, QaAnswer};
pub use ask::AskService;
pub use cfg::ContextorConfig;
pub use error::ContextorError;
pub use pipeline::AnswerPipeline;
pub use quota::{Decision, QuotaPolicy};
