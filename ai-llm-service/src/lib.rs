//! Shared language-model plumbing for the PDF chat backend.
//!
//! - [`chat`]: provider-agnostic chat messages and the [`chat::LanguageModel`] seam.
//! - [`service_profiles`]: `fast` / `slow` / `embedding` profiles with cached clients.
//! - [`health_service`]: best-effort provider probes for `/health`.
//! - [`telemetry`]: one shared `tracing` subscriber setup for the binary.

pub mod chat;
pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use chat::{ChatMessage, ChatRole, LanguageModel, Profile, ProfileModel};
pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::AiLlmError;
pub use service_profiles::LlmServiceProfiles;
