//! Request-building and job-tracking core for the Cadenza music generation
//! studio.
//!
//! The rendering shell owns the widgets; this crate owns the rules behind
//! them:
//!
//! - [`modes`] — which fields each generation mode requires, which it may
//!   send, and the fallback to text-to-music when all audio is cleared
//! - [`builder`] — panel snapshot → canonical generation requests, including
//!   the Simple-slider derivation and bulk seed fan-out
//! - [`submit`] — validation, model preconditions, in-order dispatch
//! - [`jobs`] — tool-job state machine and poll-handle lifecycle for
//!   training, stem splitting, and model downloads
//! - [`api`] — HTTP client for the generation worker
//! - [`config`] / [`prefs`] — layered configuration and remembered settings

pub mod api;
pub mod builder;
pub mod config;
pub mod jobs;
pub mod modes;
pub mod prefs;
pub mod submit;
pub mod types;

pub use api::Client;
pub use builder::{build_batch, EntropySeeds, PanelState, SeedSource, ValidationError};
pub use config::AppConfig;
pub use jobs::{JobRegistry, PollHandle, ToolJob, ToolJobState};
pub use submit::{submit_batch, SubmitError};
pub use types::{GenerationMode, GenerationRequest, ToolJobKind, ToolJobStatus};
