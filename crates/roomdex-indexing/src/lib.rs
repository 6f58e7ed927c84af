//! Dataroom indexing subsystem
//!
//! The coordination and processing layer for RAG indexing: a trigger that
//! enqueues requests and starts at most one worker per dataroom, a
//! lock-holding worker that drains the queue, and a per-request pipeline
//! that extracts, embeds, and vectorizes documents while tracking status in
//! the relational store.

pub mod error;
pub mod factory;
pub mod flags;
pub mod pipeline;
pub mod services;
pub mod task;
pub mod trigger;
pub mod worker;

pub use error::{IndexingError, IndexingResult};
pub use factory::ServiceFactory;
pub use flags::{FeatureFlagService, StaticFlagService, TeamFlags};
pub use pipeline::{RequestPipeline, RequestSummary};
pub use services::IndexingServices;
pub use task::{RetryPolicy, TaskRunner, TokioTaskRunner};
pub use trigger::{TriggerOutcome, trigger_dataroom_indexing};
pub use worker::{IndexingWorker, WorkerReport};
