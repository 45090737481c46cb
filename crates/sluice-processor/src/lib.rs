//! Sluice Processor
//!
//! Node processors: the per-kind behavior behind the uniform
//! [`NodeProcessor`] contract the engine dispatches through.
//!
//! - **Agent**: renders a prompt and calls the completion service
//! - **Process**: task, automation, integration, trigger and rule sub-kinds
//! - **Condition**: evaluates a guard and emits one of two payloads
//! - **Trigger**: emits the run input overlaid with its payload
//! - **Integration**: API, database and file access
//!
//! Processors only shape input and output. Transport lives behind the
//! collaborator traits in `sluice-host`, and dependency handling lives in
//! the engine.

mod agent;
mod automation;
mod condition;
mod error;
mod input;
mod integration;
mod process;
mod processor;
mod task;
mod trigger;
mod types;

pub use agent::DEFAULT_MODEL;
pub use error::ProcessorError;
pub use input::NodeInput;
pub use processor::{NodeProcessor, StandardProcessor};
pub use types::{LogEntry, LogLevel, NodeExecutionResult, NodeLog};
