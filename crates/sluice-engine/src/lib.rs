//! Sluice Engine
//!
//! Executes flows: a graph of typed nodes joined by optionally guarded edges.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        FlowRunner                           │
//! │  - owns mpsc channel (sender + receiver)                    │
//! │  - run(variables) triggers execution                        │
//! │  - persists finished runs to a RunStore                     │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        FlowEngine                           │
//! │  - execute(flow, variables, cancel) → RunResult             │
//! │  - wave loop, cycle rejection, wave cap, node timeouts      │
//! │  - ReadinessResolver decides which nodes may run            │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      NodeProcessor                          │
//! │  - executes one node against a snapshot of the context      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use sluice_engine::{EngineConfig, FlowEngine};
//! use sluice_processor::StandardProcessor;
//! use tokio_util::sync::CancellationToken;
//!
//! let engine = FlowEngine::new(
//!     Arc::new(StandardProcessor::new(collaborators)),
//!     EngineConfig::default(),
//! );
//! let result = engine.execute(&flow, variables, CancellationToken::new()).await;
//! ```

mod context;
mod engine;
mod error;
mod events;
mod readiness;
mod result;
mod runner;

pub use context::ExecutionContext;
pub use engine::{DEFAULT_MAX_ITERATIONS, EngineConfig, FlowEngine};
pub use error::{ContextError, EngineError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use readiness::ReadinessResolver;
pub use result::{RunOutcome, RunResult};
pub use runner::FlowRunner;
