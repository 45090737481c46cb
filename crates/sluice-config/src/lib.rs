//! Sluice Config
//!
//! This crate contains the serializable flow configuration types for sluice.
//! These types represent flow definitions before they are validated and
//! turned into an executable [`Flow`] by `sluice-flow`.
//!
//! Configuration can be loaded from:
//! - JSON files (via the CLI)
//! - Any external store that keeps flows as JSON blobs
//!
//! [`Flow`]: https://docs.rs/sluice-flow

mod edge;
mod enums;
mod flow;
mod node;
mod process;

pub use edge::EdgeDef;
pub use enums::{AggregateOperation, FileOperation, TriggerType};
pub use flow::FlowDef;
pub use node::{NodeDef, NodeKind};
pub use process::{AutomationConfig, IntegrationConfig, ProcessConfig, TaskConfig};
