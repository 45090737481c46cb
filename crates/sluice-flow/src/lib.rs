//! Sluice Flow
//!
//! This crate provides the validated flow representation for sluice.
//! A [`Flow`] is built from a [`FlowDef`](sluice_config::FlowDef) and is
//! ready to be handed to the engine.
//!
//! Key differences from `sluice-config`:
//! - Node ids are unique and every edge references existing nodes
//! - Nodes keep their declaration order, which the engine uses for every
//!   ordered view of a run (merged input, final output)
//! - Incoming/outgoing edges, entry nodes and sink nodes are precomputed in a [`Graph`]

mod error;
mod flow;
mod graph;

pub use error::FlowError;
pub use flow::{Edge, Flow, Node};
pub use graph::Graph;
