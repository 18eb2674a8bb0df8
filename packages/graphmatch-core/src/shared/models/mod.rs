//! Shared models

mod edge;
mod graph;
mod node;

pub use edge::Edge;
pub use graph::Graph;
pub use node::{Node, NodeTag};
