/// Arena tree structure and its structural operations
pub mod tree;
/// Tree node, node handle and branch length types
pub mod node;

pub use node::{BranchLength, Node, NodeId, NodeKind};
pub use tree::{Side, Tree};
