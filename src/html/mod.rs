//! HTML input handling
//!
//! Parses markup with `html5ever` into an owned [`ParseTree`] and runs the
//! anchor pre-passes that must happen before conversion.

pub mod prepass;
pub mod tree;

pub use prepass::{rewrite_jump_links, truncate_bookmark_name, truncate_long_anchor_ids};
pub use tree::{NodeId, NodeKind, ParseNode, ParseTree};
