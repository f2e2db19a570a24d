//! Instruction editing: find an anchor, read registers from it, and splice
//! a template into the body around it.
//!
//! Edits never modify a body in place. Each operation returns a new
//! [`Body`](dexpatch_file::Body); indices computed against the old body
//! must be looked up again afterwards.

pub mod anchor;
pub mod error;
pub mod method;
pub mod ops;
pub mod predicates;
pub mod template;

pub use anchor::{Direction, find_anchor, register_at};
pub use error::{EditError, Result};
pub use method::MethodEdit;
pub use ops::{Placement, insert, remove, replace};
pub use template::{Bindings, Template};
