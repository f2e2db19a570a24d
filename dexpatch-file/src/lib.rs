//! Method pool model: classes, methods, access flags and copy-on-write
//! bodies, plus the YAML documents the command-line tool reads and writes.

pub mod access;
pub mod class;
pub mod document;
pub mod error;
pub mod method;
pub mod pool;

pub use access::AccessFlags;
pub use class::ClassDef;
pub use error::{Error, Result};
pub use method::{Body, Method};
pub use pool::{MethodId, Pool, Scope};
