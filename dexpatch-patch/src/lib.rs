//! Patch definitions and the patcher that applies them.
//!
//! A [`Patch`] locates methods with fingerprints and stages edits through a
//! [`PatchContext`]. The [`Patcher`] runs patches in dependency order and
//! commits each one only if it succeeded as a whole.

pub mod context;
pub mod declarative;
pub mod error;
pub mod patch;
pub mod patcher;

pub use context::PatchContext;
pub use declarative::DeclarativePatch;
pub use error::{DeclarativeError, ErrorKind, PatchError, PatcherError};
pub use patch::{BytecodePatch, BytecodePatchBuilder, Compatibility, Patch, Target};
pub use patcher::{PatchOutcome, PatchReport, Patcher, SkipReason};
