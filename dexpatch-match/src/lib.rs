//! Method fingerprints and their resolution.
//!
//! A [`Fingerprint`] describes a method by structure: access flags,
//! signature types, a contiguous opcode run, referenced strings and an
//! optional custom predicate. [`resolve`] finds the one method in a
//! [`Scope`](dexpatch_file::Scope) that satisfies it.

pub mod error;
pub mod fingerprint;
pub mod matcher;

pub use error::MatchError;
pub use fingerprint::{
    CustomPredicate, Fingerprint, FingerprintBuilder, Scan, has_any_literal, has_literal,
};
pub use matcher::{Match, resolve, resolve_all, resolve_in_class_of};
