use dexpatch_file::Scope;
use dexpatch_isa::MethodRef;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("Fingerprint `{fingerprint}` matched no method in {scope}")]
    NotFound { fingerprint: String, scope: Scope },

    #[error("Fingerprint `{fingerprint}` matched {count} methods in {scope}")]
    Ambiguous {
        fingerprint: String,
        scope: Scope,
        count: usize,
        candidates: Vec<MethodRef>,
    },
}
