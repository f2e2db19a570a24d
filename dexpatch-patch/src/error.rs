use dexpatch_edit::EditError;
use dexpatch_match::MatchError;
use thiserror::Error;

/// Why a patch failed. Any of these aborts the patch; nothing it staged is
/// kept.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Pool(#[from] dexpatch_file::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<PatchError>,
    },

    #[error("{0}")]
    Custom(String),
}

/// Coarse classification of a [`PatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Ambiguous,
    AnchorNotFound,
    OperandShape,
    Other,
}

impl PatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PatchError::Match(MatchError::NotFound { .. }) => ErrorKind::NotFound,
            PatchError::Match(MatchError::Ambiguous { .. }) => ErrorKind::Ambiguous,
            PatchError::Edit(EditError::AnchorNotFound(_)) => ErrorKind::AnchorNotFound,
            PatchError::Edit(EditError::OperandShape { .. }) => ErrorKind::OperandShape,
            PatchError::Context { source, .. } => source.kind(),
            _ => ErrorKind::Other,
        }
    }

    /// Wrap with a short description of what was being done.
    pub fn context(self, context: impl Into<String>) -> Self {
        PatchError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Problems with the set of patches given to a [`Patcher`](crate::Patcher).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatcherError {
    #[error("Patch `{patch}` depends on unknown patch `{dependency}`")]
    UnknownDependency { patch: String, dependency: String },

    #[error("Dependency cycle between patches: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    #[error("Duplicate patch `{0}`")]
    DuplicatePatch(String),
}

/// Problems loading a declarative patch document.
#[derive(Debug, Error)]
pub enum DeclarativeError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Patch `{patch}`: unknown opcode `{name}`")]
    UnknownOpcode { patch: String, name: String },

    #[error("Patch `{patch}`: unknown register role `{role}` (expected A to G)")]
    UnknownRole { patch: String, role: String },

    #[error("Patch `{patch}`: unknown fingerprint `{name}`")]
    UnknownFingerprint { patch: String, name: String },

    #[error("Patch `{patch}`: fingerprint `{name}` is scoped to its own class chain")]
    ClassOfCycle { patch: String, name: String },

    #[error("Patch `{patch}`, edit {step}: anchor has no constraints")]
    EmptyAnchor { patch: String, step: usize },

    #[error("Patch `{patch}`, edit {step}: remove takes no template or registers")]
    RemoveWithCode { patch: String, step: usize },

    #[error("Patch `{patch}`, edit {step}: {source}")]
    Template {
        patch: String,
        step: usize,
        source: EditError,
    },

    #[error("Patch `{patch}`, edit {step}: placeholder `${name}` has no register source")]
    UnboundPlaceholder {
        patch: String,
        step: usize,
        name: String,
    },
}
