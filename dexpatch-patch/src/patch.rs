//! Patch definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::PatchContext;
use crate::error::PatchError;

/// An application package, optionally restricted to specific versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Compatibility {
    pub package: String,
    /// Empty means every version.
    #[serde(default)]
    pub versions: Vec<String>,
}

impl Compatibility {
    pub fn new<I, S>(package: impl Into<String>, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            package: package.into(),
            versions: versions.into_iter().map(Into::into).collect(),
        }
    }

    /// A target with an unknown version is accepted by any entry for its
    /// package.
    pub fn accepts(&self, target: &Target) -> bool {
        self.package == target.package
            && (self.versions.is_empty()
                || target
                    .version
                    .as_ref()
                    .is_none_or(|v| self.versions.contains(v)))
    }
}

/// The application being patched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub package: String,
    pub version: Option<String>,
}

impl Target {
    pub fn new(package: impl Into<String>, version: Option<String>) -> Self {
        Self {
            package: package.into(),
            version,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{} {v}", self.package),
            None => f.write_str(&self.package),
        }
    }
}

/// A named unit of bytecode modification.
pub trait Patch {
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Packages this patch applies to. Empty means any package.
    fn compatibility(&self) -> &[Compatibility] {
        &[]
    }

    /// Names of patches that must apply first.
    fn dependencies(&self) -> &[String] {
        &[]
    }

    /// Locate methods and stage edits in `ctx`. Staged edits are committed
    /// only if this returns `Ok`.
    fn execute(&self, ctx: &mut PatchContext<'_>) -> Result<(), PatchError>;

    /// Whether this patch should run against `target`.
    fn is_compatible(&self, target: &Target) -> bool {
        let compat = self.compatibility();
        compat.is_empty() || compat.iter().any(|c| c.accepts(target))
    }
}

type ExecuteFn = dyn Fn(&mut PatchContext<'_>) -> Result<(), PatchError> + Send + Sync;

/// A patch whose body is a closure.
///
/// ```ignore
/// let patch = BytecodePatch::builder("Trim hints")
///     .compatible_with("com.example.app", ["1.2.0"])
///     .execute(|ctx| {
///         let m = ctx.resolve(&HINT, &Scope::Package)?;
///         ctx.edit(m.id, |body| remove(body, 0))
///     });
/// ```
pub struct BytecodePatch {
    name: String,
    description: Option<String>,
    compatibility: Vec<Compatibility>,
    dependencies: Vec<String>,
    execute: Box<ExecuteFn>,
}

impl BytecodePatch {
    pub fn builder(name: impl Into<String>) -> BytecodePatchBuilder {
        BytecodePatchBuilder {
            name: name.into(),
            description: None,
            compatibility: Vec::new(),
            dependencies: Vec::new(),
        }
    }
}

impl Patch for BytecodePatch {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn compatibility(&self) -> &[Compatibility] {
        &self.compatibility
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    fn execute(&self, ctx: &mut PatchContext<'_>) -> Result<(), PatchError> {
        (self.execute)(ctx)
    }
}

impl fmt::Debug for BytecodePatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BytecodePatch")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("compatibility", &self.compatibility)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

pub struct BytecodePatchBuilder {
    name: String,
    description: Option<String>,
    compatibility: Vec<Compatibility>,
    dependencies: Vec<String>,
}

impl BytecodePatchBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn compatible_with<I, S>(mut self, package: impl Into<String>, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compatibility.push(Compatibility::new(package, versions));
        self
    }

    pub fn depends_on(mut self, patch: impl Into<String>) -> Self {
        self.dependencies.push(patch.into());
        self
    }

    /// Finish the patch with its body.
    pub fn execute<F>(self, f: F) -> BytecodePatch
    where
        F: Fn(&mut PatchContext<'_>) -> Result<(), PatchError> + Send + Sync + 'static,
    {
        BytecodePatch {
            name: self.name,
            description: self.description,
            compatibility: self.compatibility,
            dependencies: self.dependencies,
            execute: Box::new(f),
        }
    }
}
