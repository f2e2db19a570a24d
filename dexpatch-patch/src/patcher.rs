//! Ordering and applying a set of patches.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use dexpatch_file::Pool;
use dexpatch_isa::MethodRef;

use crate::context::PatchContext;
use crate::error::{PatchError, PatcherError};
use crate::patch::{Patch, Target};

/// Why a patch was not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Excluded,
    Incompatible(Target),
    Dependency(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Excluded => f.write_str("excluded"),
            SkipReason::Incompatible(t) => write!(f, "not compatible with {t}"),
            SkipReason::Dependency(d) => write!(f, "dependency `{d}` was not applied"),
        }
    }
}

#[derive(Debug)]
pub enum PatchOutcome {
    /// Committed. Lists the methods whose bodies changed.
    Applied { methods: Vec<MethodRef> },
    Skipped(SkipReason),
    Failed(PatchError),
}

impl PatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, PatchOutcome::Applied { .. })
    }
}

#[derive(Debug)]
pub struct PatchReport {
    pub name: String,
    pub outcome: PatchOutcome,
}

/// Runs patches against a pool in dependency order.
#[derive(Default)]
pub struct Patcher {
    patches: Vec<Box<dyn Patch>>,
    target: Option<Target>,
    excluded: HashSet<String>,
}

impl Patcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only run patches compatible with `target`. Without a target every
    /// patch is run.
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    /// Never run the patch named `name`. Patches depending on it are
    /// skipped too.
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.excluded.insert(name.into());
        self
    }

    pub fn add(&mut self, patch: impl Patch + 'static) -> Result<&mut Self, PatcherError> {
        self.add_boxed(Box::new(patch))
    }

    pub fn add_boxed(&mut self, patch: Box<dyn Patch>) -> Result<&mut Self, PatcherError> {
        if self.patches.iter().any(|p| p.name() == patch.name()) {
            return Err(PatcherError::DuplicatePatch(patch.name().to_string()));
        }
        self.patches.push(patch);
        Ok(self)
    }

    pub fn patches(&self) -> impl Iterator<Item = &dyn Patch> {
        self.patches.iter().map(|p| p.as_ref())
    }

    /// Patch indices with every dependency before its dependents. Patches
    /// that do not depend on each other keep the order they were added in.
    pub fn order(&self) -> Result<Vec<usize>, PatcherError> {
        let index: HashMap<&str, usize> = self
            .patches
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name(), i))
            .collect();

        let n = self.patches.len();
        let mut pending = vec![0usize; n];
        let mut dependents = vec![Vec::new(); n];
        for (i, p) in self.patches.iter().enumerate() {
            let deps: BTreeSet<usize> = p
                .dependencies()
                .iter()
                .map(|d| {
                    index
                        .get(d.as_str())
                        .copied()
                        .ok_or_else(|| PatcherError::UnknownDependency {
                            patch: p.name().to_string(),
                            dependency: d.clone(),
                        })
                })
                .collect::<Result<_, _>>()?;
            pending[i] = deps.len();
            for d in deps {
                dependents[d].push(i);
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &j in &dependents[i] {
                pending[j] -= 1;
                if pending[j] == 0 {
                    ready.insert(j);
                }
            }
        }

        if order.len() < n {
            let stuck = (0..n)
                .filter(|&i| pending[i] > 0)
                .map(|i| self.patches[i].name().to_string())
                .collect();
            return Err(PatcherError::DependencyCycle(stuck));
        }
        Ok(order)
    }

    /// Run every patch once, in dependency order, committing each successful
    /// patch before the next starts.
    pub fn apply(&self, pool: &mut Pool) -> Result<Vec<PatchReport>, PatcherError> {
        let order = self.order()?;
        let mut applied: HashSet<&str> = HashSet::new();
        let mut reports = Vec::with_capacity(order.len());

        for i in order {
            let patch = self.patches[i].as_ref();
            let outcome = if self.excluded.contains(patch.name()) {
                PatchOutcome::Skipped(SkipReason::Excluded)
            } else if let Some(target) = self
                .target
                .as_ref()
                .filter(|t| !patch.is_compatible(t))
            {
                PatchOutcome::Skipped(SkipReason::Incompatible(target.clone()))
            } else if let Some(dep) = patch
                .dependencies()
                .iter()
                .find(|d| !applied.contains(d.as_str()))
            {
                PatchOutcome::Skipped(SkipReason::Dependency(dep.clone()))
            } else {
                run(patch, pool)
            };

            match &outcome {
                PatchOutcome::Applied { methods } => {
                    log::info!("{}: applied to {} method(s)", patch.name(), methods.len());
                    applied.insert(patch.name());
                }
                PatchOutcome::Skipped(reason) => log::warn!("{}: skipped, {reason}", patch.name()),
                PatchOutcome::Failed(e) => log::error!("{}: failed: {e}", patch.name()),
            }
            reports.push(PatchReport {
                name: patch.name().to_string(),
                outcome,
            });
        }
        Ok(reports)
    }
}

fn run(patch: &dyn Patch, pool: &mut Pool) -> PatchOutcome {
    let staged = {
        let mut ctx = PatchContext::new(pool);
        if let Err(e) = patch.execute(&mut ctx) {
            return PatchOutcome::Failed(e);
        }
        ctx.into_staged()
    };

    // Staging only accepts methods that have a body, so committing cannot
    // fail halfway.
    let mut methods = Vec::with_capacity(staged.len());
    for (id, body) in staged {
        if let Some(m) = pool.method(id) {
            methods.push(m.signature().clone());
        }
        if let Err(e) = pool.replace_body(id, body) {
            return PatchOutcome::Failed(e.into());
        }
    }
    PatchOutcome::Applied { methods }
}
