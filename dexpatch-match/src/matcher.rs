//! Resolving fingerprints against a pool.

use dexpatch_file::{ClassDef, Method, MethodId, Pool, Scope};

use crate::error::MatchError;
use crate::fingerprint::{Fingerprint, Scan};

/// A method a fingerprint resolved to, borrowed from the pool.
#[derive(Debug, Clone)]
pub struct Match<'p> {
    pub id: MethodId,
    pub class: &'p ClassDef,
    pub method: &'p Method,
    pub scan: Scan,
}

impl Match<'_> {
    /// Scope covering only the declaring class, for resolving a second
    /// fingerprint next to this one.
    pub fn class_scope(&self) -> Scope {
        Scope::Class(self.class.descriptor().to_string())
    }
}

/// Every method in `scope` that satisfies `fp`, in pool order.
pub fn resolve_all<'p>(fp: &Fingerprint, pool: &'p Pool, scope: &Scope) -> Vec<Match<'p>> {
    pool.candidates(scope)
        .filter_map(|(id, class, method)| {
            fp.scan(method, class).map(|scan| Match {
                id,
                class,
                method,
                scan,
            })
        })
        .collect()
}

/// The single method in `scope` that satisfies `fp`.
pub fn resolve<'p>(
    fp: &Fingerprint,
    pool: &'p Pool,
    scope: &Scope,
) -> Result<Match<'p>, MatchError> {
    let mut found = resolve_all(fp, pool, scope);
    match found.len() {
        0 => {
            log::debug!("{fp}: no match in {scope}");
            Err(MatchError::NotFound {
                fingerprint: fp.name().to_string(),
                scope: scope.clone(),
            })
        }
        1 => {
            let m = found.remove(0);
            log::debug!("{fp}: resolved to {}", m.method.signature());
            Ok(m)
        }
        count => {
            log::debug!("{fp}: {count} matches in {scope}");
            Err(MatchError::Ambiguous {
                fingerprint: fp.name().to_string(),
                scope: scope.clone(),
                count,
                candidates: found
                    .iter()
                    .map(|m| m.method.signature().clone())
                    .collect(),
            })
        }
    }
}

/// Resolve `anchor` across the pool, then `target` inside the anchor's
/// declaring class.
pub fn resolve_in_class_of<'p>(
    anchor: &Fingerprint,
    target: &Fingerprint,
    pool: &'p Pool,
) -> Result<Match<'p>, MatchError> {
    let anchor = resolve(anchor, pool, &Scope::Package)?;
    resolve(target, pool, &anchor.class_scope())
}
