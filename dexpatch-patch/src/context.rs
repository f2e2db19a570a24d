use std::collections::BTreeMap;

use dexpatch_edit::EditError;
use dexpatch_file::{Body, Method, MethodId, Pool, Scope};
use dexpatch_match::{Fingerprint, Match, MatchError, matcher};

use crate::error::PatchError;

/// What a running patch sees: the pool as it was before the patch started,
/// plus the bodies the patch has edited so far.
pub struct PatchContext<'p> {
    pool: &'p Pool,
    staged: BTreeMap<MethodId, Body>,
}

impl<'p> PatchContext<'p> {
    pub fn new(pool: &'p Pool) -> Self {
        Self {
            pool,
            staged: BTreeMap::new(),
        }
    }

    pub fn pool(&self) -> &'p Pool {
        self.pool
    }

    pub fn resolve(&self, fp: &Fingerprint, scope: &Scope) -> Result<Match<'p>, MatchError> {
        matcher::resolve(fp, self.pool, scope)
    }

    pub fn resolve_all(&self, fp: &Fingerprint, scope: &Scope) -> Vec<Match<'p>> {
        matcher::resolve_all(fp, self.pool, scope)
    }

    pub fn resolve_in_class_of(
        &self,
        anchor: &Fingerprint,
        target: &Fingerprint,
    ) -> Result<Match<'p>, MatchError> {
        matcher::resolve_in_class_of(anchor, target, self.pool)
    }

    pub fn method(&self, id: MethodId) -> Result<&'p Method, PatchError> {
        self.pool
            .method(id)
            .ok_or(PatchError::Pool(dexpatch_file::Error::UnknownMethod(id)))
    }

    /// The current body of `id`: staged if this patch edited it, otherwise
    /// the pool's.
    pub fn body(&self, id: MethodId) -> Result<&Body, PatchError> {
        if let Some(body) = self.staged.get(&id) {
            return Ok(body);
        }
        let method = self.method(id)?;
        method
            .body()
            .ok_or_else(|| EditError::MissingBody(method.signature().to_string()).into())
    }

    /// Replace the current body of `id` with the result of `f`.
    pub fn edit<F, E>(&mut self, id: MethodId, f: F) -> Result<(), PatchError>
    where
        F: FnOnce(&Body) -> Result<Body, E>,
        E: Into<PatchError>,
    {
        let new = f(self.body(id)?).map_err(Into::into)?;
        self.staged.insert(id, new);
        Ok(())
    }

    pub fn is_staged(&self, id: MethodId) -> bool {
        self.staged.contains_key(&id)
    }

    /// Methods edited so far, in pool order.
    pub fn staged_methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.staged.keys().copied()
    }

    pub(crate) fn into_staged(self) -> BTreeMap<MethodId, Body> {
        self.staged
    }
}
