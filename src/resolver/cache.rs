//! Shared resolution cache
//!
//! Each stylesheet path is resolved at most once per cache. A slot is
//! either claimed by an in-flight resolution or holds the finished map.
//! Concurrent requests for an in-flight path block until it completes,
//! unless waiting would close a wait-for cycle, in which case the request
//! fails with [`ScopeError::CyclicComposition`] instead of deadlocking.

use super::TokenMap;
use crate::error::{ScopeError, ScopeResult};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Identifies one top-level resolution and every nested step it performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolutionId(u64);

impl ResolutionId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug)]
enum Slot {
    InProgress(ResolutionId),
    Ready(Arc<TokenMap>),
}

#[derive(Debug, Default)]
struct CacheState {
    slots: HashMap<PathBuf, Slot>,
    /// Path each blocked resolution is waiting on
    waiting: HashMap<ResolutionId, PathBuf>,
}

impl CacheState {
    /// Whether following "owner waits on path owned by ..." from `owner`
    /// leads back to `me`
    fn leads_back_to(&self, mut owner: ResolutionId, me: ResolutionId) -> bool {
        for _ in 0..=self.waiting.len() {
            let Some(path) = self.waiting.get(&owner) else {
                return false;
            };
            match self.slots.get(path) {
                Some(Slot::InProgress(next)) if *next == me => return true,
                Some(Slot::InProgress(next)) => owner = *next,
                _ => return false,
            }
        }
        false
    }
}

/// Cache of resolved token maps, safe to share between threads.
///
/// A cache belongs to one naming configuration; maps are keyed by path only.
#[derive(Debug, Default)]
pub struct ResolverCache {
    state: Mutex<CacheState>,
    changed: Condvar,
}

/// Outcome of claiming a path
pub(crate) enum Claim<'a> {
    Ready(Arc<TokenMap>),
    Owned(ClaimGuard<'a>),
}

/// Exclusive right to resolve one path.
///
/// Dropping the guard without completing it releases the slot so waiters
/// can retry.
pub(crate) struct ClaimGuard<'a> {
    cache: &'a ResolverCache,
    path: PathBuf,
    completed: bool,
}

impl ClaimGuard<'_> {
    pub(crate) fn complete(mut self, map: Arc<TokenMap>) {
        let mut state = self.cache.state.lock();
        state.slots.insert(self.path.clone(), Slot::Ready(map));
        self.completed = true;
        self.cache.changed.notify_all();
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let mut state = self.cache.state.lock();
        state.slots.remove(&self.path);
        self.cache.changed.notify_all();
        debug!("Released {} after failed resolution", self.path.display());
    }
}

impl ResolverCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished map for `path`, if any
    pub fn get(&self, path: &Path) -> Option<Arc<TokenMap>> {
        match self.state.lock().slots.get(path) {
            Some(Slot::Ready(map)) => Some(Arc::clone(map)),
            _ => None,
        }
    }

    /// Number of finished maps
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every finished map; in-flight resolutions are kept
    pub fn clear(&self) {
        self.state
            .lock()
            .slots
            .retain(|_, slot| matches!(slot, Slot::InProgress(_)));
    }

    /// Claim `path` for resolution `id`, wait for another resolution to
    /// finish it, or fail if doing either would close a cycle.
    ///
    /// `stack` is the chain of paths `id` is currently resolving.
    pub(crate) fn claim(
        &self,
        path: &Path,
        id: ResolutionId,
        stack: &[PathBuf],
    ) -> ScopeResult<Claim<'_>> {
        let mut state = self.state.lock();

        loop {
            let owner = match state.slots.get(path) {
                None => {
                    state
                        .slots
                        .insert(path.to_path_buf(), Slot::InProgress(id));
                    trace!("Claimed {}", path.display());
                    return Ok(Claim::Owned(ClaimGuard {
                        cache: self,
                        path: path.to_path_buf(),
                        completed: false,
                    }));
                }
                Some(Slot::Ready(map)) => {
                    trace!("Cache hit for {}", path.display());
                    return Ok(Claim::Ready(Arc::clone(map)));
                }
                Some(Slot::InProgress(owner)) => *owner,
            };

            if owner == id || state.leads_back_to(owner, id) {
                return Err(cycle_error(stack, path));
            }

            debug!("Waiting for in-flight resolution of {}", path.display());
            state.waiting.insert(id, path.to_path_buf());
            self.changed.wait(&mut state);
            state.waiting.remove(&id);
        }
    }
}

fn cycle_error(stack: &[PathBuf], path: &Path) -> ScopeError {
    let start = stack.iter().position(|p| p == path).unwrap_or(0);
    let mut chain = stack[start..].to_vec();
    chain.push(path.to_path_buf());
    ScopeError::CyclicComposition { chain }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(claim: Claim<'_>) -> ClaimGuard<'_> {
        match claim {
            Claim::Owned(guard) => guard,
            Claim::Ready(_) => panic!("expected to own the slot"),
        }
    }

    #[test]
    fn claim_complete_then_hit() {
        let cache = ResolverCache::new();
        let path = Path::new("/p/a.css");
        let id = ResolutionId::next();

        let guard = owned(cache.claim(path, id, &[]).unwrap());
        assert!(cache.get(path).is_none());
        let mut map = TokenMap::new();
        map.insert("a", "x_a");
        guard.complete(Arc::new(map));

        assert_eq!(cache.len(), 1);
        let hit = cache.claim(path, ResolutionId::next(), &[]).unwrap();
        match hit {
            Claim::Ready(map) => assert_eq!(map.get("a"), Some("x_a")),
            Claim::Owned(_) => panic!("expected a cache hit"),
        }
    }

    #[test]
    fn reclaim_by_same_resolution_is_a_cycle() {
        let cache = ResolverCache::new();
        let a = PathBuf::from("/p/a.css");
        let b = PathBuf::from("/p/b.css");
        let id = ResolutionId::next();

        let _a = owned(cache.claim(&a, id, &[]).unwrap());
        let _b = owned(cache.claim(&b, id, &[a.clone()]).unwrap());
        let err = cache
            .claim(&a, id, &[a.clone(), b.clone()])
            .err()
            .unwrap();
        match err {
            ScopeError::CyclicComposition { chain } => assert_eq!(chain, vec![a.clone(), b, a]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dropped_claim_releases_slot() {
        let cache = ResolverCache::new();
        let path = Path::new("/p/a.css");
        drop(owned(cache.claim(path, ResolutionId::next(), &[]).unwrap()));
        assert!(cache.is_empty());
        owned(cache.claim(path, ResolutionId::next(), &[]).unwrap());
    }

    #[test]
    fn clear_keeps_in_flight() {
        let cache = ResolverCache::new();
        owned(cache.claim(Path::new("/p/a.css"), ResolutionId::next(), &[]).unwrap())
            .complete(Arc::new(TokenMap::new()));
        let _b = owned(cache.claim(Path::new("/p/b.css"), ResolutionId::next(), &[]).unwrap());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(Path::new("/p/a.css")).is_none());
    }
}
