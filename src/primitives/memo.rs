// ============================================================================
// spark-features - Revision Memo
// Cached derived values keyed on a revision number
// ============================================================================
//
// A derived view is a pure function of (revision, store contents). Since
// every store change bumps the revision, the revision alone decides whether
// the cached value is still good.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;

/// A value computed at some revision and reused until the revision moves.
pub struct RevisionMemo<T> {
    cached: RefCell<Option<(u64, T)>>,

    /// How many times the value has been computed
    computations: Cell<u64>,
}

impl<T: Clone> RevisionMemo<T> {
    pub fn new() -> Self {
        Self {
            cached: RefCell::new(None),
            computations: Cell::new(0),
        }
    }

    /// Return the cached value if it was computed at `revision`, otherwise
    /// compute, cache and return it.
    pub fn get(&self, revision: u64, compute: impl FnOnce() -> T) -> T {
        if let Some((rev, value)) = self.cached.borrow().as_ref() {
            if *rev == revision {
                return value.clone();
            }
        }

        // Compute outside the borrow; `compute` may read other memos
        let value = compute();
        self.computations.set(self.computations.get() + 1);
        *self.cached.borrow_mut() = Some((revision, value.clone()));
        value
    }

    /// Forget the cached value.
    pub fn invalidate(&self) {
        self.cached.borrow_mut().take();
    }

    /// Revision the cached value was computed at, if any.
    pub fn cached_revision(&self) -> Option<u64> {
        self.cached.borrow().as_ref().map(|(rev, _)| *rev)
    }

    pub fn computations(&self) -> u64 {
        self.computations.get()
    }
}

impl<T: Clone> Default for RevisionMemo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RevisionMemo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevisionMemo")
            .field("cached_revision", &self.cached.borrow().as_ref().map(|(rev, _)| *rev))
            .field("computations", &self.computations.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_per_revision() {
        let memo: RevisionMemo<Vec<u32>> = RevisionMemo::new();

        assert_eq!(memo.get(1, || vec![1]), vec![1]);
        assert_eq!(memo.get(1, || vec![99]), vec![1]);
        assert_eq!(memo.computations(), 1);

        assert_eq!(memo.get(2, || vec![2]), vec![2]);
        assert_eq!(memo.computations(), 2);
        assert_eq!(memo.cached_revision(), Some(2));
    }

    #[test]
    fn invalidate_forces_recompute() {
        let memo: RevisionMemo<u32> = RevisionMemo::new();
        memo.get(5, || 1);
        memo.invalidate();
        assert_eq!(memo.cached_revision(), None);
        assert_eq!(memo.get(5, || 2), 2);
    }
}
