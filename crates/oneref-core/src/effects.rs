use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::cell::{ListenerId, StateRef};
use crate::scope::current_scope;

/// A shared, run-once cleanup. Clones refer to the same cleanup.
#[derive(Clone)]
pub struct Dispose(Rc<Cell<Option<Box<dyn FnOnce()>>>>);

impl fmt::Debug for Dispose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cleanup = self.0.take();
        let pending = cleanup.is_some();
        self.0.set(cleanup);
        f.debug_struct("Dispose").field("pending", &pending).finish()
    }
}

impl Dispose {
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(Cell::new(Some(Box::new(cleanup)))))
    }

    /// Runs the cleanup unless some clone already did.
    pub fn run(&self) {
        if let Some(cleanup) = self.0.take() {
            cleanup();
        }
    }

    pub fn is_pending(&self) -> bool {
        let cleanup = self.0.take();
        let pending = cleanup.is_some();
        self.0.set(cleanup);
        pending
    }
}

/// Runs `setup` immediately and returns the cleanup it produced.
///
/// Inside a mounted root's init effect the cleanup is also tied to the root
/// and runs on unmount.
pub fn effect<F>(setup: F) -> Dispose
where
    F: FnOnce() -> Dispose + 'static,
{
    let dispose = setup();
    if let Some(scope) = current_scope() {
        let on_dispose = dispose.clone();
        scope.add_disposer(move || on_dispose.run());
    }
    dispose
}

pub fn on_unmount(cleanup: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(cleanup)
}

/// Cleanup that unregisters `id` from `state_ref`.
///
/// Holds the cell weakly: if the cell is already gone there is nothing to
/// remove.
pub fn listener_guard<T: Clone + 'static>(state_ref: &StateRef<T>, id: ListenerId) -> Dispose {
    let weak = state_ref.downgrade();
    Dispose::new(move || {
        if let Some(state_ref) = weak.upgrade() {
            state_ref.remove_listener(id);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_removes_listener_once() {
        let cell = StateRef::new(0);
        let id = cell.subscribe(|_| {});
        let guard = listener_guard(&cell, id);
        assert!(guard.is_pending());
        guard.run();
        guard.clone().run();
        assert_eq!(cell.listener_count(), 0);
        assert!(!guard.is_pending());
    }

    #[test]
    fn guard_outliving_cell_is_harmless() {
        let cell = StateRef::new(0);
        let guard = listener_guard(&cell, cell.subscribe(|_| {}));
        drop(cell);
        guard.run();
    }
}
