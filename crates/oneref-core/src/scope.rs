use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Cleanup = Box<dyn FnOnce()>;

thread_local! {
    static ACTIVE: RefCell<Option<Weak<ScopeInner>>> = const { RefCell::new(None) };
}

/// Owner of the cleanups belonging to one mounted root: its cell listener,
/// its init-effect task, and whatever effects ran while it was active.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

struct ScopeInner {
    cleanups: RefCell<Vec<Cleanup>>,
    children: RefCell<Vec<Scope>>,
    disposed: Cell<bool>,
}

impl ScopeInner {
    fn release(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let children = std::mem::take(&mut *self.children.borrow_mut());
        for child in &children {
            child.inner.release();
        }
        let cleanups = std::mem::take(&mut *self.cleanups.borrow_mut());
        for cleanup in cleanups {
            cleanup();
        }
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.release();
    }
}

// Restores the previously active scope, also when the closure panics.
struct Restore(Option<Weak<ScopeInner>>);

impl Drop for Restore {
    fn drop(&mut self) {
        let prev = self.0.take();
        ACTIVE.with(|active| *active.borrow_mut() = prev);
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("cleanups", &self.inner.cleanups.borrow().len())
            .field("children", &self.inner.children.borrow().len())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

impl Scope {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                cleanups: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Runs `f` with this scope active, so [`current_scope`] returns it.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let prev = ACTIVE.with(|active| active.borrow_mut().replace(Rc::downgrade(&self.inner)));
        let _restore = Restore(prev);
        f()
    }

    /// Registers a cleanup. On an already disposed scope it runs at once.
    pub fn add_disposer(&self, cleanup: impl FnOnce() + 'static) {
        if self.inner.disposed.get() {
            log::debug!("scope: disposer added after dispose, running it now");
            cleanup();
            return;
        }
        self.inner.cleanups.borrow_mut().push(Box::new(cleanup));
    }

    /// A nested scope, disposed before this one's own cleanups run.
    pub fn child(&self) -> Scope {
        let child = Scope::new();
        self.inner.children.borrow_mut().push(child.clone());
        child
    }

    /// Runs every cleanup once. Later calls do nothing.
    pub fn dispose(&self) {
        self.inner.release();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

pub fn current_scope() -> Option<Scope> {
    ACTIVE.with(|active| {
        active
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Scope { inner })
    })
}

/// Runs `f` now and hands the cleanup it returns to the active scope.
/// Without an active scope the cleanup is dropped unrun.
pub fn scoped_effect<F>(f: F)
where
    F: FnOnce() -> Box<dyn FnOnce()> + 'static,
{
    let cleanup = f();
    match current_scope() {
        Some(scope) => scope.add_disposer(cleanup),
        None => log::debug!("scoped_effect: no active scope, cleanup will not run"),
    }
}
