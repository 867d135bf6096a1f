//! Minimal single-threaded host: a local executor plus a table of mounted
//! roots that are re-rendered when their cells change.
//!
//! Rendering is batched. A cell change only marks its root dirty; the root
//! re-renders (once, however many changes happened) on the next
//! [`Runtime::flush`]. `run_until` and `run_until_stalled` flush between
//! task polls.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::task::Waker;

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::{self, AbortHandle, Abortable};
use futures::task::LocalSpawnExt;
use slotmap::{SlotMap, new_key_type};

use crate::container::{Container, ContainerRoot};
use crate::effects::listener_guard;
use crate::scope::Scope;
use crate::utils::update_from_stream;

new_key_type! {
    /// Handle of a mounted container.
    pub struct RootId;
}

pub(crate) trait Root {
    fn render(&mut self) -> String;
    /// Runs the change effect, if any, against the latest state.
    fn changed(&mut self);
}

#[derive(Clone, Copy, Debug)]
pub struct RuntimeConfig {
    /// Upper bound on run/flush alternations per `run_until_stalled`, and on
    /// consecutive flushes between two task polls.
    pub max_passes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { max_passes: 1024 }
    }
}

impl RuntimeConfig {
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }
}

#[derive(Default)]
struct DirtyRoots {
    ids: RefCell<Vec<RootId>>,
    waker: RefCell<Option<Waker>>,
}

impl DirtyRoots {
    fn mark(&self, id: RootId) {
        {
            let mut ids = self.ids.borrow_mut();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        let waker = self.waker.borrow_mut().take();
        if let Some(w) = waker {
            w.wake();
        }
    }

    fn take(&self) -> Vec<RootId> {
        std::mem::take(&mut *self.ids.borrow_mut())
    }

    fn register(&self, waker: &Waker) {
        *self.waker.borrow_mut() = Some(waker.clone());
    }
}

struct MountedRoot {
    root: Box<dyn Root>,
    frame: String,
    renders: usize,
    scope: Scope,
}

pub struct Runtime {
    config: RuntimeConfig,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    roots: RefCell<SlotMap<RootId, MountedRoot>>,
    dirty: Rc<DirtyRoots>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("roots", &self.roots.borrow().len())
            .field("dirty", &self.dirty.ids.borrow().len())
            .finish()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            config,
            pool: RefCell::new(pool),
            spawner,
            roots: RefCell::new(SlotMap::with_key()),
            dirty: Rc::new(DirtyRoots::default()),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn spawner(&self) -> LocalSpawner {
        self.spawner.clone()
    }

    pub fn spawn_local(&self, fut: impl Future<Output = ()> + 'static) {
        if let Err(e) = self.spawner.spawn_local(fut) {
            log::error!("spawn_local: {e}");
        }
    }

    /// Mounts `container`: subscribes to its cell, renders once, then runs
    /// the initial state effect inside the root's scope.
    pub fn mount<T: Clone + 'static>(&self, container: Container<T>) -> RootId {
        let Container {
            state_ref,
            view,
            init_effect,
            change_effect,
        } = container;

        let scope = Scope::new();
        let latest = Rc::new(RefCell::new(state_ref.mutable_get()));
        let root = ContainerRoot {
            state_ref: state_ref.clone(),
            latest: latest.clone(),
            view,
            change_effect,
        };
        let id = self.roots.borrow_mut().insert(MountedRoot {
            root: Box::new(root),
            frame: String::new(),
            renders: 0,
            scope: scope.clone(),
        });

        let listener = {
            let dirty = self.dirty.clone();
            state_ref.subscribe(move |st: &T| {
                *latest.borrow_mut() = st.clone();
                dirty.mark(id);
            })
        };
        let guard = listener_guard(&state_ref, listener);
        scope.add_disposer(move || guard.run());

        self.render(id);
        log::debug!("mount: root {id:?} mounted");

        if let Some(init) = init_effect {
            let current = state_ref.mutable_get();
            let stream = scope.run(|| init(&current, &state_ref));
            if let Some(stream) = stream {
                let (handle, registration) = AbortHandle::new_pair();
                scope.add_disposer(move || handle.abort());
                let drain = Abortable::new(update_from_stream(state_ref, stream), registration);
                self.spawn_local(async move {
                    if drain.await.is_err() {
                        log::debug!("mount: init stream dropped on unmount");
                    }
                });
            }
        }

        id
    }

    /// Tears a root down, running its scope's cleanups. Returns false (and
    /// warns) for unknown ids.
    pub fn unmount(&self, id: RootId) -> bool {
        let removed = self.roots.borrow_mut().remove(id);
        match removed {
            Some(mounted) => {
                mounted.scope.dispose();
                log::debug!("unmount: root {id:?} disposed");
                true
            }
            None => {
                log::warn!("unmount: no root mounted for {id:?}");
                false
            }
        }
    }

    pub fn is_mounted(&self, id: RootId) -> bool {
        self.roots.borrow().contains_key(id)
    }

    /// Last rendered frame of `id`.
    pub fn frame(&self, id: RootId) -> Option<String> {
        self.roots.borrow().get(id).map(|m| m.frame.clone())
    }

    pub fn render_count(&self, id: RootId) -> Option<usize> {
        self.roots.borrow().get(id).map(|m| m.renders)
    }

    fn render(&self, id: RootId) -> bool {
        let mut roots = self.roots.borrow_mut();
        let Some(mounted) = roots.get_mut(id) else {
            return false;
        };
        mounted.frame = mounted.root.render();
        mounted.renders += 1;
        true
    }

    /// Re-renders every dirty root once and runs its change effect.
    /// Returns the number of roots rendered.
    pub fn flush(&self) -> usize {
        let mut rendered = 0;
        for id in self.dirty.take() {
            let mut roots = self.roots.borrow_mut();
            let Some(mounted) = roots.get_mut(id) else {
                continue;
            };
            mounted.frame = mounted.root.render();
            mounted.renders += 1;
            mounted.root.changed();
            rendered += 1;
        }
        if rendered > 0 {
            log::trace!("flush: rendered {rendered} roots");
        }
        rendered
    }

    fn flush_bounded(&self) {
        let mut passes = 0;
        while self.flush() > 0 {
            passes += 1;
            if passes >= self.config.max_passes {
                log::warn!(
                    "flush: still dirty after {passes} passes; a change effect keeps updating state"
                );
                break;
            }
        }
    }

    /// Runs ready tasks and flushes renders until neither makes progress.
    ///
    /// Must not be called from inside a task of this runtime.
    pub fn run_until_stalled(&self) {
        for _ in 0..self.config.max_passes {
            self.pool.borrow_mut().run_until_stalled();
            if self.flush() == 0 {
                return;
            }
        }
        log::warn!(
            "run_until_stalled: gave up after {} passes",
            self.config.max_passes
        );
    }

    /// Drives `fut` to completion, running spawned tasks and flushing
    /// renders whenever a cell changes. Blocks the thread while idle.
    ///
    /// Must not be called from inside a task of this runtime.
    pub fn run_until<F: Future>(&self, fut: F) -> F::Output {
        let mut fut = pin!(fut);
        let driver = future::poll_fn(|cx| {
            self.dirty.register(cx.waker());
            self.flush_bounded();
            fut.as_mut().poll(cx)
        });
        let output = self.pool.borrow_mut().run_until(driver);
        self.flush_bounded();
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::app_container;

    #[test]
    fn changes_are_batched_into_one_render() {
        let rt = Runtime::new();
        let container = app_container(0, |p| format!("n={}", p.app_state));
        let cell = container.state_ref().clone();
        let id = rt.mount(container);
        assert_eq!(rt.frame(id).as_deref(), Some("n=0"));

        cell.update(|n| n + 1);
        cell.update(|n| n + 1);
        assert_eq!(rt.flush(), 1);
        assert_eq!(rt.frame(id).as_deref(), Some("n=2"));
        assert_eq!(rt.render_count(id), Some(2));
        assert_eq!(rt.flush(), 0);
    }

    #[test]
    fn unmount_unknown_root_is_reported() {
        let rt = Runtime::new();
        let id = rt.mount(app_container((), |_| String::new()));
        assert!(rt.unmount(id));
        assert!(!rt.unmount(id));
        assert!(!rt.is_mounted(id));
    }

    #[test]
    fn runaway_change_effect_is_bounded() {
        let rt = Runtime::with_config(RuntimeConfig::default().with_max_passes(8));
        let container = app_container(0u32, |p| p.app_state.to_string())
            .with_change_effect(|_, r| r.update(|n| n + 1));
        let cell = container.state_ref().clone();
        let id = rt.mount(container);
        cell.update(|n| n + 1);
        rt.run_until_stalled();
        assert_eq!(rt.render_count(id), Some(9));
    }
}
