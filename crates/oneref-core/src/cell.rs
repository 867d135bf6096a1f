use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};
use std::thread;

use futures::channel::oneshot;
use smallvec::SmallVec;

use crate::error::{UpdateError, panic_message};

/// A pure `T -> T` function. The only sanctioned way to change a cell.
pub type StateTransformer<T> = Box<dyn FnOnce(&T) -> T>;

/// Called with the new value after every applied update.
pub type StateChangeListener<T> = Rc<dyn Fn(&T)>;

/// Handle of a registered listener: its slot in registration order.
///
/// Slots are never handed out twice; removing a listener leaves a hole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

impl ListenerId {
    pub fn index(self) -> usize {
        self.0
    }
}

pub(crate) type Completion<T> = Box<dyn FnOnce(&T)>;

/// A queued transformation. `None` means it failed and nothing is applied.
pub(crate) type Apply<T> = Box<dyn FnOnce(&T) -> Option<(T, Option<Completion<T>>)>>;

/// Where a derived cell sends its transformations instead of applying them.
pub(crate) type Forward<T> = Rc<dyn Fn(Apply<T>)>;

/// Runs after the regular listeners of every pass. Returning `false`
/// detaches it.
pub(crate) type Follower<T> = Rc<dyn Fn(&T) -> bool>;

struct Job<T> {
    run: Apply<T>,
    // Sync writes from the source cell must land locally.
    forwardable: bool,
}

struct RefImpl<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<Option<StateChangeListener<T>>>>,
    followers: RefCell<Vec<Follower<T>>>,
    pending: RefCell<VecDeque<Job<T>>>,
    draining: Cell<bool>,
    forward: RefCell<Option<Forward<T>>>,
}

struct Draining<'a, T> {
    flag: &'a Cell<bool>,
    pending: &'a RefCell<VecDeque<Job<T>>>,
}

impl<T> Drop for Draining<'_, T> {
    fn drop(&mut self) {
        self.flag.set(false);
        if thread::panicking() {
            // Jobs queued by the failed pass must not surface on a later,
            // unrelated update.
            let dropped = std::mem::take(&mut *self.pending.borrow_mut());
            if !dropped.is_empty() {
                log::warn!("update pass panicked, discarding {} queued updates", dropped.len());
            }
        }
    }
}

impl<T: Clone + 'static> RefImpl<T> {
    fn enqueue(&self, job: Job<T>) {
        if job.forwardable {
            let forward = self.forward.borrow().clone();
            if let Some(forward) = forward {
                forward(job.run);
                return;
            }
        }
        self.pending.borrow_mut().push_back(job);
        if self.draining.get() {
            log::trace!(
                "update queued during active pass ({} pending)",
                self.pending.borrow().len()
            );
            return;
        }
        self.drain();
    }

    /// Applies queued jobs one at a time. Only the outermost caller drains;
    /// updates issued from transformations or listeners land in the queue.
    fn drain(&self) {
        if self.draining.replace(true) {
            return;
        }
        let _draining = Draining {
            flag: &self.draining,
            pending: &self.pending,
        };

        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(job) = next else { break };

            let applied = {
                let current = self.value.borrow();
                (job.run)(&current)
            };
            let Some((next_value, done)) = applied else {
                continue;
            };

            *self.value.borrow_mut() = next_value.clone();
            self.notify(&next_value);
            self.notify_followers(&next_value);

            if let Some(done) = done {
                done(&next_value);
            }
        }
    }

    fn notify(&self, value: &T) {
        let snapshot: SmallVec<[(ListenerId, StateChangeListener<T>); 4]> = self
            .listeners
            .borrow()
            .iter()
            .enumerate()
            .filter_map(|(idx, l)| l.as_ref().map(|l| (ListenerId(idx), Rc::clone(l))))
            .collect();

        for (id, listener) in snapshot {
            if !self.is_registered(id, &listener) {
                continue;
            }
            listener(value);
        }
    }

    fn notify_followers(&self, value: &T) {
        let snapshot: SmallVec<[Follower<T>; 2]> = self.followers.borrow().iter().cloned().collect();
        for follower in snapshot {
            if !follower(value) {
                self.followers.borrow_mut().retain(|f| !Rc::ptr_eq(f, &follower));
            }
        }
    }

    fn is_registered(&self, id: ListenerId, listener: &StateChangeListener<T>) -> bool {
        matches!(
            self.listeners.borrow().get(id.0),
            Some(Some(l)) if Rc::ptr_eq(l, listener)
        )
    }
}

/// Opaque handle to a state cell.
///
/// Cloning the handle shares the cell. The held value can only be replaced
/// through [`StateRef::update`] and [`StateRef::update_async`].
pub struct StateRef<T: 'static>(Rc<RefImpl<T>>);

impl<T> Clone for StateRef<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> fmt::Debug for StateRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateRef")
            .field(
                "listeners",
                &self.0.listeners.borrow().iter().flatten().count(),
            )
            .field("pending", &self.0.pending.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Non-owning handle, used where holding the cell would form a cycle.
pub struct WeakStateRef<T: 'static>(Weak<RefImpl<T>>);

impl<T> Clone for WeakStateRef<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> WeakStateRef<T> {
    pub fn upgrade(&self) -> Option<StateRef<T>> {
        self.0.upgrade().map(StateRef)
    }
}

impl<T: Clone + 'static> StateRef<T> {
    pub fn new(initial: T) -> Self {
        Self(Rc::new(RefImpl {
            value: RefCell::new(initial),
            listeners: RefCell::new(Vec::new()),
            followers: RefCell::new(Vec::new()),
            pending: RefCell::new(VecDeque::new()),
            draining: Cell::new(false),
            forward: RefCell::new(None),
        }))
    }

    /// Current value.
    ///
    /// Two calls may return different values, so this belongs in action
    /// code only. Render code receives the state it should show.
    pub fn mutable_get(&self) -> T {
        self.0.value.borrow().clone()
    }

    /// Replace the value with `transform(current)` and notify listeners in
    /// registration order.
    ///
    /// Called while this cell is already applying an update (from a
    /// transformation or a listener), the transformation is queued and runs
    /// once the active pass completes.
    pub fn update(&self, transform: impl FnOnce(&T) -> T + 'static) {
        self.0.enqueue(Job {
            run: Box::new(move |s| Some((transform(s), None))),
            forwardable: true,
        });
    }

    /// Like [`update`](Self::update), but the transformation also computes
    /// an auxiliary value. The returned future resolves with the applied
    /// state and that value once listeners have been notified.
    ///
    /// The update is applied at call time (or queued, as for `update`),
    /// not when the future is first polled.
    pub fn update_async<A: 'static>(
        &self,
        transform: impl FnOnce(&T) -> (T, A) + 'static,
    ) -> AsyncUpdate<T, A> {
        let (tx, rx) = oneshot::channel();
        self.0.enqueue(Job {
            run: Box::new(move |s| match catch_unwind(AssertUnwindSafe(|| transform(s))) {
                Ok((next, aux)) => {
                    let done: Completion<T> = Box::new(move |applied: &T| {
                        let _ = tx.send(Ok((applied.clone(), aux)));
                    });
                    Some((next, Some(done)))
                }
                Err(payload) => {
                    let msg = panic_message(payload);
                    log::warn!("update_async: transformation panicked: {msg}");
                    let _ = tx.send(Err(UpdateError::Panicked(msg)));
                    None
                }
            }),
            forwardable: true,
        });
        AsyncUpdate { rx }
    }

    /// [`update_async`](Self::update_async) without an auxiliary value.
    pub fn update_async_(
        &self,
        transform: impl FnOnce(&T) -> T + 'static,
    ) -> impl Future<Output = Result<T, UpdateError>> + 'static {
        let pending = self.update_async(move |s| (transform(s), ()));
        async move { pending.await.map(|(s, ())| s) }
    }

    /// Registers `listener`. Registering the same `Rc` again returns the
    /// id it already has.
    pub fn add_listener(&self, listener: StateChangeListener<T>) -> ListenerId {
        let mut listeners = self.0.listeners.borrow_mut();
        if let Some(idx) = listeners
            .iter()
            .position(|l| l.as_ref().is_some_and(|l| Rc::ptr_eq(l, &listener)))
        {
            return ListenerId(idx);
        }
        listeners.push(Some(listener));
        let id = ListenerId(listeners.len() - 1);
        log::debug!("add_listener: registered listener {}", id.0);
        id
    }

    /// Wraps `f` in a new `Rc` and registers it.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> ListenerId {
        self.add_listener(Rc::new(f))
    }

    /// Unregisters the listener at `id`. Unknown ids only log a warning.
    pub fn remove_listener(&self, id: ListenerId) {
        let removed = self
            .0
            .listeners
            .borrow_mut()
            .get_mut(id.0)
            .and_then(Option::take);
        if removed.is_none() {
            log::warn!("remove_listener: no listener found for id {}", id.0);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.0.listeners.borrow().iter().flatten().count()
    }

    /// A hook-style setter bound to this cell.
    pub fn updater(&self) -> StateUpdater<T> {
        let this = self.clone();
        StateUpdater::new(move |tf| this.update(tf))
    }

    pub fn downgrade(&self) -> WeakStateRef<T> {
        WeakStateRef(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Sends every transformation on this cell to `forward` instead of
    /// applying it here. The value then changes only through
    /// [`set_synced`](Self::set_synced).
    pub(crate) fn forward_to(&self, forward: Forward<T>) {
        *self.0.forward.borrow_mut() = Some(forward);
    }

    /// Queues a raw job; used to replay a derived cell's transformation.
    pub(crate) fn enqueue_apply(&self, run: Apply<T>) {
        self.0.enqueue(Job {
            run,
            forwardable: true,
        });
    }

    /// Replaces the value outright, bypassing any forward.
    pub(crate) fn set_synced(&self, value: T) {
        self.0.enqueue(Job {
            run: Box::new(move |_| Some((value, None))),
            forwardable: false,
        });
    }

    pub(crate) fn add_follower(&self, follower: Follower<T>) {
        self.0.followers.borrow_mut().push(follower);
    }

    pub(crate) fn follower_count(&self) -> usize {
        self.0.followers.borrow().len()
    }
}

/// Resolves once an [`StateRef::update_async`] transformation has been
/// applied and its listeners notified.
#[derive(Debug)]
pub struct AsyncUpdate<T, A> {
    rx: oneshot::Receiver<Result<(T, A), UpdateError>>,
}

impl<T, A> Future for AsyncUpdate<T, A> {
    type Output = Result<(T, A), UpdateError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(UpdateError::Canceled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Hook-style setter: accepts transformations only, never raw values.
pub struct StateUpdater<T>(Rc<dyn Fn(StateTransformer<T>)>);

impl<T> Clone for StateUpdater<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> fmt::Debug for StateUpdater<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateUpdater").finish_non_exhaustive()
    }
}

impl<T: 'static> StateUpdater<T> {
    pub fn new(f: impl Fn(StateTransformer<T>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, transform: impl FnOnce(&T) -> T + 'static) {
        (self.0)(Box::new(transform))
    }
}

pub fn mk_ref<T: Clone + 'static>(initial: T) -> StateRef<T> {
    StateRef::new(initial)
}

pub fn mutable_get<T: Clone + 'static>(state_ref: &StateRef<T>) -> T {
    state_ref.mutable_get()
}

pub fn update<T: Clone + 'static>(state_ref: &StateRef<T>, transform: impl FnOnce(&T) -> T + 'static) {
    state_ref.update(transform)
}

pub fn update_async<T: Clone + 'static, A: 'static>(
    state_ref: &StateRef<T>,
    transform: impl FnOnce(&T) -> (T, A) + 'static,
) -> AsyncUpdate<T, A> {
    state_ref.update_async(transform)
}

pub fn update_async_<T: Clone + 'static>(
    state_ref: &StateRef<T>,
    transform: impl FnOnce(&T) -> T + 'static,
) -> impl Future<Output = Result<T, UpdateError>> + 'static {
    state_ref.update_async_(transform)
}

pub fn add_state_change_listener<T: Clone + 'static>(
    state_ref: &StateRef<T>,
    listener: StateChangeListener<T>,
) -> ListenerId {
    state_ref.add_listener(listener)
}

pub fn remove_state_change_listener<T: Clone + 'static>(state_ref: &StateRef<T>, id: ListenerId) {
    state_ref.remove_listener(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_slot_is_not_reused() {
        let cell = mk_ref(0);
        let a = cell.subscribe(|_| {});
        cell.remove_listener(a);
        let b = cell.subscribe(|_| {});
        assert_ne!(a, b);
        assert_eq!(b.index(), 1);
        assert_eq!(cell.listener_count(), 1);
    }

    #[test]
    fn listener_removed_mid_pass_is_skipped() {
        let cell = mk_ref(0);
        let hits = Rc::new(Cell::new(0));
        let victim: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        {
            let cell2 = cell.downgrade();
            let victim = victim.clone();
            cell.subscribe(move |_| {
                if let (Some(c), Some(id)) = (cell2.upgrade(), victim.get()) {
                    c.remove_listener(id);
                }
            });
        }
        let id = {
            let hits = hits.clone();
            cell.subscribe(move |_| hits.set(hits.get() + 1))
        };
        victim.set(Some(id));

        cell.update(|s| s + 1);
        assert_eq!(hits.get(), 0);
        assert_eq!(cell.listener_count(), 1);
    }

    #[test]
    fn transformation_may_read_current_value() {
        let cell = mk_ref(5);
        let peek = cell.clone();
        cell.update(move |s| s + peek.mutable_get());
        assert_eq!(cell.mutable_get(), 10);
    }
}
