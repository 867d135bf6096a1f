//! State composition.
//!
//! A focus pairs a projection `view: &OT -> IT` with an injection
//! `inject: (&OT, IT) -> OT` so a component can work on its own slice of
//! the application state without knowing what surrounds it.
//!
//! Projection and injection are expected to round-trip:
//! `inject(o, view(o)) == o`.

use std::fmt;
use std::rc::Rc;

use crate::cell::{Apply, Completion, Forward, StateRef, StateTransformer, StateUpdater};

pub struct Focus<OT, IT> {
    view: Rc<dyn Fn(&OT) -> IT>,
    inject: Rc<dyn Fn(&OT, IT) -> OT>,
}

impl<OT, IT> Clone for Focus<OT, IT> {
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
            inject: self.inject.clone(),
        }
    }
}

impl<OT, IT> fmt::Debug for Focus<OT, IT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Focus").finish_non_exhaustive()
    }
}

pub fn focus<OT, IT>(
    view: impl Fn(&OT) -> IT + 'static,
    inject: impl Fn(&OT, IT) -> OT + 'static,
) -> Focus<OT, IT> {
    Focus {
        view: Rc::new(view),
        inject: Rc::new(inject),
    }
}

impl<OT: Clone + 'static, IT: Clone + 'static> Focus<OT, IT> {
    pub fn project(&self, outer: &OT) -> IT {
        (self.view)(outer)
    }

    pub fn inject(&self, outer: &OT, inner: IT) -> OT {
        (self.inject)(outer, inner)
    }

    /// Derive a cell for the focused slice of `outer`.
    ///
    /// `outer` stays the only source of truth. A transformation on the
    /// derived cell is queued on `outer` as
    /// `inject(o, f(&view(o)))`, so it always sees the latest outer value.
    /// After each outer pass, once `outer`'s own listeners have run, the
    /// derived cell is refreshed to `view(o)` and its listeners are
    /// notified. The derived cell holds `outer` alive; `outer` only holds
    /// the derived cell weakly and forgets it once it is dropped.
    pub fn apply(&self, outer: &StateRef<OT>) -> (IT, StateRef<IT>) {
        let current = self.project(&outer.mutable_get());
        let inner = StateRef::new(current.clone());

        let forward: Forward<IT> = {
            let outer = outer.clone();
            let view = self.view.clone();
            let inject = self.inject.clone();
            Rc::new(move |run: Apply<IT>| {
                let view = view.clone();
                let inject = inject.clone();
                outer.enqueue_apply(Box::new(move |o: &OT| {
                    let (next_inner, done) = run(&view(o))?;
                    let done = done.map(|done| -> Completion<OT> {
                        Box::new(move |applied: &OT| done(&view(applied)))
                    });
                    Some((inject(o, next_inner), done))
                }));
            })
        };
        inner.forward_to(forward);

        let weak_inner = inner.downgrade();
        let view = self.view.clone();
        outer.add_follower(Rc::new(move |o: &OT| match weak_inner.upgrade() {
            Some(inner) => {
                inner.set_synced(view(o));
                true
            }
            None => {
                log::debug!("focus: derived cell dropped, detaching from outer");
                false
            }
        }));

        (current, inner)
    }
}

/// The setter-based variant of [`Focus`]: works with a value and a
/// [`StateUpdater`] instead of a cell.
pub struct FocusSetter<OT, IT> {
    focus: Focus<OT, IT>,
}

impl<OT, IT> Clone for FocusSetter<OT, IT> {
    fn clone(&self) -> Self {
        Self {
            focus: self.focus.clone(),
        }
    }
}

impl<OT, IT> fmt::Debug for FocusSetter<OT, IT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusSetter").finish_non_exhaustive()
    }
}

pub fn mk_focus<OT, IT>(
    view: impl Fn(&OT) -> IT + 'static,
    inject: impl Fn(&OT, IT) -> OT + 'static,
) -> FocusSetter<OT, IT> {
    FocusSetter {
        focus: focus(view, inject),
    }
}

impl<OT: Clone + 'static, IT: Clone + 'static> FocusSetter<OT, IT> {
    /// Returns the focused value of `outer` and an updater that routes
    /// inner transformations through `update_outer`.
    pub fn apply(&self, outer: &OT, update_outer: &StateUpdater<OT>) -> (IT, StateUpdater<IT>) {
        let view = self.focus.view.clone();
        let inject = self.focus.inject.clone();
        let update_outer = update_outer.clone();
        let update_inner = StateUpdater::new(move |itf: StateTransformer<IT>| {
            let view = view.clone();
            let inject = inject.clone();
            update_outer.call(move |o| inject(o, itf(&view(o))));
        });
        (self.focus.project(outer), update_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Clone, Debug, PartialEq)]
    struct Pair {
        left: i32,
        right: i32,
    }

    fn left() -> Focus<Pair, i32> {
        focus(|p: &Pair| p.left, |p: &Pair, left| Pair { left, ..p.clone() })
    }

    #[test]
    fn outer_changes_flow_into_derived_cell() {
        let outer = StateRef::new(Pair { left: 1, right: 2 });
        let (_, inner) = left().apply(&outer);
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            inner.subscribe(move |v| seen.borrow_mut().push(*v));
        }

        outer.update(|p| Pair { left: 10, ..p.clone() });
        assert_eq!(inner.mutable_get(), 10);
        assert_eq!(*seen.borrow(), vec![10]);
    }

    #[test]
    fn inner_update_notifies_inner_listeners_once() {
        let outer = StateRef::new(Pair { left: 1, right: 2 });
        let (_, inner) = left().apply(&outer);
        let count = Rc::new(Cell::new(0));
        {
            let count = count.clone();
            inner.subscribe(move |_| count.set(count.get() + 1));
        }
        inner.update(|l| l + 1);
        assert_eq!(count.get(), 1);
        assert_eq!(outer.mutable_get(), Pair { left: 2, right: 2 });
    }

    #[test]
    fn dropped_derived_cell_detaches_from_outer() {
        let outer = StateRef::new(Pair { left: 1, right: 2 });
        let (_, inner) = left().apply(&outer);
        assert_eq!(outer.follower_count(), 1);
        drop(inner);
        outer.update(|p| p.clone());
        assert_eq!(outer.follower_count(), 0);
    }

    #[test]
    fn async_update_on_derived_cell_resolves_with_projection() {
        let outer = StateRef::new(Pair { left: 1, right: 2 });
        let (_, inner) = left().apply(&outer);
        let pending = inner.update_async(|l| (l + 4, "aux"));
        let (applied, aux) = futures::executor::block_on(pending).expect("applied");
        assert_eq!((applied, aux), (5, "aux"));
        assert_eq!(inner.mutable_get(), 5);
        assert_eq!(outer.mutable_get().left, 5);
    }

    #[test]
    fn focus_of_a_focus_reaches_the_root() {
        #[derive(Clone, Debug, PartialEq)]
        struct Root {
            pair: Pair,
            tag: &'static str,
        }
        let root = StateRef::new(Root {
            pair: Pair { left: 1, right: 2 },
            tag: "t",
        });
        let pair = focus(|r: &Root| r.pair.clone(), |r: &Root, pair| Root { pair, ..r.clone() });
        let (_, pair_ref) = pair.apply(&root);
        let (_, left_ref) = left().apply(&pair_ref);

        left_ref.update(|l| l * 7);
        assert_eq!(root.mutable_get().pair, Pair { left: 7, right: 2 });
        assert_eq!(pair_ref.mutable_get().left, 7);
        assert_eq!(left_ref.mutable_get(), 7);
    }

    #[test]
    fn setter_variant_routes_through_outer() {
        let outer = StateRef::new(Pair { left: 1, right: 2 });
        let right = mk_focus(|p: &Pair| p.right, |p: &Pair, right| Pair { right, ..p.clone() });
        let (value, set_right) = right.apply(&outer.mutable_get(), &outer.updater());
        assert_eq!(value, 2);
        set_right.call(|r| r * 21);
        assert_eq!(outer.mutable_get(), Pair { left: 1, right: 42 });
    }
}
