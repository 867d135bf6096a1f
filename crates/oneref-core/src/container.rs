//! Binding of a state cell to the host render loop.
//!
//! A [`Container`] pairs a cell with a view function. Once mounted on a
//! [`Runtime`](crate::runtime::Runtime) it re-renders whenever the cell
//! changes and runs the optional effects:
//!
//! - the *initial state effect* runs once after the first render. If it
//!   returns a stream of transformations, the runtime drains it into the
//!   cell;
//! - the *state change effect* runs after every render caused by a change.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::stream::LocalBoxStream;

use crate::cell::{StateRef, StateTransformer};

/// Stream of transformations driving a cell from external events.
pub type TransformerStream<T> = LocalBoxStream<'static, StateTransformer<T>>;

pub type InitialStateEffect<T> = Box<dyn FnOnce(&T, &StateRef<T>) -> Option<TransformerStream<T>>>;
pub type StateChangeEffect<T> = Box<dyn FnMut(&T, &StateRef<T>)>;
pub type ViewFn<T> = Box<dyn FnMut(StateRefProps<'_, T>) -> String>;

/// What a view receives: the state snapshot to render and the cell to hand
/// to action code.
pub struct StateRefProps<'a, T: 'static> {
    pub app_state: &'a T,
    pub state_ref: &'a StateRef<T>,
}

impl<T> Clone for StateRefProps<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StateRefProps<'_, T> {}

pub struct Container<T: 'static> {
    pub(crate) state_ref: StateRef<T>,
    pub(crate) view: ViewFn<T>,
    pub(crate) init_effect: Option<InitialStateEffect<T>>,
    pub(crate) change_effect: Option<StateChangeEffect<T>>,
}

impl<T> fmt::Debug for Container<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("state_ref", &self.state_ref)
            .field("init_effect", &self.init_effect.is_some())
            .field("change_effect", &self.change_effect.is_some())
            .finish()
    }
}

/// Container bound to an existing cell.
pub fn ref_container<T: Clone + 'static>(
    state_ref: StateRef<T>,
    view: impl FnMut(StateRefProps<'_, T>) -> String + 'static,
) -> Container<T> {
    Container {
        state_ref,
        view: Box::new(view),
        init_effect: None,
        change_effect: None,
    }
}

/// Container owning a fresh cell holding `initial`.
pub fn app_container<T: Clone + 'static>(
    initial: T,
    view: impl FnMut(StateRefProps<'_, T>) -> String + 'static,
) -> Container<T> {
    ref_container(StateRef::new(initial), view)
}

impl<T: Clone + 'static> Container<T> {
    pub fn with_init_effect(
        mut self,
        effect: impl FnOnce(&T, &StateRef<T>) -> Option<TransformerStream<T>> + 'static,
    ) -> Self {
        self.init_effect = Some(Box::new(effect));
        self
    }

    pub fn with_change_effect(mut self, effect: impl FnMut(&T, &StateRef<T>) + 'static) -> Self {
        self.change_effect = Some(Box::new(effect));
        self
    }

    pub fn state_ref(&self) -> &StateRef<T> {
        &self.state_ref
    }
}

/// Mounted form of a container, type-erased behind [`crate::runtime::Root`].
pub(crate) struct ContainerRoot<T: 'static> {
    pub(crate) state_ref: StateRef<T>,
    // Last value delivered by the cell's listener; what the next render shows.
    pub(crate) latest: Rc<RefCell<T>>,
    pub(crate) view: ViewFn<T>,
    pub(crate) change_effect: Option<StateChangeEffect<T>>,
}

impl<T: Clone + 'static> crate::runtime::Root for ContainerRoot<T> {
    fn render(&mut self) -> String {
        let app_state = self.latest.borrow().clone();
        (self.view)(StateRefProps {
            app_state: &app_state,
            state_ref: &self.state_ref,
        })
    }

    fn changed(&mut self) {
        if let Some(effect) = self.change_effect.as_mut() {
            let app_state = self.latest.borrow().clone();
            effect(&app_state, &self.state_ref);
        }
    }
}
