pub use crate::cell::{
    AsyncUpdate, ListenerId, StateChangeListener, StateRef, StateTransformer, StateUpdater,
    WeakStateRef, add_state_change_listener, mk_ref, mutable_get, remove_state_change_listener,
    update, update_async, update_async_,
};
pub use crate::container::{
    Container, InitialStateEffect, StateChangeEffect, StateRefProps, TransformerStream,
    app_container, ref_container,
};
pub use crate::effects::{Dispose, effect, listener_guard, on_unmount};
pub use crate::error::UpdateError;
pub use crate::focus::{Focus, FocusSetter, focus, mk_focus};
pub use crate::publisher::{Emitter, PublisherStream, channel, map_stream, publisher_stream};
pub use crate::runtime::{RootId, Runtime, RuntimeConfig};
pub use crate::scope::{Scope, current_scope, scoped_effect};
pub use crate::utils::{Delay, delay, update_from_stream};
