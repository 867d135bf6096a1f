use oneref_core::StateTransformer;

use crate::state::TodoAppState;

pub fn create(text: String) -> StateTransformer<TodoAppState> {
    Box::new(move |st: &TodoAppState| st.add_item(text).0)
}

pub fn toggle(id: u32) -> StateTransformer<TodoAppState> {
    Box::new(move |st: &TodoAppState| st.toggle(id))
}

pub fn clear_completed() -> StateTransformer<TodoAppState> {
    Box::new(|st: &TodoAppState| st.clear_completed())
}
