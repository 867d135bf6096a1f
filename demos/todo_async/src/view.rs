use oneref_core::StateRefProps;

use crate::state::TodoAppState;

pub fn todo_list(props: StateRefProps<'_, TodoAppState>) -> String {
    let st = props.app_state;
    let mut out = String::from("todos\n");
    for item in &st.items {
        let mark = if item.complete { 'x' } else { ' ' };
        out.push_str(&format!("[{mark}] {}\n", item.text));
    }
    let left = st.remaining();
    out.push_str(&format!(
        "{left} {} left",
        if left == 1 { "item" } else { "items" }
    ));
    out
}
