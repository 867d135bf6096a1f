//! Todo list fed by a mock server: entries arrive through a publisher
//! stream drained by the container's initial state effect.

mod actions;
mod server;
mod state;
mod view;

use futures::StreamExt;
use oneref_core::prelude::*;

use crate::server::MockTodoServerConfig;
use crate::state::TodoAppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = MockTodoServerConfig::default();
    let expected = config.entries.len();

    let rt = Runtime::new();
    let container = app_container(TodoAppState::default(), view::todo_list)
        .with_init_effect(move |_, _| {
            let entries = publisher_stream(|em| server::subscribe(config, em));
            Some(map_stream(entries, actions::create).boxed_local())
        })
        .with_change_effect(|st, _| {
            log::info!(
                "change effect: {} items, {} remaining",
                st.items.len(),
                st.remaining()
            );
        });
    let state_ref = container.state_ref().clone();
    let root = rt.mount(container);

    let sizes = publisher_stream(|em| {
        state_ref.subscribe(move |st: &TodoAppState| em.emit(st.items.len()));
    });
    rt.run_until(async {
        let mut sizes = sizes;
        while let Some(n) = sizes.next().await {
            println!("{}\n", rt.frame(root).unwrap_or_default());
            if n >= expected {
                break;
            }
        }
    });

    let first = state_ref.mutable_get().items.first().map(|it| it.id);
    if let Some(id) = first {
        state_ref.update(actions::toggle(id));
        rt.run_until_stalled();
        println!("{}\n", rt.frame(root).unwrap_or_default());
    }

    state_ref.update(actions::clear_completed());
    rt.run_until_stalled();
    println!("{}", rt.frame(root).unwrap_or_default());

    Ok(())
}
