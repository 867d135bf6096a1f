//! Two todo lists in one application state, each edited through a focus.

mod state;

use oneref_core::prelude::*;

use crate::state::{MultiTodoAppState, TodoList, personal_focus, work_focus};

fn render_list(label: &str, list: &TodoList) -> String {
    let mut out = format!("{label} ({} left)\n", list.remaining());
    for item in &list.items {
        let mark = if item.complete { 'x' } else { ' ' };
        out.push_str(&format!("  [{mark}] {}\n", item.text));
    }
    out
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let rt = Runtime::new();
    let app = mk_ref(MultiTodoAppState::default());
    let app_root = rt.mount(ref_container(app.clone(), |p| {
        format!(
            "{}{}",
            render_list("work", &p.app_state.work),
            render_list("personal", &p.app_state.personal)
        )
    }));

    // The work editor gets its own cell and its own container.
    let (_, work) = work_focus().apply(&app);
    let work_root = rt.mount(ref_container(work.clone(), |p| {
        render_list("work editor", p.app_state)
    }));

    log::info!("mounted {app_root:?} (whole state) and {work_root:?} (work list)");

    work.update(|l| l.add("ship release"));
    work.update(|l| l.add("review PR"));

    let personal = personal_focus();
    let (_, set_personal) = personal.apply(&app.mutable_get(), &app.updater());
    set_personal.call(|l| l.add("call mom"));
    set_personal.call(|l| l.add("run"));
    rt.run_until_stalled();
    println!("{}", rt.frame(app_root).unwrap_or_default());
    println!("{}", rt.frame(work_root).unwrap_or_default());

    // Edits made on the whole state reach the work editor too.
    app.update(|s| MultiTodoAppState {
        work: s.work.complete(0),
        ..s.clone()
    });
    rt.run_until_stalled();
    println!("{}", rt.frame(app_root).unwrap_or_default());
    println!("{}", rt.frame(work_root).unwrap_or_default());

    Ok(())
}
