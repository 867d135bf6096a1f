//! Notifications with generated ids that hide themselves after a timeout.

mod actions;
mod state;

use std::time::Duration;

use oneref_core::prelude::*;

use crate::state::HelloAppState;

const NOTIFICATION_TIMEOUT: Duration = Duration::from_millis(5000);
const SECOND_CLICK_AFTER: Duration = Duration::from_millis(1500);

fn render(st: &HelloAppState) -> String {
    if st.notifications.is_empty() {
        return "(no notifications)".to_string();
    }
    st.notifications
        .iter()
        .map(|n| format!("#{}: {}", n.id, n.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let rt = Runtime::new();
    let container = app_container(HelloAppState::default(), |p| render(p.app_state))
        .with_change_effect(|st, _| println!("{}\n", render(st)));
    let state_ref = container.state_ref().clone();
    let root = rt.mount(container);
    println!("{}\n", rt.frame(root).unwrap_or_default());

    let first =
        actions::show_notification_with_timeout(state_ref.clone(), "Hello".into(), NOTIFICATION_TIMEOUT);
    let second = {
        let state_ref = state_ref.clone();
        async move {
            delay(SECOND_CLICK_AFTER).await;
            actions::show_notification_with_timeout(state_ref, "World".into(), NOTIFICATION_TIMEOUT)
                .await
        }
    };

    let (a, b) = rt.run_until(futures::future::join(first, second));
    a?;
    b?;
    Ok(())
}
