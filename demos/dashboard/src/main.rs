use std::sync::Arc;
use std::time::Duration;

use dashboard::actions;
use dashboard::server::{DashboardConfig, MockSithServer, SithDirectory, obi_wan_feed};
use dashboard::state::{DashboardAppState, SCROLL_ROWS};
use dashboard::view;
use oneref_core::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::default();
    let rt = Runtime::new();

    let (responses_tx, responses) = channel::<String>();
    let server = MockSithServer::new(
        Arc::new(SithDirectory::standard()),
        responses_tx,
        config.latency,
    );

    let container = app_container(DashboardAppState::default(), view::dashboard)
        .with_init_effect({
            let server = server.clone();
            let DashboardConfig {
                first_sith_id,
                obi_wan_interval,
                obi_wan_route,
                ..
            } = config.clone();
            move |_, state_ref| {
                let locations =
                    publisher_stream(|out| obi_wan_feed(obi_wan_route, obi_wan_interval, out));
                actions::request_sith_info(&server, state_ref, true, first_sith_id);
                Some(actions::incoming(responses, locations))
            }
        })
        .with_change_effect(move |st, state_ref| actions::on_state_change(&server, st, state_ref));
    let state_ref = container.state_ref().clone();
    let root = rt.mount(container);

    let show = |label: &str| {
        println!("-- {label}\n{}\n", rt.frame(root).unwrap_or_default());
    };

    let step = Duration::from_millis(2000);
    rt.run_until(delay(step));
    show("lineage loaded");

    actions::scroll(&state_ref, -(SCROLL_ROWS as i32));
    rt.run_until(delay(step));
    show("scrolled up");

    actions::scroll(&state_ref, SCROLL_ROWS as i32);
    rt.run_until(delay(step));
    show("scrolled down");

    let route_time = config.obi_wan_interval * config.obi_wan_route.len() as u32;
    rt.run_until(delay(route_time.saturating_sub(step * 3)));
    show("obi-wan done travelling");

    log::info!("{} renders", rt.render_count(root).unwrap_or(0));
    rt.unmount(root);
    Ok(())
}
