use futures::StreamExt;
use futures::future;
use oneref_core::{PublisherStream, StateRef, StateTransformer, TransformerStream};

use crate::protocol::{PlanetInfo, SithStatus, parse_planet, parse_sith_status};
use crate::server::MockSithServer;
use crate::state::DashboardAppState;

pub fn sith_status_received(status: SithStatus) -> StateTransformer<DashboardAppState> {
    Box::new(move |st| st.update_sith_status(status))
}

pub fn obi_wan_moved(location: PlanetInfo) -> StateTransformer<DashboardAppState> {
    Box::new(move |st| st.update_obi_wan(location))
}

/// Turns the raw JSON feeds into one stream of transformations. Payloads
/// that fail to parse are logged and skipped.
pub fn incoming(
    responses: PublisherStream<String>,
    locations: PublisherStream<String>,
) -> TransformerStream<DashboardAppState> {
    let statuses = responses.filter_map(|json| {
        future::ready(match parse_sith_status(&json) {
            Ok(status) => Some(sith_status_received(status)),
            Err(e) => {
                log::error!("{e:#}");
                None
            }
        })
    });
    let moves = locations.filter_map(|json| {
        future::ready(match parse_planet(&json) {
            Ok(location) => Some(obi_wan_moved(location)),
            Err(e) => {
                log::error!("{e:#}");
                None
            }
        })
    });
    futures::stream::select(statuses, moves).boxed_local()
}

pub fn request_sith_info(
    server: &MockSithServer,
    state_ref: &StateRef<DashboardAppState>,
    append: bool,
    sith_id: u32,
) {
    let request = server.request(sith_id);
    state_ref.update(move |st| st.add_pending_request(append, sith_id, request));
}

/// Requests the next missing neighbour, apprentices first. Does nothing
/// while Obi-Wan shares a planet with a visible Sith.
pub fn fill_view(
    server: &MockSithServer,
    st: &DashboardAppState,
    state_ref: &StateRef<DashboardAppState>,
) {
    if st.matching_sith() {
        return;
    }
    let last = st.last_known_sith();
    if st.needs_apprentice(last.as_ref()) {
        if let Some(id) = last.and_then(|r| r.info.apprentice_id) {
            request_sith_info(server, state_ref, true, id);
        }
        return;
    }
    let first = st.first_known_sith();
    if st.needs_master(first.as_ref()) {
        if let Some(id) = first.and_then(|r| r.info.master_id) {
            request_sith_info(server, state_ref, false, id);
        }
    }
}

/// Runs after every render: aborts abandoned requests, then tops up the view.
pub fn on_state_change(
    server: &MockSithServer,
    st: &DashboardAppState,
    state_ref: &StateRef<DashboardAppState>,
) {
    if !st.old_requests.is_empty() {
        let stale = st.old_requests.clone();
        for request in &stale {
            request.abort();
        }
        log::debug!("aborted {} stale requests", stale.len());
        state_ref.update(move |s| s.forget_requests(&stale));
    }
    fill_view(server, st, state_ref);
}

/// Scrolls by `delta` rows when the buttons would allow it.
pub fn scroll(state_ref: &StateRef<DashboardAppState>, delta: i32) -> bool {
    let st = state_ref.mutable_get();
    let allowed = if delta < 0 {
        st.can_scroll_up()
    } else {
        st.can_scroll_down()
    };
    if allowed {
        state_ref.update(move |s| s.scroll_adjust(delta));
    } else {
        log::info!("scroll by {delta} ignored");
    }
    allowed
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures::executor::block_on;
    use oneref_core::{channel, update_from_stream};

    use super::*;
    use crate::server::SithDirectory;

    #[test]
    fn malformed_payloads_are_skipped() {
        let (tx, responses) = channel::<String>();
        let (loc_tx, locations) = channel::<String>();
        tx.emit("nonsense".into());
        loc_tx.emit(r#"{"id": 16, "name": "Tatooine"}"#.into());
        drop((tx, loc_tx));

        let state_ref = StateRef::new(DashboardAppState::default());
        block_on(update_from_stream(state_ref.clone(), incoming(responses, locations)));
        assert_eq!(
            state_ref.mutable_get().obi_wan_location.map(|p| p.name),
            Some("Tatooine".to_string())
        );
    }

    #[test]
    fn fill_view_asks_for_the_apprentice() {
        let (tx, _rx) = channel::<String>();
        let server = MockSithServer::new(Arc::new(SithDirectory::standard()), tx, Duration::ZERO);
        let state_ref = StateRef::new(DashboardAppState::default());
        request_sith_info(&server, &state_ref, true, 3616);
        let sidious = SithDirectory::standard().get(3616).cloned().expect("sidious");
        state_ref.update(move |st| st.update_sith_status(sidious));

        fill_view(&server, &state_ref.mutable_get(), &state_ref);
        let st = state_ref.mutable_get();
        assert_eq!(st.sith_list[1].as_ref().map(|r| r.id), Some(1489));
        assert_eq!(st.pending_rows(), 1);
    }

    #[test]
    fn change_effect_aborts_and_forgets_stale_requests() {
        let (tx, _rx) = channel::<String>();
        let server = MockSithServer::new(Arc::new(SithDirectory::standard()), tx, Duration::ZERO);
        let stale = server.request(2350);
        let state_ref = StateRef::new(DashboardAppState {
            old_requests: vec![stale.clone()],
            ..Default::default()
        });

        on_state_change(&server, &state_ref.mutable_get(), &state_ref);
        assert!(stale.is_aborted());
        assert!(state_ref.mutable_get().old_requests.is_empty());
    }

    #[test]
    fn scroll_respects_button_state() {
        let state_ref = StateRef::new(DashboardAppState::default());
        assert!(!scroll(&state_ref, 2));
        assert!(!scroll(&state_ref, -2));
    }
}
