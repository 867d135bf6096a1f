use oneref_core::StateRefProps;

use crate::state::{DashboardAppState, SithRow};

fn row_line(st: &DashboardAppState, row: Option<&SithRow>) -> String {
    let Some(r) = row else {
        return "  ".to_string();
    };
    match &r.info {
        None => format!("  (loading #{})", r.id),
        Some(info) => {
            let mark = if st.is_match(r) { '*' } else { ' ' };
            format!("{mark} {:<18} Homeworld: {}", info.name, info.homeworld.name)
        }
    }
}

fn button(label: &str, enabled: bool) -> String {
    if enabled {
        format!("[{label}]")
    } else {
        format!("[{}]", "-".repeat(label.len()))
    }
}

pub fn render(st: &DashboardAppState) -> String {
    let location = st
        .obi_wan_location
        .as_ref()
        .map_or("unknown", |p| p.name.as_str());
    let mut lines = vec![format!("Obi-Wan currently on {location}")];
    lines.extend(st.sith_list.iter().map(|r| row_line(st, r.as_ref())));
    lines.push(format!(
        "{} {}",
        button("up", st.can_scroll_up()),
        button("down", st.can_scroll_down())
    ));
    lines.join("\n")
}

pub fn dashboard(props: StateRefProps<'_, DashboardAppState>) -> String {
    render(props.app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PlanetInfo;
    use crate::server::{RequestHandle, SithDirectory};

    #[test]
    fn empty_dashboard() {
        let out = render(&DashboardAppState::default());
        assert!(out.starts_with("Obi-Wan currently on unknown"));
        assert!(out.ends_with("[--] [----]"));
    }

    #[test]
    fn highlights_sith_on_obi_wans_planet() {
        let dir = SithDirectory::standard();
        let vader = dir.get(1489).cloned().expect("vader");
        let st = DashboardAppState::default()
            .add_pending_request(true, 1489, RequestHandle::new(1489))
            .update_sith_status(vader)
            .add_pending_request(true, 1330, RequestHandle::new(1330));
        let st = DashboardAppState {
            obi_wan_location: Some(PlanetInfo {
                id: 16,
                name: "Tatooine".into(),
            }),
            ..st
        };
        let out = render(&st);
        assert!(out.contains("* Darth Vader"));
        assert!(out.contains("(loading #1330)"));
    }
}
