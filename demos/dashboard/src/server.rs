//! Mock backend: a Sith directory answering with latency, and a feed of
//! Obi-Wan's location. Both run on their own threads and report through
//! emitters.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use oneref_core::Emitter;

use crate::protocol::{PlanetInfo, SithLink, SithStatus};

/// Handle to an in-flight request. Clones share the abort flag; equality is
/// identity.
#[derive(Clone)]
pub struct RequestHandle {
    sith_id: u32,
    aborted: Arc<AtomicBool>,
}

impl RequestHandle {
    pub fn new(sith_id: u32) -> Self {
        Self {
            sith_id,
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn sith_id(&self) -> u32 {
        self.sith_id
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }
}

impl PartialEq for RequestHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.aborted, &other.aborted)
    }
}

impl Eq for RequestHandle {}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("sith_id", &self.sith_id)
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub first_sith_id: u32,
    pub latency: Duration,
    pub obi_wan_interval: Duration,
    pub obi_wan_route: Vec<PlanetInfo>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let route = [
            (20, "Coruscant"),
            (21, "Alderaan"),
            (16, "Tatooine"),
            (22, "Kamino"),
            (23, "Dagobah"),
            (15, "Naboo"),
        ];
        Self {
            first_sith_id: 3616,
            latency: Duration::from_millis(300),
            obi_wan_interval: Duration::from_millis(1500),
            obi_wan_route: route
                .into_iter()
                .map(|(id, name)| PlanetInfo {
                    id,
                    name: name.into(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SithDirectory {
    records: HashMap<u32, SithStatus>,
}

impl SithDirectory {
    /// One lineage, listed master first.
    pub fn lineage(entries: &[(u32, &str, u32, &str)]) -> Self {
        let mut records = HashMap::new();
        for (i, &(id, name, world_id, world)) in entries.iter().enumerate() {
            let link = |j: Option<usize>| {
                Some(SithLink {
                    id: j.and_then(|j| entries.get(j)).map(|e| e.0),
                })
            };
            records.insert(
                id,
                SithStatus {
                    id,
                    name: name.into(),
                    homeworld: PlanetInfo {
                        id: world_id,
                        name: world.into(),
                    },
                    master: link(i.checked_sub(1)),
                    apprentice: link(Some(i + 1)),
                },
            );
        }
        Self { records }
    }

    pub fn standard() -> Self {
        Self::lineage(&[
            (5956, "Darth Bane", 11, "Apatros"),
            (2941, "Darth Zannah", 12, "Ambria"),
            (1121, "Darth Cognus", 13, "Ruusan"),
            (5105, "Darth Plagueis", 14, "Mygeeto"),
            (3616, "Darth Sidious", 15, "Naboo"),
            (1489, "Darth Vader", 16, "Tatooine"),
            (1330, "Darth Krayt", 17, "Korriban"),
            (2350, "Darth Caedus", 18, "Corellia"),
        ])
    }

    pub fn get(&self, id: u32) -> Option<&SithStatus> {
        self.records.get(&id)
    }
}

/// Answers each request on a fresh thread after `latency`, unless aborted
/// first. Responses are JSON strings pushed to a shared emitter.
#[derive(Clone, Debug)]
pub struct MockSithServer {
    directory: Arc<SithDirectory>,
    responses: Emitter<String>,
    latency: Duration,
}

impl MockSithServer {
    pub fn new(directory: Arc<SithDirectory>, responses: Emitter<String>, latency: Duration) -> Self {
        Self {
            directory,
            responses,
            latency,
        }
    }

    pub fn request(&self, sith_id: u32) -> RequestHandle {
        let handle = RequestHandle::new(sith_id);
        let (h, directory, responses, latency) = (
            handle.clone(),
            self.directory.clone(),
            self.responses.clone(),
            self.latency,
        );
        log::debug!("requesting sith {sith_id}");
        thread::spawn(move || {
            thread::sleep(latency);
            if h.is_aborted() {
                log::debug!("request for sith {sith_id} aborted");
                return;
            }
            match directory.get(sith_id).map(serde_json::to_string) {
                Some(Ok(json)) => responses.emit(json),
                Some(Err(e)) => log::error!("encoding sith {sith_id}: {e}"),
                None => log::warn!("no sith with id {sith_id}"),
            }
        });
        handle
    }
}

/// Walks `route`, emitting one location every `interval`. Stops early once
/// nobody is listening.
pub fn obi_wan_feed(route: Vec<PlanetInfo>, interval: Duration, out: Emitter<String>) {
    thread::spawn(move || {
        for planet in route {
            thread::sleep(interval);
            if !out.is_connected() {
                break;
            }
            match serde_json::to_string(&planet) {
                Ok(json) => out.emit(json),
                Err(e) => log::error!("encoding location {}: {e}", planet.name),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use futures::executor::block_on;
    use oneref_core::channel;

    #[test]
    fn lineage_links_neighbours() {
        let dir = SithDirectory::standard();
        let sidious = dir.get(3616).expect("sidious");
        assert_eq!(sidious.master_id(), Some(5105));
        assert_eq!(sidious.apprentice_id(), Some(1489));
        assert_eq!(dir.get(5956).and_then(|s| s.master_id()), None);
        assert_eq!(dir.get(2350).and_then(|s| s.apprentice_id()), None);
    }

    #[test]
    fn handle_equality_is_identity() {
        let a = RequestHandle::new(1);
        assert_eq!(a, a.clone());
        assert_ne!(a, RequestHandle::new(1));
        a.abort();
        assert!(a.clone().is_aborted());
    }

    #[test]
    fn answers_unless_aborted() {
        let (tx, rx) = channel::<String>();
        let server = MockSithServer::new(
            Arc::new(SithDirectory::standard()),
            tx,
            Duration::from_millis(50),
        );
        server.request(3616);
        server.request(1489).abort();
        drop(server);

        let got: Vec<String> = block_on(rx.collect());
        assert_eq!(got.len(), 1);
        assert!(got[0].contains("Darth Sidious"));
    }
}
