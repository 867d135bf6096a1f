//! A simulated service posting todo entries on a timer.

use std::thread;
use std::time::Duration;

use oneref_core::Emitter;

#[derive(Clone, Debug)]
pub struct MockTodoServerConfig {
    pub interval: Duration,
    /// Posted last-first.
    pub entries: Vec<String>,
}

impl Default for MockTodoServerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            entries: ["buy milk", "call the doctor", "pay rent", "get wedding present"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Posts one entry per interval until the list is exhausted or the
/// subscriber goes away. Dropping the emitter at the end closes the feed.
pub fn subscribe(config: MockTodoServerConfig, listener: Emitter<String>) {
    let MockTodoServerConfig {
        interval,
        mut entries,
    } = config;
    thread::spawn(move || {
        while !entries.is_empty() {
            thread::sleep(interval);
            if !listener.is_connected() {
                log::debug!("mock todo server: subscriber gone");
                return;
            }
            if let Some(entry) = entries.pop() {
                log::info!("mock todo server: posting {entry:?}");
                listener.emit(entry);
            }
        }
    });
}
