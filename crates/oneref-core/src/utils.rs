use std::future::Future;
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::thread;
use std::time::Duration;

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use web_time::Instant;

use crate::cell::{StateRef, StateTransformer};

#[derive(Default)]
struct DelayState {
    done: bool,
    waker: Option<Waker>,
}

/// Future returned by [`delay`].
pub struct Delay {
    state: Arc<Mutex<DelayState>>,
    deadline: Instant,
}

impl std::fmt::Debug for Delay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delay")
            .field("deadline", &self.deadline)
            .field("done", &self.state.lock().done)
            .finish()
    }
}

/// Completes once `wait` has elapsed. The timer starts at call time.
pub fn delay(wait: Duration) -> Delay {
    let deadline = Instant::now() + wait;
    let state = Arc::new(Mutex::new(DelayState::default()));
    if wait.is_zero() {
        state.lock().done = true;
    } else {
        let timer = state.clone();
        thread::spawn(move || {
            thread::sleep(deadline.saturating_duration_since(Instant::now()));
            let waker = {
                let mut st = timer.lock();
                st.done = true;
                st.waker.take()
            };
            if let Some(w) = waker {
                w.wake();
            }
        });
    }
    Delay { state, deadline }
}

impl Future for Delay {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut st = self.state.lock();
        if st.done {
            return Poll::Ready(());
        }
        st.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

/// Apply every transformation yielded by `stream` to `state_ref`, in
/// order, until the stream ends.
pub async fn update_from_stream<T, S>(state_ref: StateRef<T>, stream: S)
where
    T: Clone + 'static,
    S: Stream<Item = StateTransformer<T>>,
{
    let mut stream = pin!(stream);
    let mut applied = 0usize;
    while let Some(tf) = stream.next().await {
        state_ref.update(tf);
        applied += 1;
    }
    log::debug!("update_from_stream: source ended after {applied} updates");
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn delay_waits_at_least_the_duration() {
        let start = Instant::now();
        pollster::block_on(delay(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn zero_delay_is_ready_immediately() {
        pollster::block_on(delay(Duration::ZERO));
    }

    #[test]
    fn stream_transformations_fold_in_order() {
        let cell = StateRef::new(String::new());
        let steps: Vec<StateTransformer<String>> = vec![
            Box::new(|s: &String| format!("{s}a")),
            Box::new(|s: &String| format!("{s}b")),
            Box::new(|s: &String| format!("{s}c")),
        ];
        pollster::block_on(update_from_stream(cell.clone(), stream::iter(steps)));
        assert_eq!(cell.mutable_get(), "abc");
    }
}
