//! Bridge from "register a callback, receive many events" sources to a
//! pull-based [`Stream`].
//!
//! The upstream receives an [`Emitter`] and pushes values into it whenever
//! it likes, from any thread. The consumer pulls from a [`PublisherStream`]
//! at its own pace. Values delivered while nobody is pulling wait in an
//! unbounded queue, so nothing is dropped or reordered.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use futures::Stream;
use futures::stream::{Map, StreamExt};
use parking_lot::Mutex;

struct Shared<T> {
    queue: VecDeque<T>,
    waker: Option<Waker>,
    emitters: usize,
    consumer_alive: bool,
}

/// The upstream side. Cloneable and `Send` when `T: Send`.
///
/// The stream ends once every emitter is dropped and the queue is empty.
pub struct Emitter<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T> Emitter<T> {
    /// Deliver `value` to the consumer, waking it if it is waiting.
    pub fn emit(&self, value: T) {
        let waker = {
            let mut shared = self.shared.lock();
            if !shared.consumer_alive {
                return;
            }
            shared.queue.push_back(value);
            shared.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// False once the consuming stream has been dropped.
    pub fn is_connected(&self) -> bool {
        self.shared.lock().consumer_alive
    }
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        self.shared.lock().emitters += 1;
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Drop for Emitter<T> {
    fn drop(&mut self) {
        let waker = {
            let mut shared = self.shared.lock();
            shared.emitters -= 1;
            if shared.emitters == 0 {
                shared.waker.take()
            } else {
                None
            }
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("Emitter")
            .field("queued", &shared.queue.len())
            .field("connected", &shared.consumer_alive)
            .finish()
    }
}

/// The consumer side: yields emitted values in delivery order.
///
/// Not restartable. To observe the source again from the start, subscribe
/// again.
pub struct PublisherStream<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T> Stream for PublisherStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let mut shared = self.shared.lock();
        if let Some(value) = shared.queue.pop_front() {
            return Poll::Ready(Some(value));
        }
        if shared.emitters == 0 {
            return Poll::Ready(None);
        }
        if shared
            .waker
            .as_ref()
            .is_none_or(|w| !w.will_wake(cx.waker()))
        {
            shared.waker = Some(cx.waker().clone());
        }
        Poll::Pending
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let shared = self.shared.lock();
        let queued = shared.queue.len();
        if shared.emitters == 0 {
            (queued, Some(queued))
        } else {
            (queued, None)
        }
    }
}

impl<T> Drop for PublisherStream<T> {
    fn drop(&mut self) {
        let mut shared = self.shared.lock();
        shared.consumer_alive = false;
        shared.queue.clear();
    }
}

impl<T> fmt::Debug for PublisherStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("PublisherStream")
            .field("queued", &shared.queue.len())
            .field("emitters", &shared.emitters)
            .finish()
    }
}

/// A connected emitter/stream pair.
pub fn channel<T>() -> (Emitter<T>, PublisherStream<T>) {
    let shared = Arc::new(Mutex::new(Shared {
        queue: VecDeque::new(),
        waker: None,
        emitters: 1,
        consumer_alive: true,
    }));
    (
        Emitter {
            shared: shared.clone(),
        },
        PublisherStream { shared },
    )
}

/// Subscribes to a callback-style publisher and returns the sequence of
/// values it delivers. `subscribe` is called immediately, exactly once.
pub fn publisher_stream<T>(subscribe: impl FnOnce(Emitter<T>)) -> PublisherStream<T> {
    let (emitter, stream) = channel();
    subscribe(emitter);
    stream
}

/// Transform each value of `src` through `f`, keeping order and laziness.
pub fn map_stream<S, B, F>(src: S, f: F) -> Map<S, F>
where
    S: Stream,
    F: FnMut(S::Item) -> B,
{
    src.map(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::thread;

    #[test]
    fn delivers_values_emitted_before_first_pull() {
        let stream = publisher_stream(|em| {
            em.emit("e1");
            em.emit("e2");
            em.emit("e3");
        });
        let got: Vec<_> = block_on(stream.collect());
        assert_eq!(got, vec!["e1", "e2", "e3"]);
    }

    #[test]
    fn keeps_order_across_threads() {
        let stream = publisher_stream(|em: Emitter<u32>| {
            thread::spawn(move || {
                for i in 0..100 {
                    em.emit(i);
                }
            });
        });
        let got: Vec<_> = block_on(stream.collect());
        assert_eq!(got, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn stream_stays_open_while_an_emitter_lives() {
        let (em, mut stream) = channel();
        let second = em.clone();
        drop(em);
        second.emit(7);
        assert_eq!(block_on(stream.next()), Some(7));
        assert_eq!(stream.size_hint(), (0, None));
        drop(second);
        assert_eq!(block_on(stream.next()), None);
    }

    #[test]
    fn emitter_notices_dropped_consumer() {
        let (em, stream) = channel::<u8>();
        assert!(em.is_connected());
        drop(stream);
        assert!(!em.is_connected());
        em.emit(1);
    }

    #[test]
    fn map_preserves_order() {
        let src = publisher_stream(|em| {
            for i in 1..=3 {
                em.emit(i);
            }
        });
        let got: Vec<_> = block_on(map_stream(src, |i| i * 10).collect());
        assert_eq!(got, vec![10, 20, 30]);
    }
}
