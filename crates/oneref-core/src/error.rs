use std::any::Any;

use thiserror::Error;

/// Failure of an awaitable update.
///
/// Plain `update` calls never fail; only the future returned by
/// `update_async` has an error channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// The transformation panicked. State was left unchanged.
    #[error("state transformation panicked: {0}")]
    Panicked(String),
    /// The cell was dropped before the queued transformation ran.
    #[error("state cell dropped before the update was applied")]
    Canceled,
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}
