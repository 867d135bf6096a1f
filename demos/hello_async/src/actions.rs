use std::time::Duration;

use oneref_core::{StateRef, UpdateError, delay};

use crate::state::HelloAppState;

/// Shows `text`, waits for `timeout`, then hides exactly that notification.
pub async fn show_notification_with_timeout(
    state_ref: StateRef<HelloAppState>,
    text: String,
    timeout: Duration,
) -> Result<(), UpdateError> {
    let (_, id) = state_ref.update_async(move |st| st.show(text)).await?;
    log::debug!("notification {id} shown");
    delay(timeout).await;
    state_ref.update(move |st| st.hide(id));
    log::debug!("notification {id} hidden");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn notification_is_gone_after_timeout() {
        let state_ref = StateRef::new(HelloAppState::default());
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            state_ref.subscribe(move |st: &HelloAppState| seen.borrow_mut().push(st.notifications.len()));
        }
        block_on(show_notification_with_timeout(
            state_ref.clone(),
            "hi".into(),
            Duration::from_millis(10),
        ))
        .expect("updates applied");
        assert_eq!(*seen.borrow(), vec![1, 0]);
    }
}
