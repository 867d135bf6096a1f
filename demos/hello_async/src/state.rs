#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub id: u32,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HelloAppState {
    pub notifications: Vec<Notification>,
    next_id: u32,
}

impl HelloAppState {
    /// Shows `text` under a freshly allocated id.
    pub fn show(&self, text: impl Into<String>) -> (Self, u32) {
        let id = self.next_id;
        let mut notifications = self.notifications.clone();
        notifications.push(Notification {
            id,
            text: text.into(),
        });
        (
            Self {
                notifications,
                next_id: id + 1,
            },
            id,
        )
    }

    pub fn hide(&self, id: u32) -> Self {
        Self {
            notifications: self
                .notifications
                .iter()
                .filter(|n| n.id != id)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hide_removes_only_the_given_notification() {
        let (s, a) = HelloAppState::default().show("hello");
        let (s, b) = s.show("world");
        let s = s.hide(a);
        assert_eq!(s.notifications.len(), 1);
        assert_eq!(s.notifications[0].id, b);
        assert_eq!(s.hide(a), s);
    }
}
