#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoItem {
    pub id: u32,
    pub text: String,
    pub complete: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoAppState {
    pub items: Vec<TodoItem>,
    next_id: u32,
}

impl TodoAppState {
    /// Appends a new, incomplete item. Returns the new state and its id.
    pub fn add_item(&self, text: impl Into<String>) -> (Self, u32) {
        let id = self.next_id;
        let mut items = self.items.clone();
        items.push(TodoItem {
            id,
            text: text.into(),
            complete: false,
        });
        (
            Self {
                items,
                next_id: id + 1,
            },
            id,
        )
    }

    pub fn toggle(&self, id: u32) -> Self {
        let items = self
            .items
            .iter()
            .map(|it| {
                if it.id == id {
                    TodoItem {
                        complete: !it.complete,
                        ..it.clone()
                    }
                } else {
                    it.clone()
                }
            })
            .collect();
        Self {
            items,
            ..self.clone()
        }
    }

    pub fn clear_completed(&self) -> Self {
        Self {
            items: self.items.iter().filter(|it| !it.complete).cloned().collect(),
            ..self.clone()
        }
    }

    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|it| !it.complete).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_allocated_in_order() {
        let (s, a) = TodoAppState::default().add_item("buy milk");
        let (s, b) = s.add_item("pay rent");
        assert_eq!((a, b), (0, 1));
        assert_eq!(s.remaining(), 2);
    }

    #[test]
    fn clear_completed_keeps_open_items() {
        let (s, a) = TodoAppState::default().add_item("buy milk");
        let (s, _) = s.add_item("pay rent");
        let s = s.toggle(a).clear_completed();
        assert_eq!(s.items.len(), 1);
        assert_eq!(s.items[0].text, "pay rent");
    }
}
