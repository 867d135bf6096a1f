use oneref_core::{Focus, FocusSetter, focus, mk_focus};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoItem {
    pub id: u32,
    pub text: String,
    pub complete: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoList {
    pub items: Vec<TodoItem>,
    next_id: u32,
}

impl TodoList {
    pub fn add(&self, text: impl Into<String>) -> Self {
        let mut items = self.items.clone();
        items.push(TodoItem {
            id: self.next_id,
            text: text.into(),
            complete: false,
        });
        Self {
            items,
            next_id: self.next_id + 1,
        }
    }

    pub fn complete(&self, id: u32) -> Self {
        let items = self
            .items
            .iter()
            .map(|it| TodoItem {
                complete: it.complete || it.id == id,
                ..it.clone()
            })
            .collect();
        Self {
            items,
            ..self.clone()
        }
    }

    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|it| !it.complete).count()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultiTodoAppState {
    pub work: TodoList,
    pub personal: TodoList,
}

/// Cell-based focus on the work list.
pub fn work_focus() -> Focus<MultiTodoAppState, TodoList> {
    focus(
        |s: &MultiTodoAppState| s.work.clone(),
        |s: &MultiTodoAppState, work| MultiTodoAppState {
            work,
            ..s.clone()
        },
    )
}

/// Setter-based focus on the personal list.
pub fn personal_focus() -> FocusSetter<MultiTodoAppState, TodoList> {
    mk_focus(
        |s: &MultiTodoAppState| s.personal.clone(),
        |s: &MultiTodoAppState, personal| MultiTodoAppState {
            personal,
            ..s.clone()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use oneref_core::StateRef;

    fn sample() -> MultiTodoAppState {
        MultiTodoAppState {
            work: TodoList::default().add("ship release"),
            personal: TodoList::default().add("call mom").add("run"),
        }
    }

    #[test]
    fn work_focus_round_trips() {
        let s = sample();
        let f = work_focus();
        assert_eq!(f.inject(&s, f.project(&s)), s);
    }

    #[test]
    fn work_updates_leave_personal_untouched() {
        let outer = StateRef::new(sample());
        let (prior, work) = work_focus().apply(&outer);
        work.update(|l| l.add("write tests"));

        let now = outer.mutable_get();
        assert_eq!(now.work, prior.add("write tests"));
        assert_eq!(now.personal, sample().personal);
    }

    #[test]
    fn personal_setter_updates_outer() {
        let outer = StateRef::new(sample());
        let (personal, set_personal) = personal_focus().apply(&outer.mutable_get(), &outer.updater());
        assert_eq!(personal.items.len(), 2);

        set_personal.call(|l| l.complete(0));
        assert_eq!(outer.mutable_get().personal.remaining(), 1);
    }
}
