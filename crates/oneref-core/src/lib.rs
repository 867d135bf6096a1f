//! # Cells, Listeners, Focus, and Containers
//!
//! oneref keeps the whole state of an application in a single mutable
//! reference cell and treats every change as a pure transformation of that
//! state. There are four main pieces:
//!
//! - `StateRef<T>`: the cell, with change listeners.
//! - `Focus`: derived cells for sub-trees of the state.
//! - `publisher_stream`: callback-style event sources as `Stream`s.
//! - `Container` / `Runtime`: re-render a view whenever its cell changes.
//!
//! ## Cells
//!
//! A `StateRef<T>` is a cloneable handle to one cell. State only changes
//! through transformations:
//!
//! ```rust
//! use oneref_core::*;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Counter { count: u32 }
//!
//! let cell = mk_ref(Counter { count: 0 });
//! cell.update(|s| Counter { count: s.count + 1 });
//! cell.update(|s| Counter { count: s.count + 1 });
//! assert_eq!(cell.mutable_get(), Counter { count: 2 });
//! ```
//!
//! Listeners run synchronously, in registration order, after each update.
//! An update issued while a cell is busy (from inside a transformation or a
//! listener) is queued and applied when the current pass finishes.
//!
//! `update_async` additionally returns a value computed by the same
//! transformation, e.g. a freshly allocated id:
//!
//! ```rust
//! use oneref_core::*;
//!
//! let ids = mk_ref(Vec::<u32>::new());
//! let pending = ids.update_async(|v| {
//!     let id = v.len() as u32;
//!     let mut next = v.clone();
//!     next.push(id);
//!     (next, id)
//! });
//! let (state, id) = futures::executor::block_on(pending).unwrap();
//! assert_eq!((state, id), (vec![0], 0));
//! ```
//!
//! ## Focus
//!
//! ```rust
//! use oneref_core::*;
//!
//! #[derive(Clone)]
//! struct App { title: String, clicks: u32 }
//!
//! let app = mk_ref(App { title: "demo".into(), clicks: 0 });
//! let clicks = focus(|a: &App| a.clicks, |a: &App, clicks| App { clicks, ..a.clone() });
//! let (_, clicks_ref) = clicks.apply(&app);
//! clicks_ref.update(|c| c + 1);
//! assert_eq!(app.mutable_get().clicks, 1);
//! ```
//!
//! ## Containers
//!
//! ```rust
//! use oneref_core::*;
//!
//! let rt = Runtime::new();
//! let container = app_container(0u32, |p| format!("count: {}", p.app_state));
//! let cell = container.state_ref().clone();
//! let root = rt.mount(container);
//!
//! cell.update(|n| n + 1);
//! rt.run_until_stalled();
//! assert_eq!(rt.frame(root).as_deref(), Some("count: 1"));
//! ```
//!
//! External events enter through `publisher_stream`: the upstream gets an
//! `Emitter`, the container's initial state effect maps the resulting
//! stream into transformations, and the runtime applies them as they
//! arrive.

pub mod cell;
pub mod container;
pub mod effects;
pub mod error;
pub mod focus;
pub mod prelude;
pub mod publisher;
pub mod runtime;
pub mod scope;
pub mod utils;

pub use prelude::*;
