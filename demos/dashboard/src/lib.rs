//! A dark-jedi dashboard: a scrolling window onto a Sith lineage, loaded
//! row by row from a slow backend, that freezes whenever Obi-Wan lands on a
//! visible Sith's homeworld.

pub mod actions;
pub mod protocol;
pub mod server;
pub mod state;
pub mod view;
