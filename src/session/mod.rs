//! Sessions, their undo/redo history, and the store that owns them.

mod memento;
mod session;
mod store;

pub use memento::{SessionCaretaker, SessionMemento};
pub use session::Session;
pub use store::SessionStore;
