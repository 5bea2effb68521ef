//! Route templates, the router, and the handler contract.

mod handler;
mod pattern;
mod router;

pub use handler::{Handler, View, ViewHandler};
pub use pattern::{PathParams, PathPattern};
pub use router::{Route, Router};
