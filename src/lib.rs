//! Synchronous request pipeline with routing, middleware, signed sessions
//! and an undoable session store.
//!
//! This crate is the processing core of a small web framework: an embedding
//! server turns bytes into a [`Request`], hands it to [`App::handle`], and
//! writes the returned [`Response`] back out. Everything in between
//! (route matching with typed path parameters, a middleware chain that can
//! short-circuit, lifecycle hooks, session lookup with signed cookie ids,
//! CSRF checks and the authentication state machine) happens inside this
//! crate, with no I/O of its own.
//!
//! # Request-scoped state
//!
//! There are no globals. Everything middlewares, hooks and handlers share
//! travels through a [`RequestContext`] passed explicitly into each phase.
//!
//! # Session history
//!
//! The [`SessionStore`] snapshots the whole session collection on every
//! write, so the state it serves can be stepped backwards and forwards
//! with [`SessionStore::undo`] and [`SessionStore::redo`]. The oldest
//! snapshot is sticky; undoing past it is a no-op.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use turnstile::{App, Config, Method, PathParams, Request, RequestContext, Response};
//!
//! # fn main() -> turnstile::Result {
//! let mut app = App::new(Config::default());
//! app.add_route("/greet/<name>", [Method::Get], || {
//!     Arc::new(|_ctx: &mut RequestContext, params: &PathParams| {
//!         Ok(Response::text(200, format!("Hello, {}!", params["name"])))
//!     })
//! })?;
//!
//! let response = app.handle(Request::builder(Method::Get, "/greet/Ada").build());
//! assert_eq!(response.status_code(), 200);
//! assert_eq!(response.body_bytes(), b"Hello, Ada!");
//! # Ok(()) }
//! ```

#![forbid(unsafe_code)]
#![deny(
    future_incompatible,
    missing_debug_implementations,
    nonstandard_style,
    missing_docs,
    unreachable_pub,
    missing_copy_implementations,
    unused_qualifications
)]

mod auth;
mod config;
mod context;
mod error;
mod hooks;
mod http;
mod middleware;
mod pipeline;
mod routing;
mod session;
mod signing;

pub use auth::{AuthContext, AuthState, AuthUser};
pub use config::Config;
pub use context::RequestContext;
pub use error::Error;
pub use hooks::Hooks;
pub use http::{Method, Request, RequestBuilder, Response};
pub use middleware::{
    AuthenticationMiddleware, CorsMiddleware, CredentialCheck, CsrfMiddleware, LoggingMiddleware,
    Middleware, SessionMiddleware, XssProtectionMiddleware,
};
pub use pipeline::App;
pub use routing::{Handler, PathParams, PathPattern, Route, Router, View, ViewHandler};
pub use session::{Session, SessionCaretaker, SessionMemento, SessionStore};
pub use signing::Signer;

/// A result with this crate's assembly [`Error`] and a default value type
/// of `()`.
pub type Result<T = ()> = std::result::Result<T, Error>;
