//! The middleware chain and the built-in middlewares.
//!
//! Middlewares run in registration order in BOTH phases: the one
//! registered first sees the request first on the way in and the response
//! first on the way out. This is a deliberate simplification versus the
//! usual onion ordering, and handlers rely on it: e.g. the session
//! middleware must run before the authentication middleware in both
//! phases. Do not "fix" it to a reversed after-phase.

mod authentication;
mod cors;
mod csrf;
mod logging;
mod session;
mod xss;

pub use authentication::{AuthenticationMiddleware, CredentialCheck};
pub use cors::CorsMiddleware;
pub use csrf::CsrfMiddleware;
pub use logging::LoggingMiddleware;
pub use session::SessionMiddleware;
pub use xss::XssProtectionMiddleware;

use crate::context::RequestContext;
use crate::http::Response;
use std::sync::Arc;

/// An interceptor around a matched handler.
///
/// One middleware instance is constructed once and shared across all
/// concurrent requests, so implementations keep any mutable state behind
/// interior synchronization.
pub trait Middleware: Send + Sync {
    /// Process the request before it reaches the handler.
    ///
    /// Returning a response short-circuits: the handler and every later
    /// middleware's before-phase are skipped, but the after-phase still
    /// runs for the whole chain.
    fn before_request(&self, ctx: &mut RequestContext) -> Option<Response> {
        let _ = ctx;
        None
    }

    /// Process the response after the handler (or a short-circuit)
    /// produced it. May rewrite the response wholesale.
    fn after_request(&self, ctx: &mut RequestContext, response: Response) -> Response {
        let _ = ctx;
        response
    }
}

/// Registering an `Arc<M>` lets the caller keep a handle to the middleware
/// after handing it to the chain, e.g. to call
/// [`AuthenticationMiddleware::unlock`] while the application is serving.
impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn before_request(&self, ctx: &mut RequestContext) -> Option<Response> {
        (**self).before_request(ctx)
    }

    fn after_request(&self, ctx: &mut RequestContext, response: Response) -> Response {
        (**self).after_request(ctx, response)
    }
}
