use crate::context::RequestContext;
use crate::http::Response;
use crate::middleware::Middleware;

/// Logs one line per request with method, path, status and elapsed time.
///
/// Register it first so the elapsed time covers the rest of the chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    /// A logging middleware. It carries no state.
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for LoggingMiddleware {
    fn before_request(&self, ctx: &mut RequestContext) -> Option<Response> {
        log::debug!("--> {} {}", ctx.request().method(), ctx.request().path());
        None
    }

    fn after_request(&self, ctx: &mut RequestContext, response: Response) -> Response {
        log::info!(
            "{} {} -> {} ({:?})",
            ctx.request().method(),
            ctx.request().path(),
            response.status_code(),
            ctx.started_at().elapsed()
        );
        response
    }
}
