use crate::context::RequestContext;
use crate::http::{Method, Response};
use crate::middleware::Middleware;

/// Answers cross-origin preflights and decorates responses with
/// `Access-Control-*` headers.
///
/// An `OPTIONS` request from an allowed origin is answered directly with
/// an empty `200` carrying the CORS headers; the handler never runs. All
/// other responses pick up the same headers in the after-phase when the
/// request's origin is allowed. Requests from origins outside the allow
/// list pass through untouched, so the browser's same-origin policy does
/// the actual blocking.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    allowed_origins: Vec<String>,
    allowed_methods: Vec<Method>,
    allowed_headers: Vec<String>,
    max_age_secs: u32,
}

impl CorsMiddleware {
    /// A permissive default: any origin, the common verbs, and the
    /// `Content-Type`/`Authorization` headers, cached for an hour.
    pub fn new() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                Method::Get,
                Method::Post,
                Method::Put,
                Method::Delete,
                Method::Options,
            ],
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            max_age_secs: 3600,
        }
    }

    /// Restrict the allowed origins. `"*"` anywhere in the list allows
    /// every origin.
    pub fn allow_origins(mut self, origins: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the advertised method list.
    pub fn allow_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allowed_methods = methods.into_iter().collect();
        self
    }

    /// Replace the advertised request-header list.
    pub fn allow_headers(mut self, headers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// How long browsers may cache the preflight result, in seconds.
    pub fn max_age_secs(mut self, max_age_secs: u32) -> Self {
        self.max_age_secs = max_age_secs;
        self
    }

    fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }

    fn origin_allowed(&self, origin: &str) -> bool {
        self.allows_any_origin() || self.allowed_origins.iter().any(|allowed| allowed == origin)
    }

    fn set_cors_headers(&self, origin: &str, response: &mut Response) {
        let allow_origin = if self.allows_any_origin() { "*" } else { origin };
        response.set_header("Access-Control-Allow-Origin", allow_origin);
        response.set_header(
            "Access-Control-Allow-Methods",
            self.allowed_methods
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        );
        response.set_header(
            "Access-Control-Allow-Headers",
            self.allowed_headers.join(", "),
        );
        response.set_header("Access-Control-Allow-Credentials", "true");
        response.set_header("Access-Control-Max-Age", self.max_age_secs.to_string());
    }
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for CorsMiddleware {
    fn before_request(&self, ctx: &mut RequestContext) -> Option<Response> {
        let origin = ctx.request().header("Origin")?.to_string();
        if ctx.request().method() == Method::Options && self.origin_allowed(&origin) {
            log::debug!("answering preflight from origin {origin:?}");
            let mut response = Response::ok();
            self.set_cors_headers(&origin, &mut response);
            return Some(response);
        }
        None
    }

    fn after_request(&self, ctx: &mut RequestContext, mut response: Response) -> Response {
        if let Some(origin) = ctx.request().header("Origin") {
            if self.origin_allowed(origin) {
                let origin = origin.to_string();
                self.set_cors_headers(&origin, &mut response);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;

    fn ctx(method: Method, origin: Option<&str>) -> RequestContext {
        let mut builder = Request::builder(method, "/api/items");
        if let Some(origin) = origin {
            builder = builder.header("Origin", origin);
        }
        RequestContext::new(builder.build())
    }

    #[test]
    fn preflights_from_allowed_origins_short_circuit() {
        let middleware = CorsMiddleware::new().allow_origins(["https://app.example"]);
        let mut ctx = ctx(Method::Options, Some("https://app.example"));

        let response = middleware
            .before_request(&mut ctx)
            .expect("preflight must be answered directly");
        assert_eq!(response.status_code(), 200);
        assert_eq!(
            response.header("Access-Control-Allow-Origin"),
            Some("https://app.example")
        );
        assert_eq!(
            response.header("Access-Control-Allow-Methods"),
            Some("GET, POST, PUT, DELETE, OPTIONS")
        );
        assert_eq!(response.header("Access-Control-Max-Age"), Some("3600"));
    }

    #[test]
    fn preflights_from_unknown_origins_fall_through() {
        let middleware = CorsMiddleware::new().allow_origins(["https://app.example"]);
        let mut ctx = ctx(Method::Options, Some("https://evil.example"));
        assert!(middleware.before_request(&mut ctx).is_none());

        // The after-phase adds nothing for a disallowed origin either.
        let response = middleware.after_request(&mut ctx, Response::ok());
        assert_eq!(response.header("Access-Control-Allow-Origin"), None);
    }

    #[test]
    fn wildcard_origins_advertise_a_wildcard() {
        let middleware = CorsMiddleware::new();
        let mut ctx = ctx(Method::Get, Some("https://anywhere.example"));

        assert!(middleware.before_request(&mut ctx).is_none());
        let response = middleware.after_request(&mut ctx, Response::ok());
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(
            response.header("Access-Control-Allow-Credentials"),
            Some("true")
        );
    }

    #[test]
    fn same_origin_requests_are_untouched() {
        let middleware = CorsMiddleware::new();
        let mut ctx = ctx(Method::Get, None);

        assert!(middleware.before_request(&mut ctx).is_none());
        let response = middleware.after_request(&mut ctx, Response::ok());
        assert_eq!(response.header("Access-Control-Allow-Origin"), None);
    }
}
