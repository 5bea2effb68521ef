//! The composition root tying routing, middleware and hooks together.

use crate::config::Config;
use crate::context::RequestContext;
use crate::hooks::Hooks;
use crate::http::{Method, Request, Response};
use crate::middleware::Middleware;
use crate::routing::{Handler, Router};
use crate::signing::Signer;
use crate::Result;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// An application: a router, a middleware chain and hook registries,
/// driven by [`handle`](App::handle).
///
/// Registration happens at startup through `&mut self` methods; serving
/// happens through `&self`, so a built `App` can be shared across threads.
/// `handle` always returns a response. Handler faults become `500`s at
/// this boundary and never cross it as panics or errors.
pub struct App {
    config: Config,
    signer: Signer,
    router: Router,
    middlewares: Vec<Box<dyn Middleware>>,
    hooks: Hooks,
}

impl App {
    /// Build an application from a configuration.
    ///
    /// Without a configured secret key a random one is drawn, which means
    /// signed session ids will not survive a process restart.
    pub fn new(config: Config) -> Self {
        let signer = match &config.secret_key {
            Some(secret) => Signer::new(secret),
            None => {
                log::warn!(
                    "no secret_key configured, using a random signing key; \
                     sessions will not survive a restart"
                );
                Signer::random(&mut rand::thread_rng())
            }
        };
        Self {
            config,
            signer,
            router: Router::new(),
            middlewares: Vec::new(),
            hooks: Hooks::new(),
        }
    }

    /// The configuration this application was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The signer derived from the configured secret.
    ///
    /// Hand a clone to everything that signs or verifies identifiers; the
    /// session store and the CSRF middleware must use the same signer or
    /// no token will ever verify.
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Register a route. See [`Router::add_route`].
    pub fn add_route(
        &mut self,
        pattern: &str,
        methods: impl IntoIterator<Item = Method>,
        factory: impl Fn() -> Arc<dyn Handler> + Send + Sync + 'static,
    ) -> Result<()> {
        self.router.add_route(pattern, methods, factory)
    }

    /// Append a middleware to the chain. Both phases run in registration
    /// order.
    pub fn use_middleware(&mut self, middleware: impl Middleware + 'static) {
        self.middlewares.push(Box::new(middleware));
    }

    /// Register a hook that runs once, before the first request only.
    pub fn before_first_request(
        &mut self,
        hook: impl Fn(&mut RequestContext) + Send + Sync + 'static,
    ) {
        self.hooks.add_before_first_request(hook);
    }

    /// Register a hook that runs before every request.
    pub fn before_request(&mut self, hook: impl Fn(&mut RequestContext) + Send + Sync + 'static) {
        self.hooks.add_before_request(hook);
    }

    /// Register a hook that runs after every request and may rewrite the
    /// response.
    pub fn after_request(
        &mut self,
        hook: impl Fn(&mut RequestContext, &mut Response) + Send + Sync + 'static,
    ) {
        self.hooks.add_after_request(hook);
    }

    /// Register a best-effort teardown hook. Its faults are logged and
    /// never reach the client.
    pub fn teardown_request(
        &mut self,
        hook: impl Fn(&RequestContext) -> anyhow::Result<()> + Send + Sync + 'static,
    ) {
        self.hooks.add_teardown_request(hook);
    }

    /// Force-construct every route handler now instead of on first match.
    pub fn warm_up(&self) {
        self.router.warm_up();
    }

    /// Run a request through the full pipeline and produce its response.
    ///
    /// Phases, in order: one-shot before-first hooks, before hooks, each
    /// middleware's before-phase (a `Some` response short-circuits the
    /// handler and the remaining before-phases), dispatch, EVERY
    /// middleware's after-phase in registration order, after hooks,
    /// teardown hooks.
    pub fn handle(&self, request: Request) -> Response {
        let mut ctx = RequestContext::new(request);

        self.hooks.run_before_first(&mut ctx);
        self.hooks.run_before(&mut ctx);

        let mut short_circuit = None;
        for middleware in &self.middlewares {
            if let Some(response) = middleware.before_request(&mut ctx) {
                short_circuit = Some(response);
                break;
            }
        }

        let mut response = match short_circuit {
            Some(response) => response,
            None => self.dispatch(&mut ctx),
        };

        for middleware in &self.middlewares {
            response = middleware.after_request(&mut ctx, response);
        }
        self.hooks.run_after(&mut ctx, &mut response);
        self.hooks.run_teardown(&ctx);

        response
    }

    fn dispatch(&self, ctx: &mut RequestContext) -> Response {
        let method = ctx.request().method();
        let path = ctx.request().path().to_string();

        let Some((handler, params)) = self.router.resolve(&path, method) else {
            return Response::text(404, "Not Found");
        };
        match handler.call(ctx, &params) {
            Ok(response) => response,
            Err(error) => {
                log::error!("handler for {method} {path:?} failed: {error:#}");
                Response::text(500, "Internal Server Error")
            }
        }
    }
}

impl Debug for App {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("routes", &self.router.len())
            .field("middlewares", &self.middlewares.len())
            .field("hooks", &self.hooks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::PathParams;

    fn app() -> App {
        let mut app = App::new(Config::default());
        app.add_route("/greet/<name>", [Method::Get], || {
            Arc::new(|_ctx: &mut RequestContext, params: &PathParams| {
                Ok(Response::text(200, format!("Hello, {}!", params["name"])))
            })
        })
        .unwrap();
        app
    }

    #[test]
    fn a_matched_route_produces_its_handler_response() {
        let response = app().handle(Request::builder(Method::Get, "/greet/Ada").build());
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.body_bytes(), b"Hello, Ada!");
    }

    #[test]
    fn an_unmatched_path_is_a_404() {
        let response = app().handle(Request::builder(Method::Get, "/missing").build());
        assert_eq!(response.status_code(), 404);
        assert_eq!(response.body_bytes(), b"Not Found");
    }

    #[test]
    fn a_handler_fault_is_a_500_not_a_panic() {
        let mut app = App::new(Config::default());
        app.add_route("/boom", [Method::Get], || {
            Arc::new(|_ctx: &mut RequestContext, _params: &PathParams| {
                Err(anyhow::anyhow!("storage offline"))
            })
        })
        .unwrap();

        let response = app.handle(Request::builder(Method::Get, "/boom").build());
        assert_eq!(response.status_code(), 500);
        assert_eq!(response.body_bytes(), b"Internal Server Error");
    }
}
