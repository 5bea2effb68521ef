//! Route registration and lookup.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Resolve `(path, method)` to `(handler, params)`
//! - Construct each route's handler at most once
//!
//! # Design Decisions
//! - First-registered-first-matched; registration order is part of the
//!   contract and duplicate registrations shadow nothing
//! - A method mismatch skips the route rather than producing an error;
//!   the caller decides between 404 and 405 on an overall miss
//! - Registration happens at startup; `resolve` takes `&self` and is safe
//!   to call concurrently once registration has completed

use crate::http::Method;
use crate::routing::{Handler, PathParams, PathPattern};
use crate::Result;
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, OnceLock};

type HandlerFactory = Box<dyn Fn() -> Arc<dyn Handler> + Send + Sync>;

/// A compiled pattern bound to a method set and a lazily-built handler.
///
/// The handler factory runs at most once, on first match, and the same
/// handler instance is reused for every later request to this route.
pub struct Route {
    pattern: PathPattern,
    methods: BTreeSet<Method>,
    factory: HandlerFactory,
    handler: OnceLock<Arc<dyn Handler>>,
}

impl Route {
    /// The template this route was registered with.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Returns true if the route accepts the given method.
    pub fn allows(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    /// The route's handler, constructing it on first use.
    pub fn handler(&self) -> Arc<dyn Handler> {
        self.handler
            .get_or_init(|| {
                log::debug!("instantiating handler for route {:?}", self.pattern.as_str());
                (self.factory)()
            })
            .clone()
    }
}

impl Debug for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.as_str())
            .field("methods", &self.methods)
            .field("handler_built", &self.handler.get().is_some())
            .finish()
    }
}

/// An ordered list of [`Route`]s.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// An empty router.
    pub fn new() -> Self {
        Default::default()
    }

    /// Register a route. Later registrations never shadow earlier ones.
    pub fn add_route(
        &mut self,
        pattern: &str,
        methods: impl IntoIterator<Item = Method>,
        factory: impl Fn() -> Arc<dyn Handler> + Send + Sync + 'static,
    ) -> Result<()> {
        let pattern = PathPattern::compile(pattern)?;
        self.routes.push(Route {
            pattern,
            methods: methods.into_iter().collect(),
            factory: Box::new(factory),
            handler: OnceLock::new(),
        });
        Ok(())
    }

    /// Resolve a path and method to a handler and its extracted parameters.
    ///
    /// Any `?query` suffix is stripped before matching. Routes are scanned
    /// in registration order; a route whose method set does not contain
    /// `method` is skipped. `None` means no route matched; the caller
    /// decides whether that is a 404 or a 405.
    pub fn resolve(&self, path: &str, method: Method) -> Option<(Arc<dyn Handler>, PathParams)> {
        let path = path.split_once('?').map(|(path, _)| path).unwrap_or(path);
        for route in &self.routes {
            if !route.allows(method) {
                continue;
            }
            if let Some(params) = route.pattern.matches(path) {
                log::debug!("route {:?} matched {method} {path:?}", route.pattern());
                return Some((route.handler(), params));
            }
        }
        log::debug!("no route matched {method} {path:?}");
        None
    }

    /// Force-construct every handler, in registration order.
    ///
    /// Handler construction may have side effects that should happen
    /// exactly once and at a predictable time; calling this at startup
    /// makes initialization order deterministic instead of
    /// first-traffic-driven.
    pub fn warm_up(&self) {
        for route in &self.routes {
            let _ = route.handler();
        }
    }

    /// The registered routes, in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
