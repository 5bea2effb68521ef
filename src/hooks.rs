use crate::context::RequestContext;
use crate::http::Response;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};

type BeforeHook = Box<dyn Fn(&mut RequestContext) + Send + Sync>;
type AfterHook = Box<dyn Fn(&mut RequestContext, &mut Response) + Send + Sync>;
type TeardownHook = Box<dyn Fn(&RequestContext) -> anyhow::Result<()> + Send + Sync>;

/// Ordered registries of request lifecycle hooks.
///
/// Hooks differ from middleware: they cannot short-circuit. Before and
/// after hooks are side-effect only (after hooks may rewrite the response
/// in place), before-first-request hooks run exactly once over the
/// lifetime of the application, and teardown hooks see the request but
/// never the response; a teardown fault is logged and must not prevent
/// the response from being sent.
pub struct Hooks {
    before_first_request: Vec<BeforeHook>,
    before_request: Vec<BeforeHook>,
    after_request: Vec<AfterHook>,
    teardown_request: Vec<TeardownHook>,
    first_request_pending: AtomicBool,
}

impl Hooks {
    /// Empty registries.
    pub fn new() -> Self {
        Self {
            before_first_request: Vec::new(),
            before_request: Vec::new(),
            after_request: Vec::new(),
            teardown_request: Vec::new(),
            first_request_pending: AtomicBool::new(true),
        }
    }

    /// Register a hook that runs once, before the first request only.
    pub fn add_before_first_request(
        &mut self,
        hook: impl Fn(&mut RequestContext) + Send + Sync + 'static,
    ) {
        self.before_first_request.push(Box::new(hook));
    }

    /// Register a hook that runs before every request.
    pub fn add_before_request(
        &mut self,
        hook: impl Fn(&mut RequestContext) + Send + Sync + 'static,
    ) {
        self.before_request.push(Box::new(hook));
    }

    /// Register a hook that runs after every request and may rewrite the
    /// response.
    pub fn add_after_request(
        &mut self,
        hook: impl Fn(&mut RequestContext, &mut Response) + Send + Sync + 'static,
    ) {
        self.after_request.push(Box::new(hook));
    }

    /// Register a best-effort hook that runs last, after the response is
    /// final.
    pub fn add_teardown_request(
        &mut self,
        hook: impl Fn(&RequestContext) -> anyhow::Result<()> + Send + Sync + 'static,
    ) {
        self.teardown_request.push(Box::new(hook));
    }

    /// Run the one-shot before-first-request hooks if they have not run
    /// yet. The guard flag is never reset.
    pub fn run_before_first(&self, ctx: &mut RequestContext) {
        if self.first_request_pending.swap(false, Ordering::SeqCst) {
            for hook in &self.before_first_request {
                hook(ctx);
            }
        }
    }

    /// Run the before-request hooks, in registration order.
    pub fn run_before(&self, ctx: &mut RequestContext) {
        for hook in &self.before_request {
            hook(ctx);
        }
    }

    /// Run the after-request hooks, in registration order.
    pub fn run_after(&self, ctx: &mut RequestContext, response: &mut Response) {
        for hook in &self.after_request {
            hook(ctx, response);
        }
    }

    /// Run the teardown hooks. Faults are logged, never propagated.
    pub fn run_teardown(&self, ctx: &RequestContext) {
        for hook in &self.teardown_request {
            if let Err(error) = hook(ctx) {
                log::warn!("teardown hook failed: {error:#}");
            }
        }
    }
}

impl Default for Hooks {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Hooks {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("before_first_request", &self.before_first_request.len())
            .field("before_request", &self.before_request.len())
            .field("after_request", &self.after_request.len())
            .field("teardown_request", &self.teardown_request.len())
            .field(
                "first_request_pending",
                &self.first_request_pending.load(Ordering::SeqCst),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, Request};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn ctx() -> RequestContext {
        RequestContext::new(Request::builder(Method::Get, "/").build())
    }

    #[test]
    fn before_first_hooks_run_exactly_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let hook_counter = counter.clone();

        let mut hooks = Hooks::new();
        hooks.add_before_first_request(move |_ctx| {
            hook_counter.fetch_add(1, Ordering::SeqCst);
        });

        hooks.run_before_first(&mut ctx());
        hooks.run_before_first(&mut ctx());
        hooks.run_before_first(&mut ctx());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn after_hooks_may_rewrite_the_response() {
        let mut hooks = Hooks::new();
        hooks.add_after_request(|_ctx, response| {
            response.set_header("X-Hooked", "yes");
        });

        let mut response = Response::ok();
        hooks.run_after(&mut ctx(), &mut response);
        assert_eq!(response.header("X-Hooked"), Some("yes"));
    }

    #[test]
    fn teardown_faults_are_swallowed() {
        let mut hooks = Hooks::new();
        hooks.add_teardown_request(|_ctx| Err(anyhow::anyhow!("flaky cleanup")));
        // Must not panic or propagate.
        hooks.run_teardown(&ctx());
    }
}
