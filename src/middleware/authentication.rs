use crate::auth::{AuthContext, AuthState, AuthUser};
use crate::context::RequestContext;
use crate::http::Response;
use crate::middleware::Middleware;
use crate::routing::PathPattern;
use crate::Result;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The credential verifier supplied by the embedding application.
/// Returns the authenticated user on success, `None` on failure.
pub type CredentialCheck = Box<dyn Fn(&str, &str) -> Option<AuthUser> + Send + Sync>;

/// Drives the authentication state machine from request credentials.
///
/// Credentials travel in the `X-Username`/`X-Password` headers. Paths
/// matching a public-route pattern skip authentication entirely. Each
/// identity gets its own [`AuthContext`]: lockout is scoped per username,
/// not per middleware instance, since one shared instance serves every
/// request and a shared counter would be meaningless under concurrency.
///
/// Successful authentication lets the request continue to the handler;
/// everything else is answered by the state machine (`401` or `403`).
/// At the end of each request the request's own identity returns to the
/// unauthenticated state, since session data, not this middleware, is
/// the durable record of identity. Other identities are left alone, and
/// locks persist until [`unlock`](AuthenticationMiddleware::unlock).
pub struct AuthenticationMiddleware {
    public_routes: Vec<PathPattern>,
    contexts: Mutex<HashMap<String, AuthContext>>,
    check: CredentialCheck,
    max_failed_attempts: u32,
}

impl AuthenticationMiddleware {
    /// Build a middleware guarding everything except the given public
    /// route patterns. `max_failed_attempts` failures lock an identity.
    pub fn new(
        public_routes: &[&str],
        max_failed_attempts: u32,
        check: impl Fn(&str, &str) -> Option<AuthUser> + Send + Sync + 'static,
    ) -> Result<Self> {
        let public_routes = public_routes
            .iter()
            .map(|pattern| PathPattern::compile(pattern))
            .collect::<Result<_>>()?;
        Ok(Self {
            public_routes,
            contexts: Mutex::new(HashMap::new()),
            check: Box::new(check),
            max_failed_attempts,
        })
    }

    /// Out-of-band reset of a locked identity.
    pub fn unlock(&self, username: &str) {
        if let Some(auth) = self.contexts().get_mut(username) {
            auth.unlock();
        }
    }

    /// The current state of an identity, if it has been seen.
    pub fn state_of(&self, username: &str) -> Option<AuthState> {
        self.contexts().get(username).map(AuthContext::state)
    }

    fn contexts(&self) -> MutexGuard<'_, HashMap<String, AuthContext>> {
        self.contexts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_public(&self, path: &str) -> bool {
        self.public_routes
            .iter()
            .any(|pattern| pattern.matches(path).is_some())
    }
}

impl Middleware for AuthenticationMiddleware {
    fn before_request(&self, ctx: &mut RequestContext) -> Option<Response> {
        if self.is_public(ctx.request().path()) {
            log::debug!("path {:?} is public, skipping auth", ctx.request().path());
            return None;
        }

        let username = ctx.request().header("X-Username").map(str::to_string);
        let password = ctx.request().header("X-Password").map(str::to_string);
        let (Some(username), Some(password)) = (username, password) else {
            return Some(AuthContext::new().respond(ctx.request()));
        };

        let mut contexts = self.contexts();
        let auth = contexts.entry(username.clone()).or_default();

        if auth.state() == AuthState::Locked {
            return Some(auth.respond(ctx.request()));
        }

        match (self.check)(&username, &password) {
            Some(user) => {
                auth.authenticate(user);
                None
            }
            None => {
                if auth.record_failure(self.max_failed_attempts) == AuthState::Locked {
                    log::warn!("identity {username:?} locked after repeated failures");
                }
                Some(auth.respond(ctx.request()))
            }
        }
    }

    fn after_request(&self, ctx: &mut RequestContext, response: Response) -> Response {
        // Reset only this request's identity: touching every entry would
        // let one request's after-phase clobber another in-flight
        // identity's freshly authenticated state.
        if let Some(username) = ctx.request().header("X-Username") {
            if let Some(auth) = self.contexts().get_mut(username) {
                auth.reset();
            }
        }
        response
    }
}

impl Debug for AuthenticationMiddleware {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationMiddleware")
            .field("public_routes", &self.public_routes.len())
            .field("max_failed_attempts", &self.max_failed_attempts)
            .finish()
    }
}
