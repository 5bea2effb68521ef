//! The authentication state machine.
//!
//! A request is interpreted through a three-state machine: unauthenticated
//! requests yield `401`, authenticated ones a personalized `200`, and
//! locked identities always `403` until an out-of-band reset. Outcomes are
//! plain [`Response`]s, never errors, so middleware composition stays
//! simple control flow.

use crate::http::{Request, Response};

/// The states of the authentication machine.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum AuthState {
    /// No valid credentials were presented. Requests yield `401`.
    #[default]
    Unauthenticated,
    /// A credential check succeeded. Requests yield a personalized `200`.
    Authenticated,
    /// Too many failed attempts, or an explicit lock. Requests yield `403`
    /// until [`AuthContext::unlock`] is called.
    Locked,
}

/// An authenticated principal.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AuthUser {
    username: String,
}

impl AuthUser {
    /// A user with the given name.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    /// The user's name.
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Tracks one identity's position in the authentication state machine.
///
/// The failure counter lives in memory only: it resets on process restart
/// and is invisible across worker processes. That is the right semantic
/// for cheap brute-force slowdown, but it is not account-level lockout.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    state: AuthState,
    user: Option<AuthUser>,
    failed_attempts: u32,
}

impl AuthContext {
    /// A fresh context in the unauthenticated state.
    pub fn new() -> Self {
        Default::default()
    }

    /// The current state.
    pub fn state(&self) -> AuthState {
        self.state
    }

    /// The authenticated user, if any.
    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// The number of consecutive failed credential checks.
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// A credential check succeeded: transition to authenticated and reset
    /// the failure counter.
    pub fn authenticate(&mut self, user: AuthUser) {
        self.user = Some(user);
        self.failed_attempts = 0;
        self.state = AuthState::Authenticated;
    }

    /// A credential check failed: count it, locking once the counter
    /// reaches `max_failed_attempts`. Returns the resulting state.
    pub fn record_failure(&mut self, max_failed_attempts: u32) -> AuthState {
        if self.state == AuthState::Locked {
            return AuthState::Locked;
        }
        self.failed_attempts += 1;
        self.state = if self.failed_attempts >= max_failed_attempts {
            AuthState::Locked
        } else {
            AuthState::Unauthenticated
        };
        self.state
    }

    /// Lock regardless of the failure count.
    pub fn lock(&mut self) {
        self.state = AuthState::Locked;
    }

    /// The out-of-band reset: unlock and clear the failure counter.
    pub fn unlock(&mut self) {
        self.state = AuthState::Unauthenticated;
        self.failed_attempts = 0;
    }

    /// End-of-request reset. Authentication is not remembered in-process
    /// between requests (session data is the durable record of identity),
    /// but a lock survives until [`unlock`](AuthContext::unlock).
    pub fn reset(&mut self) {
        if self.state != AuthState::Locked {
            self.state = AuthState::Unauthenticated;
            self.user = None;
        }
    }

    /// Interpret a request through the current state.
    pub fn respond(&self, request: &Request) -> Response {
        let _ = request;
        match self.state {
            AuthState::Unauthenticated => Response::text(401, "Unauthorized"),
            AuthState::Authenticated => {
                let username = self
                    .user
                    .as_ref()
                    .map(AuthUser::username)
                    .unwrap_or("stranger");
                Response::text(200, format!("Welcome, {username}"))
            }
            AuthState::Locked => Response::text(403, "Account Locked"),
        }
    }
}
