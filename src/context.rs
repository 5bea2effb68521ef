use crate::http::Request;
use crate::session::Session;
use std::time::Instant;

/// Request-scoped state threaded explicitly through every pipeline phase.
///
/// There is no ambient "current request" global anywhere in this crate;
/// everything a middleware, hook or handler needs travels in this context
/// by reference.
#[derive(Debug)]
pub struct RequestContext {
    request: Request,
    session: Option<Session>,
    csrf_token: Option<String>,
    csp_nonce: Option<String>,
    pending_cookies: Vec<String>,
    started_at: Instant,
}

impl RequestContext {
    /// Wrap an incoming request.
    pub fn new(request: Request) -> Self {
        Self {
            request,
            session: None,
            csrf_token: None,
            csp_nonce: None,
            pending_cookies: Vec::new(),
            started_at: Instant::now(),
        }
    }

    /// The request being processed.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The session attached by the session middleware, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Mutable access to the attached session.
    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// Attach a session to this request.
    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// The CSRF token computed for this request, if any.
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// Record the CSRF token computed for this request.
    pub fn set_csrf_token(&mut self, token: String) {
        self.csrf_token = Some(token);
    }

    /// The script nonce minted for this request, if any.
    pub fn csp_nonce(&self) -> Option<&str> {
        self.csp_nonce.as_deref()
    }

    /// Record the script nonce minted for this request.
    pub fn set_csp_nonce(&mut self, nonce: String) {
        self.csp_nonce = Some(nonce);
    }

    /// Queue a `Set-Cookie` value to be flushed onto the response in the
    /// after-phase.
    pub fn queue_cookie(&mut self, cookie: String) {
        self.pending_cookies.push(cookie);
    }

    /// Drain the queued cookies.
    pub fn take_pending_cookies(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_cookies)
    }

    /// When processing of this request started.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}
