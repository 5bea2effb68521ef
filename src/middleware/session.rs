use crate::config::Config;
use crate::context::RequestContext;
use crate::http::Response;
use crate::middleware::Middleware;
use crate::session::{Session, SessionStore};
use chrono::{Duration, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Attaches a session to every request and keeps the session cookie fresh.
///
/// On the way in: a valid incoming session id loads the stored session and
/// bumps its access time; a session whose id has outlived the rotation
/// interval gets a fresh id and a fresh cookie; a missing, tampered or
/// expired id mints a new guest session. On the way out the session is
/// written back to the store, so mutations a handler made through
/// [`RequestContext::session_mut`] persist, and queued cookies are flushed
/// onto the response as `Set-Cookie` headers.
///
/// The store lives behind a mutex so concurrent requests cannot interleave
/// its read-modify-write sequences.
#[derive(Debug)]
pub struct SessionMiddleware {
    store: Mutex<SessionStore>,
    cookie_name: String,
    session_ttl: Duration,
    rotation_interval: Duration,
}

impl SessionMiddleware {
    /// Wrap a store, taking the cookie name, session lifetime and rotation
    /// interval from the configuration.
    pub fn new(store: SessionStore, config: &Config) -> Self {
        Self {
            store: Mutex::new(store),
            cookie_name: config.cookie_name.clone(),
            session_ttl: Duration::seconds(config.session_expiry_secs as i64),
            rotation_interval: Duration::seconds(config.session_rotation_secs as i64),
        }
    }

    /// Inspect the wrapped store. Mostly useful in tests.
    pub fn with_store<T>(&self, f: impl FnOnce(&SessionStore) -> T) -> T {
        f(&self.store())
    }

    fn store(&self) -> MutexGuard<'_, SessionStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The session cookie for the given id.
    ///
    /// `Path=/` so the cookie travels to every path on the site;
    /// `SameSite=Lax` blocks cross-site subrequests while still sending
    /// the cookie on top-level navigation.
    fn cookie_for(&self, session_id: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Secure",
            self.cookie_name, session_id
        )
    }
}

impl Middleware for SessionMiddleware {
    fn before_request(&self, ctx: &mut RequestContext) -> Option<Response> {
        let now = Utc::now();
        let store = self.store();

        let incoming = ctx.request().cookie(&self.cookie_name);
        let existing = incoming.and_then(|session_id| store.get_session_by_id(&session_id, now));
        drop(store);

        let session = match existing {
            Some(mut session) => {
                session.touch();
                if session.age(now) > self.rotation_interval {
                    session.regenerate_id();
                    ctx.queue_cookie(self.cookie_for(session.id()));
                    log::debug!("rotated id of session for user {}", session.user_id());
                }
                session
            }
            None => {
                // Missing, tampered or expired ids all land here: the old
                // session is replaced, never repaired.
                let session = Session::new("guest", self.session_ttl);
                ctx.queue_cookie(self.cookie_for(session.id()));
                log::debug!("minted new guest session {}", session.id());
                session
            }
        };

        ctx.set_session(session);
        None
    }

    fn after_request(&self, ctx: &mut RequestContext, mut response: Response) -> Response {
        // Write back once per request, after handler mutations.
        if let Some(session) = ctx.session_mut() {
            self.store().write(session);
        }
        for cookie in ctx.take_pending_cookies() {
            response.add_header("Set-Cookie", cookie);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, Request};
    use crate::signing::Signer;

    fn middleware() -> SessionMiddleware {
        let config = Config::default();
        SessionMiddleware::new(SessionStore::new(Signer::new("test-secret")), &config)
    }

    fn request_with_cookie(cookie: Option<&str>) -> RequestContext {
        let mut builder = Request::builder(Method::Get, "/");
        if let Some(cookie) = cookie {
            builder = builder.header("Cookie", cookie);
        }
        RequestContext::new(builder.build())
    }

    fn run(middleware: &SessionMiddleware, ctx: &mut RequestContext) -> Response {
        assert!(middleware.before_request(ctx).is_none());
        middleware.after_request(ctx, Response::ok())
    }

    #[test]
    fn a_request_without_a_cookie_gets_a_fresh_session() {
        let middleware = middleware();
        let mut ctx = request_with_cookie(None);

        let response = run(&middleware, &mut ctx);
        let session = ctx.session().expect("session must be attached");
        assert_eq!(session.user_id(), "guest");
        middleware.with_store(|store| assert_eq!(store.len(), 1));

        let cookie = response.header("Set-Cookie").expect("cookie must be set");
        assert!(cookie.starts_with(&format!("session_id={}", session.id())));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));
    }

    #[test]
    fn a_valid_cookie_resumes_the_stored_session() {
        let middleware = middleware();

        let mut first = request_with_cookie(None);
        run(&middleware, &mut first);
        let session_id = first.session().unwrap().id().to_string();

        let cookie = format!("session_id={session_id}");
        let mut second = request_with_cookie(Some(&cookie));
        assert!(middleware.before_request(&mut second).is_none());
        assert_eq!(second.session().unwrap().id(), session_id);

        // No new cookie needed for a resumed, unrotated session.
        let response = middleware.after_request(&mut second, Response::ok());
        assert_eq!(response.header("Set-Cookie"), None);
    }

    #[test]
    fn handler_mutations_persist_across_requests() {
        let middleware = middleware();

        let mut first = request_with_cookie(None);
        assert!(middleware.before_request(&mut first).is_none());
        let session_id = first.session().unwrap().id().to_string();
        first
            .session_mut()
            .unwrap()
            .set("theme", serde_json::json!("dark"));
        middleware.after_request(&mut first, Response::ok());

        let cookie = format!("session_id={session_id}");
        let mut second = request_with_cookie(Some(&cookie));
        middleware.before_request(&mut second);
        assert_eq!(
            second.session().unwrap().get("theme"),
            Some(&serde_json::json!("dark"))
        );
    }

    #[test]
    fn a_configured_cookie_name_is_honored_end_to_end() {
        let config = Config {
            cookie_name: "sid".to_string(),
            ..Config::default()
        };
        let middleware =
            SessionMiddleware::new(SessionStore::new(Signer::new("test-secret")), &config);

        let mut first = request_with_cookie(None);
        let response = run(&middleware, &mut first);
        let session_id = first.session().unwrap().id().to_string();
        let cookie = response.header("Set-Cookie").expect("cookie must be set");
        assert!(cookie.starts_with(&format!("sid={session_id}")));

        let mut second = request_with_cookie(Some(&format!("sid={session_id}")));
        assert!(middleware.before_request(&mut second).is_none());
        assert_eq!(second.session().unwrap().id(), session_id);
    }

    #[test]
    fn a_forged_cookie_gets_a_replacement_session() {
        let middleware = middleware();
        let mut ctx = request_with_cookie(Some("session_id=not-a-real-session"));

        let response = run(&middleware, &mut ctx);
        let session = ctx.session().unwrap();
        assert_ne!(session.id(), "not-a-real-session");
        assert!(response.header("Set-Cookie").is_some());
    }

    #[test]
    fn an_overaged_session_has_its_id_rotated() {
        let config = Config {
            session_rotation_secs: 0,
            ..Config::default()
        };
        let middleware =
            SessionMiddleware::new(SessionStore::new(Signer::new("test-secret")), &config);

        let mut first = request_with_cookie(None);
        run(&middleware, &mut first);
        let original_id = first.session().unwrap().id().to_string();

        std::thread::sleep(std::time::Duration::from_millis(5));

        let cookie = format!("session_id={original_id}");
        let mut second = request_with_cookie(Some(&cookie));
        assert!(middleware.before_request(&mut second).is_none());
        let rotated_id = second.session().unwrap().id().to_string();
        assert_ne!(rotated_id, original_id);

        let response = middleware.after_request(&mut second, Response::ok());
        let cookie = response.header("Set-Cookie").expect("rotation sets cookie");
        assert!(cookie.starts_with(&format!("session_id={rotated_id}")));
    }
}
