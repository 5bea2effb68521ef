use crate::context::RequestContext;
use crate::http::{Method, Response};
use crate::middleware::Middleware;
use crate::signing::Signer;

/// The fixed rejection body. Kept constant so clients cannot tell which
/// part of the check failed.
const REJECTION_BODY: &str = "Invalid CSRF Token";

/// Double-checks state-changing form submissions against a signed token.
///
/// The token is the signature of the current session id, so it needs no
/// storage of its own: possession proves the client was handed the value
/// by this server for this session. Safe `GET` requests get the current
/// token echoed in the `X-CSRF-Token` response header so the client
/// always has a fresh value to submit.
///
/// Requests with a JSON content type are exempt from the form-token
/// check. That carve-out assumes JSON endpoints are called by script with
/// same-origin credentials rather than by HTML forms; it is part of this
/// middleware's documented contract.
///
/// Register this after [`SessionMiddleware`](crate::SessionMiddleware):
/// the check needs the session the latter attaches. Without a session,
/// state-changing requests are rejected outright.
#[derive(Debug, Clone, Copy)]
pub struct CsrfMiddleware {
    signer: Signer,
}

impl CsrfMiddleware {
    /// Check and issue tokens with the given signer. It must be the same
    /// signer the session store uses, or no token will ever verify.
    pub fn new(signer: Signer) -> Self {
        Self { signer }
    }

    fn rejection() -> Response {
        Response::text(403, REJECTION_BODY)
    }
}

impl Middleware for CsrfMiddleware {
    fn before_request(&self, ctx: &mut RequestContext) -> Option<Response> {
        if !ctx.request().method().is_state_changing() {
            return None;
        }
        // Structured API payloads skip the form-token check.
        if ctx.request().is_json() {
            return None;
        }

        let Some(session) = ctx.session() else {
            log::warn!("csrf check ran without a session; rejecting");
            return Some(Self::rejection());
        };

        let presented = ctx
            .request()
            .form_data()
            .into_iter()
            .find(|(name, _)| name == "csrf_token")
            .map(|(_, value)| value);

        match presented {
            Some(token) if self.signer.verify(session.id(), &token) => None,
            Some(_) => {
                log::warn!(
                    "rejecting {} {} with mismatched csrf token",
                    ctx.request().method(),
                    ctx.request().path()
                );
                Some(Self::rejection())
            }
            None => {
                log::warn!(
                    "rejecting {} {} without csrf token",
                    ctx.request().method(),
                    ctx.request().path()
                );
                Some(Self::rejection())
            }
        }
    }

    fn after_request(&self, ctx: &mut RequestContext, mut response: Response) -> Response {
        if ctx.request().method() == Method::Get {
            if let Some(session) = ctx.session() {
                let token = self.signer.csrf_token(session.id());
                response.set_header("X-CSRF-Token", token.as_str());
                ctx.set_csrf_token(token);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;
    use crate::session::Session;
    use chrono::Duration;

    fn signer() -> Signer {
        Signer::new("test-secret")
    }

    fn ctx_with_session(request: Request) -> RequestContext {
        let mut ctx = RequestContext::new(request);
        ctx.set_session(Session::new("guest", Duration::hours(1)));
        ctx
    }

    #[test]
    fn get_requests_pass_and_receive_a_token() {
        let middleware = CsrfMiddleware::new(signer());
        let mut ctx = ctx_with_session(Request::builder(Method::Get, "/form").build());

        assert!(middleware.before_request(&mut ctx).is_none());
        let response = middleware.after_request(&mut ctx, Response::ok());

        let session_id = ctx.session().unwrap().id().to_string();
        let expected = signer().csrf_token(&session_id);
        assert_eq!(response.header("X-CSRF-Token"), Some(expected.as_str()));
        assert_eq!(ctx.csrf_token(), Some(expected.as_str()));
    }

    #[test]
    fn posts_without_a_token_are_rejected_with_a_fixed_body() {
        let middleware = CsrfMiddleware::new(signer());
        let mut ctx = ctx_with_session(Request::builder(Method::Post, "/submit").build());

        let response = middleware.before_request(&mut ctx).expect("must reject");
        assert_eq!(response.status_code(), 403);
        assert_eq!(response.body_bytes(), REJECTION_BODY.as_bytes());
    }

    #[test]
    fn posts_with_the_signed_token_pass() {
        let middleware = CsrfMiddleware::new(signer());
        let mut ctx = ctx_with_session(Request::builder(Method::Post, "/submit").build());
        let token = signer().csrf_token(ctx.session().unwrap().id());

        let request = Request::builder(Method::Post, "/submit")
            .form_body(&[("csrf_token", &token)])
            .build();
        let session = ctx.session().unwrap().clone();
        let mut ctx = RequestContext::new(request);
        ctx.set_session(session);

        assert!(middleware.before_request(&mut ctx).is_none());
    }

    #[test]
    fn a_token_for_another_session_is_rejected() {
        let middleware = CsrfMiddleware::new(signer());
        let foreign_token = signer().csrf_token("some-other-session");

        let request = Request::builder(Method::Post, "/submit")
            .form_body(&[("csrf_token", &foreign_token)])
            .build();
        let mut ctx = ctx_with_session(request);

        let response = middleware.before_request(&mut ctx).expect("must reject");
        assert_eq!(response.status_code(), 403);
    }

    #[test]
    fn json_payloads_are_exempt() {
        let middleware = CsrfMiddleware::new(signer());
        let request = Request::builder(Method::Post, "/api")
            .json_body(&serde_json::json!({"op": "update"}))
            .build();
        let mut ctx = ctx_with_session(request);

        assert!(middleware.before_request(&mut ctx).is_none());
    }

    #[test]
    fn state_changing_requests_without_a_session_fail_closed() {
        let middleware = CsrfMiddleware::new(signer());
        let mut ctx = RequestContext::new(Request::builder(Method::Delete, "/thing/1").build());

        let response = middleware.before_request(&mut ctx).expect("must reject");
        assert_eq!(response.status_code(), 403);
    }
}
