use crate::context::RequestContext;
use crate::http::{Method, Response};
use crate::routing::PathParams;
use std::fmt::{Debug, Formatter};

/// A request handler.
///
/// Handler instances are shared across all requests routed to the same
/// path, so they must be reentrant: any state they keep needs interior
/// synchronization. Plain functions and closures with the matching
/// signature are handlers.
///
/// A fault returned by a handler is translated to a generic `500` response
/// at the pipeline boundary; it never propagates further out.
pub trait Handler: Send + Sync {
    /// Handle a matched request.
    fn call(&self, ctx: &mut RequestContext, params: &PathParams) -> anyhow::Result<Response>;
}

impl<F> Handler for F
where
    F: Fn(&mut RequestContext, &PathParams) -> anyhow::Result<Response> + Send + Sync,
{
    fn call(&self, ctx: &mut RequestContext, params: &PathParams) -> anyhow::Result<Response> {
        self(ctx, params)
    }
}

/// A class-style handler that dispatches on the request method.
///
/// Every verb defaults to `405 Method Not Allowed`; implementors override
/// the verbs they support. Wrap a view in [`ViewHandler`] to register it
/// as a route handler.
pub trait View: Send + Sync {
    /// Handle a `GET` request.
    fn get(&self, ctx: &mut RequestContext, params: &PathParams) -> anyhow::Result<Response> {
        let _ = (ctx, params);
        Ok(method_not_allowed())
    }

    /// Handle a `POST` request.
    fn post(&self, ctx: &mut RequestContext, params: &PathParams) -> anyhow::Result<Response> {
        let _ = (ctx, params);
        Ok(method_not_allowed())
    }

    /// Handle a `PUT` request.
    fn put(&self, ctx: &mut RequestContext, params: &PathParams) -> anyhow::Result<Response> {
        let _ = (ctx, params);
        Ok(method_not_allowed())
    }

    /// Handle a `PATCH` request.
    fn patch(&self, ctx: &mut RequestContext, params: &PathParams) -> anyhow::Result<Response> {
        let _ = (ctx, params);
        Ok(method_not_allowed())
    }

    /// Handle a `DELETE` request.
    fn delete(&self, ctx: &mut RequestContext, params: &PathParams) -> anyhow::Result<Response> {
        let _ = (ctx, params);
        Ok(method_not_allowed())
    }

    /// Handle a `HEAD` request.
    fn head(&self, ctx: &mut RequestContext, params: &PathParams) -> anyhow::Result<Response> {
        let _ = (ctx, params);
        Ok(method_not_allowed())
    }

    /// Handle an `OPTIONS` request.
    fn options(&self, ctx: &mut RequestContext, params: &PathParams) -> anyhow::Result<Response> {
        let _ = (ctx, params);
        Ok(method_not_allowed())
    }

    /// Handle a `TRACE` request.
    fn trace(&self, ctx: &mut RequestContext, params: &PathParams) -> anyhow::Result<Response> {
        let _ = (ctx, params);
        Ok(method_not_allowed())
    }
}

/// Adapter that lets a [`View`] act as a [`Handler`] by dispatching on the
/// request method.
pub struct ViewHandler<V>(pub V);

impl<V: View> Handler for ViewHandler<V> {
    fn call(&self, ctx: &mut RequestContext, params: &PathParams) -> anyhow::Result<Response> {
        match ctx.request().method() {
            Method::Get => self.0.get(ctx, params),
            Method::Post => self.0.post(ctx, params),
            Method::Put => self.0.put(ctx, params),
            Method::Patch => self.0.patch(ctx, params),
            Method::Delete => self.0.delete(ctx, params),
            Method::Head => self.0.head(ctx, params),
            Method::Options => self.0.options(ctx, params),
            Method::Trace => self.0.trace(ctx, params),
        }
    }
}

impl<V> Debug for ViewHandler<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("ViewHandler(..)")
    }
}

fn method_not_allowed() -> Response {
    Response::text(405, "Method Not Allowed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;

    struct EchoView;

    impl View for EchoView {
        fn get(&self, _ctx: &mut RequestContext, params: &PathParams) -> anyhow::Result<Response> {
            Ok(Response::text(
                200,
                params.get("name").cloned().unwrap_or_default(),
            ))
        }
    }

    fn ctx(method: Method) -> RequestContext {
        RequestContext::new(Request::builder(method, "/echo/hi").build())
    }

    #[test]
    fn views_dispatch_on_the_request_method() {
        let handler = ViewHandler(EchoView);
        let params = PathParams::from([("name".to_string(), "hi".to_string())]);

        let response = handler.call(&mut ctx(Method::Get), &params).unwrap();
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.body_bytes(), b"hi");

        // Unimplemented verbs fall back to 405.
        let response = handler.call(&mut ctx(Method::Delete), &params).unwrap();
        assert_eq!(response.status_code(), 405);
    }
}
