use crate::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// An HTTP request method.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Method {
    /// The `GET` method.
    Get,
    /// The `POST` method.
    Post,
    /// The `PUT` method.
    Put,
    /// The `PATCH` method.
    Patch,
    /// The `DELETE` method.
    Delete,
    /// The `HEAD` method.
    Head,
    /// The `OPTIONS` method.
    Options,
    /// The `TRACE` method.
    Trace,
}

impl Method {
    /// The canonical upper-case name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }

    /// Returns true for methods that must not change server state.
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options)
    }

    /// Returns true for methods that change server state and therefore
    /// require a CSRF token.
    pub fn is_state_changing(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "TRACE" => Ok(Self::Trace),
            _ => Err(Error::UnknownMethod(s.to_string())),
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An incoming HTTP request, as handed to the pipeline by the transport.
///
/// Header lookup is case-insensitive. The query string is kept separate
/// from the path; a path passed to the builder with a `?query` suffix is
/// split accordingly.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query_string: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    remote_addr: Option<String>,
}

impl Request {
    /// Start building a request for the given method and path.
    /// The path may carry a `?query` suffix.
    pub fn builder(method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, path)
    }

    /// The request method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The request path, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string, without the leading `?`.
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Look up the first header with the given name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header_name, _)| header_name.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All headers, in the order they were supplied.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The raw request body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The peer address, if the transport knows it.
    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    /// The decoded query parameters, in order of appearance.
    pub fn query_params(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.query_string.as_bytes())
            .into_owned()
            .collect()
    }

    /// The body decoded as `application/x-www-form-urlencoded` pairs.
    /// Bodies of any other shape decode to garbage or nothing; callers
    /// should check the content type first where that matters.
    pub fn form_data(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(&self.body).into_owned().collect()
    }

    /// Returns true if the content type declares a JSON payload.
    pub fn is_json(&self) -> bool {
        self.header("Content-Type")
            .map(|value| value.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false)
    }

    /// The body parsed as JSON, if the content type declares JSON and the
    /// body parses.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        if self.is_json() {
            serde_json::from_slice(&self.body).ok()
        } else {
            None
        }
    }

    /// The value of the cookie with the given name, parsed from the
    /// `Cookie` header.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let cookies = self.header("Cookie")?;
        for cookie in cookies.split(';') {
            if let Some((cookie_name, value)) = cookie.trim().split_once('=') {
                if cookie_name == name {
                    return Some(value.trim().to_string());
                }
            }
        }
        None
    }

    /// The session id presented by the client under the default cookie
    /// name, if any.
    ///
    /// Deployments that configure a different
    /// [`Config::cookie_name`](crate::Config) must look the cookie up
    /// with [`cookie`](Request::cookie) instead; the session middleware
    /// always does, so it honors the configured name.
    pub fn extract_session_id(&self) -> Option<String> {
        self.cookie(crate::config::DEFAULT_SESSION_COOKIE)
    }
}

/// Builder for [`Request`], used by tests and embedding servers.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    query_string: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    remote_addr: Option<String>,
}

impl RequestBuilder {
    fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let (path, query_string) = match path.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (path, String::new()),
        };
        Self {
            method,
            path,
            query_string,
            headers: Vec::new(),
            body: Vec::new(),
            remote_addr: None,
        }
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the raw body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set an `application/x-www-form-urlencoded` body from key/value pairs.
    pub fn form_body(mut self, pairs: &[(&str, &str)]) -> Self {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in pairs {
            serializer.append_pair(name, value);
        }
        self.body = serializer.finish().into_bytes();
        self.headers.push((
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ));
        self
    }

    /// Set a JSON body.
    pub fn json_body(mut self, value: &serde_json::Value) -> Self {
        self.body = value.to_string().into_bytes();
        self.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        self
    }

    /// Set the peer address.
    pub fn remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Finish building.
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            path: self.path,
            query_string: self.query_string,
            headers: self.headers,
            body: self.body,
            remote_addr: self.remote_addr,
        }
    }
}
