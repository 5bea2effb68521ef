/// An outgoing HTTP response.
///
/// The status line renders as `"NNN Reason"`. Headers are an ordered list;
/// [`set_header`](Response::set_header) overwrites the first occurrence of
/// a name while [`add_header`](Response::add_header) appends, which allows
/// duplicates such as multiple `Set-Cookie` headers. The body is a sequence
/// of byte chunks so a transport can stream it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Response {
    status_code: u16,
    headers: Vec<(String, String)>,
    body: Vec<Vec<u8>>,
}

impl Response {
    /// An empty response with the given status code.
    pub fn with_status(status_code: u16) -> Self {
        Self {
            status_code,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// An empty `200 OK` response.
    pub fn ok() -> Self {
        Self::with_status(200)
    }

    /// A `text/plain` response.
    pub fn text(status_code: u16, body: impl Into<String>) -> Self {
        let mut response = Self::with_status(status_code);
        response.add_header("Content-Type", "text/plain; charset=utf-8");
        response.push_chunk(body.into().into_bytes());
        response
    }

    /// A `text/html` response.
    pub fn html(status_code: u16, body: impl Into<String>) -> Self {
        let mut response = Self::with_status(status_code);
        response.add_header("Content-Type", "text/html; charset=utf-8");
        response.push_chunk(body.into().into_bytes());
        response
    }

    /// An `application/json` response.
    pub fn json(status_code: u16, value: &serde_json::Value) -> Self {
        let mut response = Self::with_status(status_code);
        response.add_header("Content-Type", "application/json");
        response.push_chunk(value.to_string().into_bytes());
        response
    }

    /// The numeric status code.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Replace the status code.
    pub fn set_status(&mut self, status_code: u16) {
        self.status_code = status_code;
    }

    /// The status line in `"NNN Reason"` form.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.status_code, reason_phrase(self.status_code))
    }

    /// Look up the first header with the given name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header_name, _)| header_name.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All headers, in order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Append a header, permitting duplicates.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Overwrite the first header with the given name, or append if absent.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        for (header_name, header_value) in &mut self.headers {
            if header_name.eq_ignore_ascii_case(name) {
                *header_value = value.into();
                return;
            }
        }
        self.add_header(name, value);
    }

    /// Append a body chunk.
    pub fn push_chunk(&mut self, chunk: impl Into<Vec<u8>>) {
        self.body.push(chunk.into());
    }

    /// The body chunks, in order.
    pub fn body_chunks(&self) -> &[Vec<u8>] {
        &self.body
    }

    /// The whole body concatenated into one buffer.
    pub fn body_bytes(&self) -> Vec<u8> {
        self.body.concat()
    }
}

fn reason_phrase(status_code: u16) -> &'static str {
    match status_code {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown Status",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_renders_code_and_reason() {
        assert_eq!(Response::ok().status_line(), "200 OK");
        assert_eq!(Response::with_status(404).status_line(), "404 Not Found");
        assert_eq!(
            Response::with_status(799).status_line(),
            "799 Unknown Status"
        );
    }

    #[test]
    fn set_header_overwrites_but_add_header_duplicates() {
        let mut response = Response::ok();
        response.add_header("Set-Cookie", "a=1");
        response.add_header("Set-Cookie", "b=2");
        assert_eq!(
            response
                .headers()
                .iter()
                .filter(|(name, _)| name == "Set-Cookie")
                .count(),
            2
        );

        response.set_header("X-CSRF-Token", "first");
        response.set_header("x-csrf-token", "second");
        assert_eq!(response.header("X-CSRF-Token"), Some("second"));
        assert_eq!(
            response
                .headers()
                .iter()
                .filter(|(name, _)| name.eq_ignore_ascii_case("x-csrf-token"))
                .count(),
            1
        );
    }

    #[test]
    fn body_chunks_concatenate() {
        let mut response = Response::ok();
        response.push_chunk(&b"Hello, "[..]);
        response.push_chunk(&b"world"[..]);
        assert_eq!(response.body_chunks().len(), 2);
        assert_eq!(response.body_bytes(), b"Hello, world");
    }
}
