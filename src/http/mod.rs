//! The request/response boundary of the pipeline.
//!
//! These types stand in for whatever transport actually carries the bytes.
//! The pipeline never performs I/O itself; an embedding server constructs a
//! [`Request`], calls [`App::handle`](crate::App::handle) and writes the
//! returned [`Response`] out however it likes.

mod request;
mod response;

pub use request::{Method, Request, RequestBuilder};
pub use response::Response;
