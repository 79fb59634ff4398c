//! Integration tests

mod support;
mod test_http;
mod test_stream;
