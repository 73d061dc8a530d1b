//! Integration tests: the analytics pipeline and the HTTP API exercised
//! through the public crate surface.

mod api;
mod pipeline;
mod static_source;
