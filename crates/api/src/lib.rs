//! HTTP API: server wiring, message-pattern dispatch, and response mapping.

pub mod app;
