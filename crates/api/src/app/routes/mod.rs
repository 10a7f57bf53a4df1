use axum::{routing::post, Router};

pub mod rpc;
pub mod system;

/// Router for the message endpoint.
pub fn router() -> Router {
    Router::new().route("/rpc", post(rpc::handle_message))
}
