//! HTTP gateway exposing chat, document search, uploads, and a health endpoint.

mod error;
mod handlers;
mod router;
mod server;

pub use error::GatewayError;
pub use server::GatewayServer;
