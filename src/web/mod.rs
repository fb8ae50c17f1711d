//! Web API for shelf.

pub mod handlers;
pub mod router;
pub mod server;

pub use handlers::AppState;
pub use server::WebServer;
