//! HTTP surface of the collapse-score service.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod types;

pub use routes::create_router;
pub use server::ApiServer;
pub use state::AppState;
