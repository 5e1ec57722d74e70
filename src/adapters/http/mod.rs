//! HTTP adapters - the single listener shared by SSE, commands and static
//! assets.

pub mod dto;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::app_router;
pub use state::{AppState, HealthState};
