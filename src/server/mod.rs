// HTTP server module

mod handlers;
mod middleware;
mod routes;

pub use routes::{create_router, create_router_with_state, AppState, SessionStore};
