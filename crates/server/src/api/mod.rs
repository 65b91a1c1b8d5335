pub mod handlers;
pub mod middleware;
pub mod payments;
pub mod routes;
pub mod triggers;

pub use routes::create_router;
