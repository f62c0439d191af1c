pub mod display;
pub mod error;
pub mod handlers;
pub mod kiosk;
pub mod middleware;
pub mod operator;
pub mod routes;

pub use error::ApiError;
pub use routes::create_router;
