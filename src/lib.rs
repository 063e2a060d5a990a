pub mod config;
pub mod config_validator;
pub mod counter;
pub mod error;
pub mod handlers;
pub mod keys;
pub mod middleware;
pub mod period;
pub mod response;
pub mod server;
pub mod store;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use handlers::{InvocationRequest, VisitHandler};
pub use response::ApiResponse;
pub use server::create_app;
