pub mod health;
pub mod models;
pub mod inference;

pub use health::{health_check, ping, HealthResponse, HealthStatus};
pub use models::{describe_model, ModelInfo};
pub use inference::{invocations, run_invocation, REQUEST_ID_HEADER};
