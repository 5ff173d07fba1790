//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod serve;
mod sources;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::{router, run_serve};
pub use sources::run_sources;
