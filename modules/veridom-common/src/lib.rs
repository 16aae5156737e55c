pub mod config;
pub mod error;
pub mod trace;
pub mod types;

pub use config::{Config, ProviderKind};
pub use error::VeridomError;
pub use trace::ExecutionTrace;
pub use types::*;
