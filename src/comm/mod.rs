// Comm module - HTTP surface for the browser UI

pub mod config;
pub mod error;
pub mod server;
pub mod types;

pub use config::CommConfig;
pub use server::Comm;
#[allow(unused_imports)]
pub use error::{CommError, CommInitError};
#[allow(unused_imports)]
pub use server::{AppState, router};
