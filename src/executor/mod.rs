// Executor module - resolves, validates, runs and reports external processes
#![allow(unused_imports)]

pub mod config;
pub mod error;
pub mod policy;
pub mod resolver;
pub mod runner;
pub mod service;
pub mod types;

pub use config::ExecutorConfig;
pub use error::{ExecutorError, Result};
pub use policy::{Whitelist, tokenize};
pub use resolver::{Resolution, WorkflowResolver};
pub use runner::{ProcessRunner, TokioProcessRunner};
pub use service::ExecutionService;
pub use types::{CapturedOutput, CommandKind, CommandRequest, ExecutionResult, RunOutcome};
