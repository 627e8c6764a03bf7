//! Marketing video assembler.
//!
//! Orchestrates the full run: load project + template, probe and
//! match chapters on a bounded pool, resolve the timeline, plan the
//! mix, emit the render plan, and hand it to a backend.

pub mod assets;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use config::AssemblerConfig;
pub use error::{AssemblerError, AssemblerResult};
pub use logging::RunLogger;
pub use pipeline::{Assembler, BackendKind, RunOptions};
