//! netgen-core library.
//!
//! A coverage-guided generator of instruction files for social-network model
//! checkers. The engine mirrors the target's state, predicts each
//! instruction's outcome before emitting it, and steers generation until
//! every command has succeeded and every catalogued failure has been produced.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums per module; expected generation misses are
//!   `Option::None`, never errors.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).
//! - **Randomness**: every random draw goes through [`rng::DeterministicRng`].

pub mod campaign;
pub mod catalog;
pub mod classify;
pub mod command;
pub mod config;
pub mod coverage;
pub mod driver;
pub mod generate;
pub mod instruction;
pub mod invariants;
pub mod model;
pub mod replay;
pub mod rng;
pub mod select;
pub mod update;

pub use catalog::{CATALOG, CATALOG_VERSION, FailureKey, FailureKind, Outcome};
pub use command::CommandKind;
pub use config::{ConfigError, GeneratorConfig, Mode, Tuning};
pub use coverage::{CoverageReport, CoverageTracker};
pub use driver::{Generation, GenerationReport, Generator, StopReason, WriteError, generate_run};
pub use instruction::{Instruction, LoadBlock, ParseError, parse, render};
pub use model::Network;
pub use replay::{ReplayReport, replay, replay_text};
