//! Command-line interface for multiloko-eval.
//!
//! Provides commands for full evaluation runs, single-stage generation and
//! projection, and prompt inspection.

mod commands;

pub use commands::{
    build_generator, parse_cli, resolve_config, resolve_config_with, run_with_cli, Cli, Commands,
    EvalArgs,
};
