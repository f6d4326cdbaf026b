// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # arena-rt
//!
//! Command-line interface for the arena-rt model runtime.
//!
//! ## Usage
//! ```bash
//! # Write a small demo model with an embedded runtime memory size hint
//! arena-rt demo --output demo.amdl
//!
//! # Show the model's graph, parameters and metadata
//! arena-rt inspect --model demo.amdl
//!
//! # Run only the sizing search against a 512K heap
//! arena-rt size --model demo.amdl --heap 512K
//!
//! # Load, invoke once and print the summary and profile
//! arena-rt run --model demo.amdl --config runtime.toml
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "arena-rt",
    about = "Runtime arena sizing and model lifecycle for memory-constrained inference",
    version,
    author
)]
struct Cli {
    /// Path to a TOML runtime configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect a model: tensors, operators, parameters and metadata.
    Inspect {
        /// Path to the model file.
        #[arg(short, long)]
        model: PathBuf,
    },

    /// Run the runtime buffer sizing search and report every probe.
    Size {
        /// Path to the model file.
        #[arg(short, long)]
        model: PathBuf,

        /// Platform heap size (e.g. "512K"); overrides the config.
        #[arg(long)]
        heap: Option<String>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Load a model, invoke it once on zeroed inputs and report.
    Run {
        /// Path to the model file.
        #[arg(short, long)]
        model: PathBuf,

        /// Platform heap size (e.g. "512K"); overrides the config.
        #[arg(long)]
        heap: Option<String>,

        /// Skip the embedded size hint and search directly.
        #[arg(long, conflicts_with = "buffer")]
        search: bool,

        /// Use a caller-provided runtime buffer of this size (e.g. "64K").
        #[arg(long)]
        buffer: Option<String>,

        /// Number of times to invoke the model.
        #[arg(long, default_value_t = 1)]
        iterations: usize,
    },

    /// Write a small fully-connected demo model.
    Demo {
        /// Where to write the model.
        #[arg(short, long)]
        output: PathBuf,

        /// Input and output feature count.
        #[arg(long, default_value_t = 64)]
        features: usize,

        /// Do not embed a runtime memory size hint.
        #[arg(long)]
        no_hint: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { model } => commands::inspect::execute(model),
        Commands::Size { model, heap, json } => {
            let config = commands::load_config(cli.config.as_deref(), heap)?;
            commands::size::execute(model, config, json)
        }
        Commands::Run {
            model,
            heap,
            search,
            buffer,
            iterations,
        } => {
            let config = commands::load_config(cli.config.as_deref(), heap)?;
            commands::run::execute(model, config, search, buffer, iterations)
        }
        Commands::Demo {
            output,
            features,
            no_hint,
        } => commands::demo::execute(output, features, !no_hint),
    }
}
