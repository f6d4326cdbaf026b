// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared CLI plumbing.

pub mod demo;
pub mod inspect;
pub mod run;
pub mod size;

use anyhow::Context;
use resource_monitor::MemoryInfo;
use runtime::RuntimeConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs the `fmt` subscriber. `RUST_LOG` takes precedence over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 1)
        .init();
}

/// Reads the runtime config (or defaults) and applies a heap override.
pub fn load_config(path: Option<&Path>, heap: Option<String>) -> anyhow::Result<RuntimeConfig> {
    let mut config = match path {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => RuntimeConfig::default(),
    };
    if heap.is_some() {
        config.heap_size = heap;
    }
    Ok(config)
}

/// Prints the host memory the heap is sized from when no `heap_size` is set.
pub(crate) fn print_host_memory(config: &RuntimeConfig) {
    if config.heap_size.is_some() {
        return;
    }
    match MemoryInfo::read() {
        Ok(mem) => println!(
            "  Host:    {} MB available of {} MB ({:.0}% used)",
            mem.available_mb(),
            mem.total_mb(),
            mem.utilisation() * 100.0,
        ),
        Err(e) => tracing::warn!("cannot read host memory: {e}"),
    }
}

/// Prints the boxed banner every subcommand opens with.
pub(crate) fn banner(title: &str) {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║ {:^52} ║", format!("arena-rt · {title}"));
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
}
