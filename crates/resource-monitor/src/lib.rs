// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # resource-monitor
//!
//! Reads how much memory the operating system can still hand out, so the
//! runtime can bound its arena search when no explicit heap size is
//! configured.
//!
//! Only `/proc/meminfo` is consulted. `MemAvailable` is the kernel's own
//! estimate of what a new allocation can use without swapping, which is the
//! closest host analogue of "bytes left in the platform heap".
//!
//! # Example
//! ```no_run
//! use resource_monitor::MemoryInfo;
//!
//! let mem = MemoryInfo::read().expect("failed to read /proc/meminfo");
//! println!("{} MB available of {} MB", mem.available_mb(), mem.total_mb());
//! ```

mod error;
mod memory;

pub use error::MonitorError;
pub use memory::MemoryInfo;
