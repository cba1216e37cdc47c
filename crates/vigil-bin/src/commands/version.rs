// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The `version` command.

use crate::error::BinResult;

/// Prints version information for all workspace components.
pub fn version() -> BinResult<()> {
    println!("vigil {}", vigil_core::VERSION);
    println!("  {} {}", vigil_core::NAME, vigil_core::VERSION);
    println!("  {} {}", vigil_config::NAME, vigil_config::VERSION);
    println!("  {} {}", vigil_pipeline::NAME, vigil_pipeline::VERSION);
    println!("  {} {}", vigil_proxy::NAME, vigil_proxy::VERSION);

    Ok(())
}
