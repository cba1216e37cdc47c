// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Vigil - identity-aware access decision proxy.
//!
//! Main binary entry point.

use clap::Parser;

use vigil_bin::cli::Cli;
use vigil_bin::commands;
use vigil_bin::error::report_error_and_exit;

/// Application entry point.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(error) = commands::execute(cli).await {
        report_error_and_exit(error);
    }
}
