// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The `validate` command.

use std::sync::Arc;

use vigil_config::ConfigLoader;
use vigil_pipeline::{
    register_builtins, JwkStore, MechanismCatalog, MechanismFactoryRegistry, RuleTable,
};

use crate::cli::{Cli, ValidateArgs};
use crate::error::BinResult;

/// Parses the configuration and builds every prototype and rule, reporting
/// configuration errors without serving.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config = ConfigLoader::new().load(&cli.config)?;

    let mut registry = MechanismFactoryRegistry::new();
    register_builtins(&mut registry, Arc::new(JwkStore::new()));

    let catalog = MechanismCatalog::from_config(&registry, &config.pipeline)?;
    let table = RuleTable::from_config(&config.rules, &catalog)?;

    println!(
        "Configuration OK: {} rule(s), listening on {}",
        table.len(),
        config.serve.bind_address()
    );

    if args.show_rules {
        for rule in &config.rules {
            println!("  {} -> {}", rule.id, rule.matcher.url);
        }
    }

    Ok(())
}
