// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The `serve` command.

use std::sync::Arc;

use tracing::info;

use vigil_config::ConfigLoader;
use vigil_pipeline::{
    register_builtins, JwkStore, MechanismCatalog, MechanismFactoryRegistry, RuleTable,
};
use vigil_proxy::AppState;

use crate::cli::{Cli, ServeArgs};
use crate::error::BinResult;
use crate::logging::init_logging;

/// Loads the configuration, builds the pipeline and serves the decision
/// endpoint until a shutdown signal arrives.
pub async fn serve(cli: &Cli, args: ServeArgs) -> BinResult<()> {
    let config = ConfigLoader::new().load(&cli.config)?;

    init_logging(
        cli.effective_log_level(&config.log),
        cli.effective_log_format(&config.log),
    );
    info!(version = vigil_core::VERSION, config = %cli.config.display(), "starting vigil");

    let jwks = Arc::new(JwkStore::with_default_ttl(config.cache.jwks_ttl));
    let mut registry = MechanismFactoryRegistry::new();
    register_builtins(&mut registry, jwks);

    let catalog = MechanismCatalog::from_config(&registry, &config.pipeline)?;
    let table = RuleTable::from_config(&config.rules, &catalog)?;
    info!(rules = table.len(), "pipeline configured");

    if args.dry_run {
        info!("dry run requested, not binding the listener");
        return Ok(());
    }

    let state = AppState::new(table, &config.serve);

    let shutdown = state.shutdown_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            shutdown.cancel();
        }
    });

    vigil_proxy::serve(state, &config.serve).await?;
    info!("vigil stopped");

    Ok(())
}
