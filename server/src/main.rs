//! `postbox-server` entry point.
//!
//! Scaffolds the working directory on first run, wires the pipeline
//! (store → mailer → coordinator), and serves the intake loop on the main
//! thread with a tokio runtime alongside for delivery tasks.

use std::sync::Arc;

use anyhow::Context;
use postbox_core::config::Config;
use postbox_core::delivery::DeliveryCoordinator;
use postbox_core::mailer::SmtpMailer;
use postbox_core::store::AppendStore;
use postbox_server::bootstrap;
use postbox_server::intake::Intake;

fn main() -> anyhow::Result<()> {
    let root = std::env::current_dir()
        .context("failed to retrieve the current working directory")?;

    bootstrap::scaffold(&root)
        .with_context(|| format!("failed to scaffold working directory {}", root.display()))?;
    let _log_guards = bootstrap::init_logging(&root);

    let config = Config::load(root.join(bootstrap::CONFIG_FILE)).with_context(|| {
        format!(
            "failed to load {} (fill it in after the first run)",
            bootstrap::CONFIG_FILE
        )
    })?;

    let store = Arc::new(
        AppendStore::open(root.join(bootstrap::STORAGE_FILE))
            .with_context(|| format!("failed to open {}", bootstrap::STORAGE_FILE))?,
    );
    let mailer =
        Arc::new(SmtpMailer::from_config(&config.smtp).context("invalid smtp configuration")?);
    let coordinator = Arc::new(DeliveryCoordinator::new(store, mailer));

    let homepage = std::fs::read(root.join(bootstrap::HOMEPAGE_FILE))
        .with_context(|| format!("failed to read {}", bootstrap::HOMEPAGE_FILE))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the tokio runtime")?;

    let intake = Intake::new(
        coordinator,
        runtime.handle().clone(),
        homepage,
        root.join(bootstrap::STATIC_DIR),
    );

    let address = config.address();
    let server = tiny_http::Server::http(&address)
        .map_err(|error| anyhow::anyhow!("failed to bind {address}: {error}"))?;

    tracing::info!("starting HTTP server on {address}");
    println!("Starting HTTP server on {address}");

    intake.serve(server);
    Ok(())
}
