//! pokeshop-entry - Host server composing the Pokémon shop from its micro-frontends
//!
//! Serves the shop pages, composing each one on the server from the
//! fragments the catalog, cart and checkout micro-frontends publish.

mod cli;
mod elements;
mod error;
mod logging;
mod server;
mod views;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::error::CliError;
use crate::logging::{init_tracing, log_event_with_tracing};
use crate::server::AppState;
use crate::views::{PageRenderer, Views};
use clap::Parser;
use pokeshop_compose::Template;
use pokeshop_config::Config;
use pokeshop_errors::Error;
use pokeshop_events::{EventEmitter, EventReceiver, EventSender};
use pokeshop_metadata::MetadataResolver;
use pokeshop_net::{NetClient, NetConfig};
use std::collections::BTreeMap;
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info};

/// Origin used for the header's cart counter when no source is configured
const DEFAULT_CART_ORIGIN: &str = "http://localhost:3001/";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.json, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting pokeshop-entry v{}", env!("CARGO_PKG_VERSION"));

    // 1. File config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Environment variables
    config.merge_env()?;

    // 3. CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global, &cli.command)?;

    let (event_sender, event_receiver) = pokeshop_events::channel();

    execute_command_with_events(cli.command, config, event_sender, event_receiver).await?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    config: Config,
    event_sender: EventSender,
    mut event_receiver: EventReceiver,
) -> Result<(), CliError> {
    let mut command_future = Box::pin(execute_command(command, config, event_sender));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(message) = event_receiver.try_recv() {
                    log_event_with_tracing(&message);
                }
                return result;
            }

            message = event_receiver.recv() => match message {
                Some(message) => log_event_with_tracing(&message),
                None => return (&mut command_future).await,
            },
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    config: Config,
    tx: EventSender,
) -> Result<(), CliError> {
    let client = NetClient::new(NetConfig::from(&config.network))?;

    match command {
        Commands::Serve { .. } => serve(config, client, tx).await,

        Commands::Render {
            template,
            set,
            output,
            ..
        } => {
            let template = Template::load(&template).await?;
            let context: BTreeMap<String, String> = set.into_iter().collect();
            let metadata = Arc::new(
                pokeshop_metadata::register(&client, &config.metadata.sources, &tx).await,
            );
            let renderer = PageRenderer::new(
                client,
                config.fragments.clone(),
                elements::shop_elements(cart_origin(&config))?,
                tx,
            );

            let page = renderer.render(&template, metadata, &context).await?;

            match output {
                Some(path) => tokio::fs::write(&path, &page.html).await?,
                None => println!("{}", page.html),
            }

            if page.is_fatal() {
                return Err(CliError::FatalFragment(page.fatal));
            }
            Ok(())
        }

        Commands::Metadata => {
            let metadata =
                pokeshop_metadata::register(&client, &config.metadata.sources, &tx).await;
            let json =
                serde_json::to_string_pretty(metadata.event_map()).map_err(Error::from)?;
            println!("{json}");
            Ok(())
        }
    }
}

/// Run the host server until interrupted
async fn serve(config: Config, client: NetClient, tx: EventSender) -> Result<(), CliError> {
    info!("Registering dependencies");
    let metadata = MetadataResolver::of(client.clone(), config.metadata.sources.clone(), tx.clone());
    metadata.wait().await;
    let refresh = config
        .metadata
        .refresh_interval()
        .map(|interval| metadata.spawn_refresh(interval));

    let state = AppState {
        metadata,
        renderer: PageRenderer::new(
            client,
            config.fragments.clone(),
            elements::shop_elements(cart_origin(&config))?,
            tx.clone(),
        ),
        views: Views::new(config.server.template_dir.clone()),
    };
    let app = server::router(state, &config.server.static_dir);

    info!("starting server");
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("listening on http://{}", listener.local_addr()?);
    tx.emit_operation_started("serve");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(refresh) = refresh {
        refresh.abort();
    }
    if let Err(e) = &served {
        tx.emit_error(format!("server stopped: {e}"));
    }
    tx.emit_operation_completed("serve", served.is_ok());
    served.map_err(CliError::from)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

/// The cart micro-frontend also publishes the first metadata source
fn cart_origin(config: &Config) -> &str {
    config
        .metadata
        .sources
        .first()
        .map_or(DEFAULT_CART_ORIGIN, String::as_str)
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(
    config: &mut Config,
    global: &GlobalArgs,
    command: &Commands,
) -> Result<(), CliError> {
    if !global.metadata_sources.is_empty() {
        config.metadata.sources.clone_from(&global.metadata_sources);
    }

    match command {
        Commands::Serve {
            bind,
            static_dir,
            template_dir,
        } => {
            if let Some(bind) = bind {
                config.server.bind.clone_from(bind);
            }
            if let Some(dir) = static_dir {
                config.server.static_dir.clone_from(dir);
            }
            if let Some(dir) = template_dir {
                config.server.template_dir.clone_from(dir);
            }
        }
        Commands::Render { environment, .. } => {
            if let Some(environment) = environment {
                config.fragments.environment = *environment;
            }
        }
        Commands::Metadata => {}
    }

    config
        .validate()
        .map_err(|e| CliError::InvalidArguments(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokeshop_types::RenderEnvironment;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "pokeshop-entry",
            "--metadata-source",
            "http://localhost:3002/",
            "serve",
            "--bind",
            "0.0.0.0:8080",
        ]);
        let mut config = Config::default();

        apply_cli_config(&mut config, &cli.global, &cli.command).unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.metadata.sources, vec!["http://localhost:3002/"]);
        assert_eq!(cart_origin(&config), "http://localhost:3002/");
    }

    #[test]
    fn test_render_environment_override() {
        let cli = Cli::parse_from([
            "pokeshop-entry",
            "render",
            "page.html",
            "--environment",
            "browser",
        ]);
        let mut config = Config::default();

        apply_cli_config(&mut config, &cli.global, &cli.command).unwrap();

        assert_eq!(config.fragments.environment, RenderEnvironment::Browser);
    }

    #[test]
    fn test_blank_metadata_source_is_rejected() {
        let cli = Cli::parse_from(["pokeshop-entry", "--metadata-source", " ", "metadata"]);
        let mut config = Config::default();

        let err = apply_cli_config(&mut config, &cli.global, &cli.command).unwrap_err();

        assert!(matches!(err, CliError::InvalidArguments(_)));
    }

    #[test]
    fn test_cart_origin_default() {
        let mut config = Config::default();
        config.metadata.sources.clear();
        assert_eq!(cart_origin(&config), DEFAULT_CART_ORIGIN);
    }
}
