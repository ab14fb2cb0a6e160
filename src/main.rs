use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use novelrank::app::AppContext;
use novelrank::cli::commands::{self, SettingsUpdate};
use novelrank::cli::{Cli, Commands, SettingsAction};
use novelrank::config::Config;
use novelrank::daemon::Daemon;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    config.fetch.workers = cli.workers_or(config.fetch.workers);

    let ctx = AppContext::new(config, None)?;

    match cli.command {
        Commands::Refresh { force } => {
            commands::refresh(&ctx, force).await?;
        }
        Commands::List {
            category,
            cached,
            json,
        } => {
            commands::list(&ctx, category, cached, json).await?;
        }
        Commands::Status => {
            commands::status(&ctx).await?;
        }
        Commands::Open { rank, category } => {
            commands::open(&ctx, rank, category).await?;
        }
        Commands::Clear => {
            commands::clear(&ctx).await?;
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show => {
                commands::settings_show(&ctx).await?;
            }
            SettingsAction::Set {
                sources,
                interval,
                default_category,
                show_rating,
                show_author,
                show_category,
            } => {
                let update = SettingsUpdate {
                    sources,
                    interval_hours: interval,
                    default_category,
                    show_rating,
                    show_author,
                    show_category,
                };
                commands::settings_set(&ctx, update).await?;
            }
        },
        Commands::Sources => {
            commands::sources(&ctx)?;
        }
        Commands::Daemon {
            every,
            no_initial_update,
            log,
        } => {
            let mut daemon_config = ctx.config.daemon.clone();
            if let Some(minutes) = every {
                daemon_config.check_interval_minutes = minutes;
            }
            if no_initial_update {
                daemon_config.update_on_start = false;
            }
            if log.is_some() {
                daemon_config.log_file = log;
            }

            Daemon::new(Arc::new(ctx), daemon_config).run().await?;
        }
    }

    Ok(())
}
