use std::fs::File;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use plaza::api::FeedKind;
use plaza::app::AppContext;
use plaza::cli::{commands, Cli, Commands};
use plaza::config::Config;

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // The TUI owns the terminal, so logs go to a file when one is given.
    match &cli.log {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let mut config = Config::load()?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    let ctx = AppContext::new(config, None)?;

    match cli.command {
        Commands::Login { email } => {
            commands::login(&ctx, &email).await?;
        }
        Commands::Signup { username, email } => {
            commands::signup(&ctx, &username, &email).await?;
        }
        Commands::Logout => {
            commands::logout(&ctx)?;
        }
        Commands::Whoami => {
            commands::whoami(&ctx);
        }
        Commands::Feed { explore, query } => {
            let kind = if explore {
                FeedKind::Explore
            } else {
                FeedKind::Home
            };
            commands::feed(&ctx, kind, &query).await?;
        }
        Commands::Post {
            title,
            content,
            tags,
            image_url,
        } => {
            commands::create_post(&ctx, &title, &content, tags, image_url).await?;
        }
        Commands::Comments { post_id } => {
            commands::list_comments(&ctx, post_id).await?;
        }
        Commands::Comment { post_id, content } => {
            commands::add_comment(&ctx, post_id, &content).await?;
        }
        Commands::Follow { user_id } => {
            commands::set_following(&ctx, user_id, true).await?;
        }
        Commands::Unfollow { user_id } => {
            commands::set_following(&ctx, user_id, false).await?;
        }
        Commands::Profile { user_id } => {
            commands::show_profile(&ctx, user_id).await?;
        }
        Commands::Tui { location } => {
            plaza::tui::run(Arc::new(ctx), &location).await?;
        }
    }

    Ok(())
}
