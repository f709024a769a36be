use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quarry::app::AppContext;
use quarry::cli::{apply_fetch_flags, commands, Cli, Commands};
use quarry::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; progress lines stay on stdout
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quarry=info")))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Fetch {
            catalog,
            output,
            interactive,
            headless,
            profile_dir,
            report,
        } => {
            apply_fetch_flags(&mut config, &output, interactive, headless, profile_dir.as_ref());
            let ctx = AppContext::new(config)?;
            commands::fetch(&ctx, &catalog, report.as_deref()).await?;
        }
        Commands::Download { list, output } => {
            output.apply(&mut config);
            let ctx = AppContext::new(config)?;
            commands::download(&ctx, &list).await?;
        }
        Commands::Parse { catalog } => {
            let ctx = AppContext::new(config)?;
            commands::parse(&ctx, &catalog)?;
        }
    }

    Ok(())
}
