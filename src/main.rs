use cbp_stats::cli::{AskArgs, Cli, Commands, Context};
use cbp_stats::config::Config;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Credentials may live in a .env file next to the binary
    dotenv::dotenv().ok();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            Config::example()?
        }
    };

    // Initialize telemetry
    let _telemetry = cbp_stats::telemetry::init_telemetry(&config.telemetry)?;

    if let Some(Commands::Config) = cli.command {
        println!("Current configuration:");
        println!(
            "  Exchange: {} (quote {})",
            config.exchange.base_url, config.exchange.quote_currency
        );
        println!(
            "  Fetch: page_size={}, timeout={}s, retries={}, concurrency={}",
            config.fetch.page_size,
            config.fetch.request_timeout_secs,
            config.fetch.max_retries,
            config.fetch.max_concurrency
        );
        match config.fetch.max_fetch_secs {
            Some(secs) => println!("  Fetch deadline: {}s", secs),
            None => println!("  Fetch deadline: none"),
        }
        println!("  Min balance: {}", config.display.min_balance);
        println!(
            "  Logging: {} ({:?})",
            config.telemetry.log_level, config.telemetry.log_format
        );
        return Ok(());
    }

    let ctx = Context::new(config)?;

    match cli.command {
        Some(Commands::Balance(args)) => args.execute(&ctx).await?,
        Some(Commands::Ask(args)) => args.execute(&ctx).await?,
        Some(Commands::Stats(args)) => {
            tracing::info!(coin = %args.coin, "Computing averages");
            args.execute(&ctx).await?;
        }
        Some(Commands::Compare(args)) => args.execute(&ctx).await?,
        Some(Commands::Config) => {}
        None => AskArgs::default().execute(&ctx).await?,
    }

    Ok(())
}
