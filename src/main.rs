use chainpulse::cli::{Cli, Commands};
use chainpulse::config::Config;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    chainpulse::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!(feature = ?args.feature, "starting feature run");
            args.execute(config).await?;
        }
        Commands::List => {
            for feature in chainpulse::features::FEATURES {
                println!("{feature} (topic {})", config.telegram.topic(feature));
            }
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Providers: {}", config.providers.coinglass_base_url);
            println!("  Data dir: {}", config.storage.data_dir.display());
            println!(
                "  Telegram chat: {}",
                if config.telegram.chat_id.is_empty() {
                    "(unset)"
                } else {
                    config.telegram.chat_id.as_str()
                }
            );
            println!("  Whale symbols: {}", config.whale.symbols.join(", "));
        }
    }

    Ok(())
}
