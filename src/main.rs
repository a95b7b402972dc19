use anyhow::{Context, Result};
use fridge_chef::api_connection::Provider;
use fridge_chef::app::App;
use fridge_chef::cli::{parse_args, run_command, run_interactive, Command};
use fridge_chef::config::AppConfig;
use fridge_chef::logging;
use fridge_chef::meal_store::MealStore;
use fridge_chef::scoring::DailyGoals;
use std::io;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env before reading configuration
    logging::init();

    let cli_args = parse_args();
    let mut config = AppConfig::from_env().context("Failed to read configuration")?;
    if let Some(db) = cli_args.db {
        config.db_path = db;
    }

    let store = MealStore::open(&config.db_path)
        .await
        .with_context(|| format!("Failed to open meal log '{}'", config.db_path.display()))?;
    let provider = Provider::openai_compatible(&config.llm_base_url, &config.api_key_env_var);
    let app = App::new(store, provider, DailyGoals::default());

    let mut stdout = io::stdout();
    match cli_args.command {
        Command::Interactive => {
            let stdin = BufReader::new(tokio::io::stdin());
            run_interactive(&app, &config, stdin, &mut stdout)
                .await
                .context("Interactive session ended with an error")?;
        }
        command => {
            if let Err(e) = run_command(&app, &config, command, &mut stdout).await {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
