use anyhow::{Context, Result};

use sales_forecast::cli::{AppConfig, Cli, Commands};
use sales_forecast::{report, AppState, SalesCache};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::List { data } => {
            let config = AppConfig::resolve(cli.config.as_ref(), data, None, false)?;
            let mut state = AppState::new(SalesCache::new(&config.data_path), config.forecast);

            let stores = state
                .store_ids()
                .with_context(|| format!("loading {}", state.data_path().display()))?;
            let depts = state.dept_ids()?;
            println!("{}", report::render_ids("Stores", &stores));
            println!("{}", report::render_ids("Departments", &depts));
        }
        Commands::Forecast {
            data,
            store,
            dept,
            horizon,
            future_only,
            json,
        } => {
            let config = AppConfig::resolve(cli.config.as_ref(), data, horizon, future_only)?;
            let mut state = AppState::new(SalesCache::new(&config.data_path), config.forecast);

            log::debug!("forecast settings: {:?}", state.config());

            let selection = state
                .select(&store, &dept)
                .with_context(|| format!("loading {}", state.data_path().display()))?;

            if json {
                match &selection.forecast {
                    Ok(points) => println!("{}", serde_json::to_string_pretty(points)?),
                    Err(e) => eprintln!("{}", e.user_message()),
                }
            } else {
                print!("{}", report::render_selection(&selection));
            }

            if selection.forecast.is_err() {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}
