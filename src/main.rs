use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use covid_counties::{Config, UsCounties};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::default();
    let run_date = Local::now().date_naive();
    let us = UsCounties::new(&config);

    let summary = covid_counties::run(&us, &config, run_date)
        .await
        .with_context(|| format!("summary run for {run_date} failed"))?;

    for region in &summary.dropped.regions {
        warn!(region = %region, "no census population; left out of the summaries");
    }
    info!(
        path = %summary.daily_path.display(),
        rows = summary.daily_rows,
        "daily summary"
    );
    info!(
        path = %summary.weekly_path.display(),
        rows = summary.weekly_rows,
        "weekly summary"
    );
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "covid_counties=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
