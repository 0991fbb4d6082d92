use std::path::PathBuf;

use async_trait::async_trait;
use polars::prelude::DataFrame;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{fetch_cached, CacheStore, Fetcher, HttpFetcher, LocalCache};
use crate::frame::read_csv;
use crate::getter::Getter;

/// US counties: census population estimates and NYT case counts.
///
/// The census file is downloaded once and kept at the cache path; the case
/// file is downloaded on every call since it grows daily.
#[derive(Debug)]
pub struct UsCounties<F = HttpFetcher, S = LocalCache> {
    cases_url: String,
    census_url: String,
    census_cache_path: PathBuf,
    fetcher: F,
    store: S,
}

impl UsCounties {
    pub fn new(config: &Config) -> Self {
        Self::with_parts(config, HttpFetcher::default(), LocalCache)
    }
}

impl<F: Fetcher, S: CacheStore> UsCounties<F, S> {
    pub fn with_parts(config: &Config, fetcher: F, store: S) -> Self {
        Self {
            cases_url: config.cases_url.clone(),
            census_url: config.census_url.clone(),
            census_cache_path: config.census_cache_path.clone(),
            fetcher,
            store,
        }
    }
}

#[async_trait]
impl<F: Fetcher, S: CacheStore> Getter for UsCounties<F, S> {
    async fn population(&self) -> Result<DataFrame> {
        let cached = fetch_cached(
            &self.fetcher,
            &self.store,
            &self.census_url,
            &self.census_cache_path,
        )
        .await?;
        let df = read_csv(cached.bytes)?;
        info!(rows = df.height(), fetched = cached.fetched, "census table ready");
        Ok(df)
    }

    async fn cases(&self) -> Result<DataFrame> {
        info!(url = %self.cases_url, "downloading case data");
        let data = self.fetcher.fetch(&self.cases_url).await?;
        let df = read_csv(data)?;
        info!(rows = df.height(), "case table ready");
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::StaticFetcher;

    const CENSUS: &str = "SUMLEV,STATE,COUNTY,POPESTIMATE2019\n050,36,061,1628701\n";
    const CASES: &str = "date,county,state,fips,cases,deaths\n2021-01-04,New York,New York,36061,10,1\n";

    fn config(dir: &std::path::Path) -> Config {
        Config {
            cases_url: "https://example.test/us-counties.csv".to_string(),
            census_url: "https://example.test/census.csv".to_string(),
            census_cache_path: dir.join("census").join("counties_est2019.csv"),
            output_dir: dir.join("output"),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn census_is_cached_and_cases_are_not() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let fetcher = StaticFetcher::default()
            .with(&config.census_url, CENSUS)
            .with(&config.cases_url, CASES);
        let us = UsCounties::with_parts(&config, fetcher, LocalCache);

        for _ in 0..2 {
            let population = us.population().await.unwrap();
            assert_eq!(population.height(), 1);
            let cases = us.cases().await.unwrap();
            assert_eq!(cases.height(), 1);
        }
        // One census download, two case downloads
        assert_eq!(us.fetcher.calls(), 3);
        assert!(config.census_cache_path.is_file());
    }

    #[tokio::test]
    #[ignore = "downloads the live census and case files"]
    async fn test_us_counties() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            census_cache_path: dir.path().join("counties_est2019.csv"),
            ..Config::default()
        };
        let us = UsCounties::new(&config);
        let population = us.population().await.unwrap();
        println!("{}", population);
        let cases = us.cases().await.unwrap();
        println!("{}", cases);
    }
}
