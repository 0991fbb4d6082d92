use async_trait::async_trait;
use polars::prelude::DataFrame;

use crate::error::Result;

/// Gets population and case data for a given country.
#[async_trait]
pub trait Getter: Send + Sync {
    /// Gets the population reference table.
    async fn population(&self) -> Result<DataFrame>;
    /// Gets the case and death counts, one row per region per day.
    async fn cases(&self) -> Result<DataFrame>;
}
