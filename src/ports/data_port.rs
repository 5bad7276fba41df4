//! Market-data access port trait.
//!
//! Implementations own fetching, caching, and freshness; the engine only
//! consumes the resulting ordered series.

use chrono::NaiveDate;

use crate::domain::error::DivtraderError;
use crate::domain::series::ClosePoint;

pub trait DataPort {
    fn fetch_closes(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ClosePoint>, DivtraderError>;

    fn list_codes(&self) -> Result<Vec<String>, DivtraderError>;

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, DivtraderError>;
}
