use std::sync::Arc;

use chrono::NaiveDate;
use housing_allocation::allocation::{
    Clock, CsvStorage, FixedClock, FlatOffering, FlatType, HousingService, SystemClock,
};
use housing_allocation::config::AppConfig;
use housing_allocation::error::AppError;
use serde::Serialize;

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Parses `TYPE:UNITS:PRICE`, e.g. `TWO_ROOM:10:350000`.
pub(crate) fn parse_offering(raw: &str) -> Result<FlatOffering, String> {
    let mut parts = raw.split(':').map(str::trim);
    let (Some(flat_type), Some(units), Some(price), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected TYPE:UNITS:PRICE, got '{raw}'"));
    };

    let flat_type = flat_type.parse::<FlatType>()?;
    let units = units
        .parse::<u32>()
        .map_err(|err| format!("invalid unit count '{units}' ({err})"))?;
    let price = price
        .parse::<u32>()
        .map_err(|err| format!("invalid price '{price}' ({err})"))?;
    Ok(FlatOffering::new(flat_type, units, price))
}

pub(crate) fn open_service(
    config: &AppConfig,
    today: Option<NaiveDate>,
) -> Result<HousingService<CsvStorage>, AppError> {
    let storage = CsvStorage::open(&config.storage.data_dir)?;
    let clock: Arc<dyn Clock> = match today {
        Some(date) => Arc::new(FixedClock(date)),
        None => Arc::new(SystemClock),
    };
    Ok(HousingService::load(
        Arc::new(storage),
        clock,
        config.eligibility,
    )?)
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{json}");
    Ok(())
}
