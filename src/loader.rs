// Loading and cleaning of the three data sources. All parse-level
// problems degrade per-field or per-row; `Err` is reserved for a source
// that cannot be read at all, and any such failure aborts the whole load.
use crate::types::{Dataset, PriceObservation, RawPriceRow, RawYearlyRow, YearlyIncomeObservation};
use crate::util::{parse_date_safe, parse_f64_safe, parse_i32_safe};
use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use geojson::{FeatureCollection, GeoJson};
use std::collections::HashSet;
use std::fs;

pub const PRICES_PATH: &str = "data/prices.csv";
pub const YEARLY_PATH: &str = "data/Youth_Salary_vs_Rent_Prices.csv";
pub const BOUNDARIES_PATH: &str = "data/DistritosMadrid.geojson";

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub price_rows: usize,
    pub price_records: usize,
    pub null_prices: usize,
    pub yearly_rows: usize,
    pub yearly_records: usize,
    pub districts: usize,
    pub boundary_features: usize,
}

/// Parse the monthly price table.
///
/// - A record needs a parsable date and a non-empty district; anything
///   else is dropped.
/// - An empty or unparsable price cell becomes `None`, never an error.
pub fn parse_prices(text: &str) -> Vec<PriceObservation> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = Vec::new();
    for result in reader.deserialize::<RawPriceRow>() {
        let Ok(row) = result else { continue };
        let Some(date) = parse_date_safe(row.date.as_deref()) else {
            continue;
        };
        let district = row
            .district
            .map(|d| d.trim().to_string())
            .unwrap_or_default();
        if district.is_empty() {
            continue;
        }
        let district_code = row
            .district_code
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        records.push(PriceObservation {
            date,
            district,
            district_code,
            rent_price: parse_f64_safe(row.rent_price.as_deref()),
        });
    }
    records
}

/// Parse the yearly salary/rent table. Rows whose year (or either amount)
/// fails to parse are silently dropped.
pub fn parse_yearly(text: &str) -> Vec<YearlyIncomeObservation> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = Vec::new();
    for result in reader.deserialize::<RawYearlyRow>() {
        let Ok(row) = result else { continue };
        let Some(year) = parse_i32_safe(row.year.as_deref()) else {
            continue;
        };
        let Some(avg_youth_salary) = parse_f64_safe(row.avg_youth_salary.as_deref()) else {
            continue;
        };
        let Some(avg_monthly_rent) = parse_f64_safe(row.avg_monthly_rent.as_deref()) else {
            continue;
        };
        records.push(YearlyIncomeObservation {
            year,
            avg_youth_salary,
            avg_monthly_rent,
        });
    }
    records
}

/// Validate the district boundary file. The geometries are carried
/// opaquely for map-drawing consumers; only the collection shape is
/// checked here.
pub fn parse_boundaries(text: &str) -> Result<FeatureCollection> {
    let geo: GeoJson = text
        .parse()
        .context("boundary file is not valid GeoJSON")?;
    match geo {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        _ => bail!("boundary file must be a GeoJSON FeatureCollection"),
    }
}

fn data_row_count(text: &str) -> usize {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .count()
        .saturating_sub(1)
}

/// Load all three sources with all-or-nothing semantics: if any file
/// cannot be read or the boundary file fails validation, no partial
/// dataset is produced.
pub fn load_all(
    prices_path: &str,
    yearly_path: &str,
    boundaries_path: &str,
) -> Result<(Dataset, LoadReport)> {
    let prices_text = fs::read_to_string(prices_path)
        .with_context(|| format!("failed to read {}", prices_path))?;
    let yearly_text = fs::read_to_string(yearly_path)
        .with_context(|| format!("failed to read {}", yearly_path))?;
    let boundaries_text = fs::read_to_string(boundaries_path)
        .with_context(|| format!("failed to read {}", boundaries_path))?;

    let prices = parse_prices(&prices_text);
    let yearly = parse_yearly(&yearly_text);
    let boundaries = parse_boundaries(&boundaries_text)
        .with_context(|| format!("failed to parse {}", boundaries_path))?;

    let districts: HashSet<&str> = prices.iter().map(|p| p.district.as_str()).collect();
    let report = LoadReport {
        price_rows: data_row_count(&prices_text),
        price_records: prices.len(),
        null_prices: prices.iter().filter(|p| p.rent_price.is_none()).count(),
        yearly_rows: data_row_count(&yearly_text),
        yearly_records: yearly.len(),
        districts: districts.len(),
        boundary_features: boundaries.features.len(),
    };

    let dataset = Dataset {
        prices,
        yearly,
        boundaries,
    };
    Ok((dataset, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::district_averages;

    #[test]
    fn price_round_trip_keeps_null_prices() {
        let text = "Date,District,COD_DIS,Rent_Price\n\
                    2020-01-01,Centro,01,15.5\n\
                    2020-01-01,Centro,01,\n";
        let records = parse_prices(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rent_price, Some(15.5));
        assert_eq!(records[1].rent_price, None);
        assert_eq!(records[1].district_code, "01");

        let avgs = district_averages(&records);
        assert_eq!(avgs.len(), 1);
        assert!((avgs["Centro"] - 15.5).abs() < 1e-9);
    }

    #[test]
    fn price_rows_without_date_or_district_are_dropped() {
        let text = "Date,District,COD_DIS,Rent_Price\n\
                    not-a-date,Centro,01,15.5\n\
                    2020-01-01,,01,15.5\n\
                    2020-01-01,Retiro,03,12.0\n";
        let records = parse_prices(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].district, "Retiro");
    }

    #[test]
    fn unparsable_price_degrades_to_none() {
        let text = "Date,District,COD_DIS,Rent_Price\n\
                    2020-01-01,Centro,01,n/a\n";
        let records = parse_prices(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rent_price, None);
    }

    #[test]
    fn yearly_rows_with_bad_years_are_dropped() {
        let text = "Year,Average_Youth_Salary,Average_Monthly_Rent\n\
                    2019,1020.5,890.0\n\
                    unknown,1040.0,910.0\n\
                    2021,1055.0,960.0\n";
        let records = parse_yearly(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].year, 2019);
        assert_eq!(records[1].year, 2021);
    }

    #[test]
    fn boundaries_must_be_a_feature_collection() {
        let collection = r#"{"type":"FeatureCollection","features":[]}"#;
        assert!(parse_boundaries(collection).is_ok());
        let point = r#"{"type":"Point","coordinates":[0.0,0.0]}"#;
        assert!(parse_boundaries(point).is_err());
    }
}
