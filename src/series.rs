// Time-series shaping for the trend charts: per-(date, district) means
// plus the citywide aggregate line.
use crate::metrics::valid_price;
use crate::types::{PriceObservation, YearlyIncomeObservation};
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub district: String,
    pub mean_price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverallPoint {
    pub date: NaiveDate,
    pub mean_price: f64,
}

#[derive(Debug, Clone)]
pub struct TimeSeries {
    pub series: Vec<SeriesPoint>,
    pub overall: Vec<OverallPoint>,
}

/// Group valid observations by (date, district) and average each group,
/// then average those means per date for the citywide line.
///
/// A non-empty `selected_districts` restricts `series` only; `overall` is
/// always computed across every district, so the aggregate trend line does
/// not move when the selection changes.
pub fn shape_time_series(
    observations: &[PriceObservation],
    selected_districts: &[String],
) -> TimeSeries {
    let mut groups: HashMap<(NaiveDate, String), (f64, usize)> = HashMap::new();
    for obs in observations {
        if let Some(price) = valid_price(obs) {
            let entry = groups
                .entry((obs.date, obs.district.clone()))
                .or_insert((0.0, 0));
            entry.0 += price;
            entry.1 += 1;
        }
    }

    let mut series: Vec<SeriesPoint> = groups
        .into_iter()
        .map(|((date, district), (sum, count))| SeriesPoint {
            date,
            district,
            mean_price: sum / count as f64,
        })
        .collect();

    let mut by_date: HashMap<NaiveDate, (f64, usize)> = HashMap::new();
    for point in &series {
        let entry = by_date.entry(point.date).or_insert((0.0, 0));
        entry.0 += point.mean_price;
        entry.1 += 1;
    }
    let mut overall: Vec<OverallPoint> = by_date
        .into_iter()
        .map(|(date, (sum, count))| OverallPoint {
            date,
            mean_price: sum / count as f64,
        })
        .collect();
    overall.sort_by_key(|point| point.date);

    if !selected_districts.is_empty() {
        series.retain(|point| selected_districts.contains(&point.district));
    }
    series.sort_by(|a, b| (a.date, &a.district).cmp(&(b.date, &b.district)));

    TimeSeries { series, overall }
}

#[derive(Debug, Clone)]
pub struct YearlyBurden {
    pub year: i32,
    pub avg_youth_salary: f64,
    pub avg_monthly_rent: f64,
    pub burden_pct: f64,
}

/// Rent burden per year: monthly rent as a share of monthly youth salary.
/// Years with a non-positive salary are skipped rather than reported as
/// infinite.
pub fn yearly_burden(rows: &[YearlyIncomeObservation]) -> Vec<YearlyBurden> {
    rows.iter()
        .filter(|row| row.avg_youth_salary > 0.0)
        .map(|row| YearlyBurden {
            year: row.year,
            avg_youth_salary: row.avg_youth_salary,
            avg_monthly_rent: row.avg_monthly_rent,
            burden_pct: row.avg_monthly_rent / row.avg_youth_salary * 100.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(date: &str, district: &str, rent_price: Option<f64>) -> PriceObservation {
        PriceObservation {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            district: district.to_string(),
            district_code: "00".to_string(),
            rent_price,
        }
    }

    fn sample() -> Vec<PriceObservation> {
        vec![
            obs("2020-01-01", "Centro", Some(14.0)),
            obs("2020-01-01", "Centro", Some(16.0)),
            obs("2020-01-01", "Retiro", Some(12.0)),
            obs("2020-02-01", "Centro", Some(18.0)),
            obs("2020-02-01", "Retiro", None),
        ]
    }

    #[test]
    fn one_point_per_date_district_group() {
        let shaped = shape_time_series(&sample(), &[]);
        assert_eq!(shaped.series.len(), 3);
        let centro_jan = shaped
            .series
            .iter()
            .find(|p| p.district == "Centro" && p.date.to_string() == "2020-01-01")
            .unwrap();
        assert!((centro_jan.mean_price - 15.0).abs() < 1e-9);
    }

    #[test]
    fn overall_covers_every_date_with_valid_data() {
        let shaped = shape_time_series(&sample(), &[]);
        // Two distinct dates carry at least one valid observation.
        assert_eq!(shaped.overall.len(), 2);
        // January: mean of the Centro mean (15.0) and Retiro mean (12.0).
        assert!((shaped.overall[0].mean_price - 13.5).abs() < 1e-9);
        // February: only Centro has valid data.
        assert!((shaped.overall[1].mean_price - 18.0).abs() < 1e-9);
    }

    #[test]
    fn selection_filters_series_but_not_overall() {
        let unfiltered = shape_time_series(&sample(), &[]);
        let filtered = shape_time_series(&sample(), &["Centro".to_string()]);
        assert!(filtered.series.iter().all(|p| p.district == "Centro"));
        assert_eq!(filtered.series.len(), 2);
        assert_eq!(filtered.overall, unfiltered.overall);
    }

    #[test]
    fn series_sorted_ascending_by_date() {
        let shaped = shape_time_series(&sample(), &[]);
        for pair in shaped.series.windows(2) {
            assert!(pair[0].date <= pair[1].date);
        }
    }

    #[test]
    fn burden_skips_non_positive_salaries() {
        let rows = vec![
            YearlyIncomeObservation {
                year: 2020,
                avg_youth_salary: 1000.0,
                avg_monthly_rent: 900.0,
            },
            YearlyIncomeObservation {
                year: 2021,
                avg_youth_salary: 0.0,
                avg_monthly_rent: 950.0,
            },
        ];
        let burdens = yearly_burden(&rows);
        assert_eq!(burdens.len(), 1);
        assert_eq!(burdens[0].year, 2020);
        assert!((burdens[0].burden_pct - 90.0).abs() < 1e-9);
    }
}
