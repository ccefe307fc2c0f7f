// Per-district KPI calculators over the monthly price observations.
//
// Every function here is a pure pass over the full observation slice; a
// metric that cannot be computed from the qualifying rows comes back as
// `None` rather than a NaN or an error.
use crate::types::PriceObservation;
use crate::util::years_between;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Assumed flat size when translating a per-square-meter price into an
/// income requirement.
pub const DEFAULT_SURFACE_M2: f64 = 100.0;

/// Rent is assumed to take at most this share of net income.
pub const RENT_INCOME_SHARE: f64 = 0.4;

/// District selection for the KPI calculators. `All` means no filtering;
/// ranking is undefined for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistrictFilter {
    All,
    Named(String),
}

impl DistrictFilter {
    /// Interpret console input: blank or a case-insensitive `all` selects
    /// the aggregate, anything else names a district.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            DistrictFilter::All
        } else {
            DistrictFilter::Named(trimmed.to_string())
        }
    }

    pub fn matches(&self, district: &str) -> bool {
        match self {
            DistrictFilter::All => true,
            DistrictFilter::Named(name) => name == district,
        }
    }
}

impl std::fmt::Display for DistrictFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistrictFilter::All => write!(f, "All"),
            DistrictFilter::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A price enters the derived metrics only when present and positive.
pub fn valid_price(obs: &PriceObservation) -> Option<f64> {
    obs.rent_price.filter(|p| *p > 0.0)
}

/// Mean of valid prices per district. Districts without a single valid
/// observation are absent from the map, not reported as zero.
pub fn district_averages(observations: &[PriceObservation]) -> HashMap<String, f64> {
    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for obs in observations {
        if let Some(price) = valid_price(obs) {
            let entry = sums.entry(obs.district.clone()).or_insert((0.0, 0));
            entry.0 += price;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(district, (sum, count))| (district, sum / count as f64))
        .collect()
}

/// Min/max of the district means, used to normalize values for map
/// shading. Defaults to `(0.0, 1.0)` on an empty map so the downstream
/// division never hits a zero range.
pub fn rent_range(averages: &HashMap<String, f64>) -> (f64, f64) {
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for value in averages.values() {
        min = min.min(*value);
        max = max.max(*value);
    }
    if averages.is_empty() {
        (0.0, 1.0)
    } else {
        (min, max)
    }
}

/// Scale a value into `[0, 1]` against the district range; a degenerate
/// range maps everything to 0.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max > min {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Compound annual growth rate of rent prices, in percent.
///
/// Only valid prices dated 2012-01-01 or later qualify; at least two
/// qualifying points spanning a positive time interval are required.
pub fn cagr(observations: &[PriceObservation], filter: &DistrictFilter) -> Option<f64> {
    let floor = NaiveDate::from_ymd_opt(2012, 1, 1)?;
    let mut qualifying: Vec<(NaiveDate, f64)> = observations
        .iter()
        .filter(|obs| filter.matches(&obs.district))
        .filter_map(|obs| valid_price(obs).map(|price| (obs.date, price)))
        .filter(|(date, _)| *date >= floor)
        .collect();
    if qualifying.len() < 2 {
        return None;
    }
    qualifying.sort_by_key(|(date, _)| *date);

    let (first_date, first_price) = qualifying[0];
    let (last_date, last_price) = qualifying[qualifying.len() - 1];
    let years = years_between(first_date, last_date);
    if years <= 0.0 {
        return None;
    }
    Some(((last_price / first_price).powf(1.0 / years) - 1.0) * 100.0)
}

pub fn max_price(observations: &[PriceObservation], filter: &DistrictFilter) -> Option<f64> {
    observations
        .iter()
        .filter(|obs| filter.matches(&obs.district))
        .filter_map(valid_price)
        .fold(None, |acc, price| match acc {
            Some(max) if max >= price => Some(max),
            _ => Some(price),
        })
}

/// 1-based position of the district in the descending sort of district
/// means. Undefined for the `All` aggregate and for districts with no
/// valid observations. The sort is stable, so ties keep the order in
/// which districts were first encountered.
pub fn ranking(observations: &[PriceObservation], filter: &DistrictFilter) -> Option<usize> {
    let district = match filter {
        DistrictFilter::All => return None,
        DistrictFilter::Named(name) => name.as_str(),
    };

    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for obs in observations {
        if let Some(price) = valid_price(obs) {
            let entry = sums.entry(obs.district.clone()).or_insert_with(|| {
                order.push(obs.district.clone());
                (0.0, 0)
            });
            entry.0 += price;
            entry.1 += 1;
        }
    }

    let mut means: Vec<(String, f64)> = order
        .into_iter()
        .filter_map(|name| {
            sums.get(&name)
                .map(|(sum, count)| (name.clone(), sum / *count as f64))
        })
        .collect();
    means.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    means
        .iter()
        .position(|(name, _)| name == district)
        .map(|idx| idx + 1)
}

pub fn average_price(observations: &[PriceObservation], filter: &DistrictFilter) -> Option<f64> {
    let valid: Vec<f64> = observations
        .iter()
        .filter(|obs| filter.matches(&obs.district))
        .filter_map(valid_price)
        .collect();
    if valid.is_empty() {
        return None;
    }
    Some(valid.iter().sum::<f64>() / valid.len() as f64)
}

/// Net monthly income needed to rent `surface` square meters at the given
/// average price without spending more than 40% of it on rent.
pub fn required_income(avg_price: Option<f64>, surface: f64) -> Option<f64> {
    avg_price.map(|price| price * surface / RENT_INCOME_SHARE)
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

    #[test]
    fn district_averages_excludes_invalid_prices() {
        let observations = vec![
            obs("2020-01-01", "Centro", Some(15.5)),
            obs("2020-01-01", "Centro", None),
            obs("2020-02-01", "Centro", Some(-2.0)),
            obs("2020-01-01", "Retiro", Some(0.0)),
        ];
        let avgs = district_averages(&observations);
        assert_eq!(avgs.len(), 1);
        assert!((avgs["Centro"] - 15.5).abs() < 1e-9);
        assert!(!avgs.contains_key("Retiro"));
    }

    #[test]
    fn rent_range_defaults_on_empty_map() {
        assert_eq!(rent_range(&HashMap::new()), (0.0, 1.0));
        let mut avgs = HashMap::new();
        avgs.insert("Centro".to_string(), 20.0);
        avgs.insert("Usera".to_string(), 10.0);
        assert_eq!(rent_range(&avgs), (10.0, 20.0));
    }

    #[test]
    fn normalize_guards_degenerate_range() {
        assert_eq!(normalize(5.0, 5.0, 5.0), 0.0);
        assert!((normalize(15.0, 10.0, 20.0) - 0.5).abs() < 1e-9);
        assert_eq!(normalize(25.0, 10.0, 20.0), 1.0);
    }

    #[test]
    fn cagr_two_point_series() {
        let observations = vec![
            obs("2012-01-01", "Centro", Some(10.0)),
            obs("2022-01-01", "Centro", Some(20.0)),
        ];
        let growth = cagr(&observations, &DistrictFilter::All).unwrap();
        // (20/10)^(1/10) - 1 = 7.18% per year.
        assert!((growth - 7.18).abs() < 0.01);
    }

    #[test]
    fn cagr_needs_two_points_after_floor() {
        let observations = vec![
            obs("2010-01-01", "Centro", Some(8.0)),
            obs("2011-06-01", "Centro", Some(9.0)),
            obs("2020-01-01", "Centro", Some(18.0)),
        ];
        assert_eq!(cagr(&observations, &DistrictFilter::All), None);
    }

    #[test]
    fn cagr_rejects_zero_span() {
        let observations = vec![
            obs("2020-01-01", "Centro", Some(10.0)),
            obs("2020-01-01", "Centro", Some(12.0)),
        ];
        assert_eq!(cagr(&observations, &DistrictFilter::All), None);
    }

    #[test]
    fn ranking_unavailable_for_all_and_unknown_districts() {
        let observations = vec![obs("2020-01-01", "Centro", Some(15.0))];
        assert_eq!(ranking(&observations, &DistrictFilter::All), None);
        assert_eq!(
            ranking(&observations, &DistrictFilter::Named("Latina".to_string())),
            None
        );
    }

    #[test]
    fn ranking_orders_by_descending_mean() {
        let observations = vec![
            obs("2020-01-01", "Usera", Some(10.0)),
            obs("2020-01-01", "Centro", Some(18.0)),
            obs("2020-01-01", "Salamanca", Some(24.0)),
        ];
        let rank = |name: &str| ranking(&observations, &DistrictFilter::Named(name.to_string()));
        assert_eq!(rank("Salamanca"), Some(1));
        assert_eq!(rank("Centro"), Some(2));
        assert_eq!(rank("Usera"), Some(3));
    }

    #[test]
    fn ranking_ties_keep_first_encounter_order() {
        let observations = vec![
            obs("2020-01-01", "Tetuan", Some(12.0)),
            obs("2020-01-01", "Latina", Some(12.0)),
        ];
        assert_eq!(
            ranking(&observations, &DistrictFilter::Named("Tetuan".to_string())),
            Some(1)
        );
        assert_eq!(
            ranking(&observations, &DistrictFilter::Named("Latina".to_string())),
            Some(2)
        );
    }

    #[test]
    fn max_and_average_price_respect_filter() {
        let observations = vec![
            obs("2020-01-01", "Centro", Some(15.0)),
            obs("2020-02-01", "Centro", Some(17.0)),
            obs("2020-01-01", "Usera", Some(9.0)),
            obs("2020-01-01", "Usera", None),
        ];
        let centro = DistrictFilter::Named("Centro".to_string());
        assert_eq!(max_price(&observations, &centro), Some(17.0));
        assert_eq!(average_price(&observations, &centro), Some(16.0));
        assert_eq!(max_price(&observations, &DistrictFilter::All), Some(17.0));
        let empty = DistrictFilter::Named("Latina".to_string());
        assert_eq!(max_price(&observations, &empty), None);
        assert_eq!(average_price(&observations, &empty), None);
    }

    #[test]
    fn required_income_propagates_unavailable() {
        assert_eq!(required_income(None, DEFAULT_SURFACE_M2), None);
        let income = required_income(Some(15.0), DEFAULT_SURFACE_M2).unwrap();
        // 15 EUR/m2 * 100 m2 / 0.4 = 3,750 EUR/month.
        assert!((income - 3750.0).abs() < 1e-9);
    }

    #[test]
    fn filter_parse_recognizes_aggregate() {
        assert_eq!(DistrictFilter::parse("  "), DistrictFilter::All);
        assert_eq!(DistrictFilter::parse("ALL"), DistrictFilter::All);
        assert_eq!(
            DistrictFilter::parse(" Centro "),
            DistrictFilter::Named("Centro".to_string())
        );
    }
}
