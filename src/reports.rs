// Report shaping: turns the metric, series, and policy outputs into the
// row vectors the CLI previews and exports.
use crate::metrics::{
    average_price, cagr, max_price, ranking, required_income, valid_price, DistrictFilter,
    DEFAULT_SURFACE_M2,
};
use crate::policy::{self, PolicyScenario, RevenueProjection};
use crate::series::{TimeSeries, YearlyBurden};
use crate::types::{
    AffordabilityRow, BurdenBreakdownRow, CitywideTrendRow, CostEffectivenessRow,
    DistrictSummaryRow, FiscalSummary, PriceObservation, RentControlRow, RevenueYearRow,
    TenantBurdenRow, TrendRow,
};
use crate::util::{average, fmt_metric, format_number, median};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Per-district market table, ranked by descending average rent. The rank
/// column matches what `metrics::ranking` reports for each district.
pub fn district_summary(prices: &[PriceObservation]) -> Vec<DistrictSummaryRow> {
    let mut order: Vec<String> = Vec::new();
    let mut samples: HashMap<String, Vec<f64>> = HashMap::new();
    for obs in prices {
        if let Some(price) = valid_price(obs) {
            samples
                .entry(obs.district.clone())
                .or_insert_with(|| {
                    order.push(obs.district.clone());
                    Vec::new()
                })
                .push(price);
        }
    }

    let mut prepared: Vec<(String, Vec<f64>, f64)> = order
        .into_iter()
        .filter_map(|district| {
            samples
                .remove(&district)
                .map(|values| {
                    let mean = average(&values);
                    (district, values, mean)
                })
        })
        .collect();
    prepared.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));

    prepared
        .into_iter()
        .enumerate()
        .map(|(idx, (district, values, mean))| {
            let max = values.iter().copied().fold(f64::MIN, f64::max);
            let growth = cagr(prices, &DistrictFilter::Named(district.clone()));
            let income = required_income(Some(mean), DEFAULT_SURFACE_M2);
            DistrictSummaryRow {
                rank: idx + 1,
                district,
                samples: values.len(),
                avg_rent: format_number(mean, 2),
                median_rent: format_number(median(values), 2),
                max_rent: format_number(max, 2),
                cagr_pct: fmt_metric(growth, 2),
                required_income: fmt_metric(income, 2),
            }
        })
        .collect()
}

pub fn rent_trend(shaped: &TimeSeries) -> Vec<TrendRow> {
    shaped
        .series
        .iter()
        .map(|point| TrendRow {
            date: point.date,
            district: point.district.clone(),
            mean_rent: format_number(point.mean_price, 2),
        })
        .collect()
}

pub fn citywide_trend(shaped: &TimeSeries) -> Vec<CitywideTrendRow> {
    shaped
        .overall
        .iter()
        .map(|point| CitywideTrendRow {
            date: point.date,
            mean_rent: format_number(point.mean_price, 2),
        })
        .collect()
}

pub fn youth_affordability(burdens: &[YearlyBurden]) -> Vec<AffordabilityRow> {
    burdens
        .iter()
        .map(|b| AffordabilityRow {
            year: b.year,
            avg_youth_salary: format_number(b.avg_youth_salary, 2),
            avg_monthly_rent: format_number(b.avg_monthly_rent, 2),
            burden_pct: format_number(b.burden_pct, 1),
        })
        .collect()
}

pub fn rent_control(scenario: &PolicyScenario) -> Vec<RentControlRow> {
    policy::rent_control_impact(scenario)
        .into_iter()
        .map(|impact| RentControlRow {
            district: impact.name.to_string(),
            before_control: format_number(impact.before, 2),
            after_control: format_number(impact.after, 2),
            reduction_pct: format_number(impact.reduction_pct, 1),
        })
        .collect()
}

pub fn tenant_burden(scenario: &PolicyScenario) -> Vec<TenantBurdenRow> {
    policy::burden_improvement(scenario)
        .into_iter()
        .map(|impact| TenantBurdenRow {
            category: impact.name.to_string(),
            before_burden_pct: format_number(impact.before, 1),
            after_burden_pct: format_number(impact.after, 1),
            improvement_pct: format_number(impact.improvement_pct, 1),
        })
        .collect()
}

pub fn burden_breakdown(scenario: &PolicyScenario) -> Vec<BurdenBreakdownRow> {
    scenario
        .district_burdens
        .iter()
        .map(|b| BurdenBreakdownRow {
            district: b.name.to_string(),
            youth_before_pct: format_number(b.youth_before, 1),
            youth_after_pct: format_number(b.youth_after, 1),
            low_income_before_pct: format_number(b.low_income_before, 1),
            low_income_after_pct: format_number(b.low_income_after, 1),
        })
        .collect()
}

pub fn revenue_schedule(
    scenario: &PolicyScenario,
    projection: &RevenueProjection,
) -> Vec<RevenueYearRow> {
    let mut cumulative = 0.0;
    scenario
        .horizon_years
        .iter()
        .zip(projection.without_program.iter())
        .zip(projection.with_program.iter())
        .zip(projection.diff.iter())
        .map(|(((year, without), with), diff)| {
            cumulative += diff;
            RevenueYearRow {
                year: *year,
                without_program: format_number(*without, 1),
                with_program: format_number(*with, 1),
                extra_gain: format_number(*diff, 1),
                cumulative_gain: format_number(cumulative, 1),
            }
        })
        .collect()
}

pub fn district_cost_effectiveness(scenario: &PolicyScenario) -> Vec<CostEffectivenessRow> {
    let ratios = policy::cost_effectiveness(scenario);
    scenario
        .programs
        .iter()
        .zip(ratios)
        .map(|(program, ratio)| CostEffectivenessRow {
            district: program.name.to_string(),
            affordability_pct: format_number(program.affordability_improvement, 1),
            incentive_cost: format_number(program.incentive_cost, 0),
            roi_ratio: format_number(ratio.ratio, 2),
            complexity: program.complexity,
        })
        .collect()
}

pub fn fiscal_summary(
    scenario: &PolicyScenario,
    incentive_budget: f64,
    tax_savings: f64,
    projection: &RevenueProjection,
) -> FiscalSummary {
    FiscalSummary {
        incentive_budget,
        tax_savings,
        landlord_net_gain: policy::landlord_net_gain(tax_savings),
        cumulative_gain: projection.cumulative_diff,
        roi_pct: policy::roi(projection.cumulative_diff, incentive_budget),
        payback_years: policy::payback_period(&projection.diff, incentive_budget),
        revenue_growth_pct: policy::revenue_growth(projection),
        social_impact: scenario.social_impact,
        budget_flow: policy::budget_flow(scenario, incentive_budget),
    }
}

/// KPI block for the market overview console output.
pub struct MarketKpis {
    pub cagr_pct: Option<f64>,
    pub max_rent: Option<f64>,
    pub ranking: Option<usize>,
    pub avg_rent: Option<f64>,
    pub required_income: Option<f64>,
}

pub fn market_kpis(prices: &[PriceObservation], filter: &DistrictFilter) -> MarketKpis {
    let avg = average_price(prices, filter);
    MarketKpis {
        cagr_pct: cagr(prices, filter),
        max_rent: max_price(prices, filter),
        ranking: ranking(prices, filter),
        avg_rent: avg,
        required_income: required_income(avg, DEFAULT_SURFACE_M2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::MADRID_SCENARIO;
    use crate::series::shape_time_series;
    use chrono::NaiveDate;

    fn obs(date: &str, district: &str, rent_price: Option<f64>) -> PriceObservation {
        PriceObservation {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            district: district.to_string(),
            district_code: "00".to_string(),
            rent_price,
        }
    }

    #[test]
    fn district_summary_ranks_by_descending_average() {
        let prices = vec![
            obs("2020-01-01", "Usera", Some(10.0)),
            obs("2020-01-01", "Salamanca", Some(24.0)),
            obs("2020-02-01", "Salamanca", Some(26.0)),
            obs("2020-01-01", "Centro", Some(18.0)),
            obs("2020-01-01", "Centro", None),
        ];
        let rows = district_summary(&prices);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].district, "Salamanca");
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].samples, 2);
        assert_eq!(rows[0].avg_rent, "25.00");
        assert_eq!(rows[0].max_rent, "26.00");
        assert_eq!(rows[2].district, "Usera");
        assert_eq!(rows[2].rank, 3);
        // A single post-2012 point cannot support a growth rate.
        assert_eq!(rows[2].cagr_pct, "N/A");
        // 10 EUR/m2 * 100 m2 / 0.4.
        assert_eq!(rows[2].required_income, "2,500.00");
    }

    #[test]
    fn trend_rows_mirror_the_shaped_series() {
        let prices = vec![
            obs("2020-01-01", "Centro", Some(14.0)),
            obs("2020-01-01", "Centro", Some(16.0)),
            obs("2020-02-01", "Retiro", Some(12.0)),
        ];
        let shaped = shape_time_series(&prices, &[]);
        let rows = rent_trend(&shaped);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].district, "Centro");
        assert_eq!(rows[0].mean_rent, "15.00");
        let overall = citywide_trend(&shaped);
        assert_eq!(overall.len(), 2);
    }

    #[test]
    fn revenue_schedule_accumulates_the_gain_column() {
        let projection = policy::revenue_projection(500.0, 2.0, 3.0);
        let rows = revenue_schedule(&MADRID_SCENARIO, &projection);
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].year, 2025);
        assert_eq!(rows[0].extra_gain, "0.0");
        assert_eq!(
            rows.last().unwrap().cumulative_gain,
            format_number(projection.cumulative_diff, 1)
        );
    }

    #[test]
    fn fiscal_summary_is_consistent_with_the_calculators() {
        let projection = policy::revenue_projection(500.0, 2.0, 3.0);
        let summary = fiscal_summary(&MADRID_SCENARIO, 27.8, 7313.0, &projection);
        assert!((summary.landlord_net_gain - 5873.0).abs() < 1e-9);
        assert!(
            (summary.roi_pct - policy::roi(projection.cumulative_diff, 27.8)).abs() < 1e-9
        );
        assert_eq!(summary.budget_flow.links.len(), 5);
    }

    #[test]
    fn market_kpis_follow_the_filter() {
        let prices = vec![
            obs("2020-01-01", "Centro", Some(15.0)),
            obs("2021-01-01", "Centro", Some(18.0)),
        ];
        let kpis = market_kpis(&prices, &DistrictFilter::Named("Centro".to_string()));
        assert_eq!(kpis.ranking, Some(1));
        assert_eq!(kpis.max_rent, Some(18.0));
        assert!(kpis.cagr_pct.is_some());
        let aggregate = market_kpis(&prices, &DistrictFilter::All);
        assert_eq!(aggregate.ranking, None);
    }
}
