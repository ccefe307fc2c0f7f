use chrono::NaiveDate;
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::policy::SankeyFlow;

#[derive(Debug, Deserialize)]
pub struct RawPriceRow {
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "District")]
    pub district: Option<String>,
    #[serde(rename = "COD_DIS")]
    pub district_code: Option<String>,
    #[serde(rename = "Rent_Price")]
    pub rent_price: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawYearlyRow {
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Average_Youth_Salary")]
    pub avg_youth_salary: Option<String>,
    #[serde(rename = "Average_Monthly_Rent")]
    pub avg_monthly_rent: Option<String>,
}

/// One monthly rent-price observation. A `rent_price` of `None` means the
/// source cell was empty or unparsable; non-positive values are kept in the
/// raw collection but never enter any derived metric.
#[derive(Debug, Clone)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub district: String,
    pub district_code: String,
    pub rent_price: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct YearlyIncomeObservation {
    pub year: i32,
    pub avg_youth_salary: f64,
    pub avg_monthly_rent: f64,
}

/// Everything the reports run against. The boundary collection is carried
/// opaquely for map-drawing consumers; the core never inspects geometries.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub prices: Vec<PriceObservation>,
    pub yearly: Vec<YearlyIncomeObservation>,
    pub boundaries: FeatureCollection,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DistrictSummaryRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "District")]
    #[tabled(rename = "District")]
    pub district: String,
    #[serde(rename = "Samples")]
    #[tabled(rename = "Samples")]
    pub samples: usize,
    #[serde(rename = "AvgRent")]
    #[tabled(rename = "AvgRent")]
    pub avg_rent: String,
    #[serde(rename = "MedianRent")]
    #[tabled(rename = "MedianRent")]
    pub median_rent: String,
    #[serde(rename = "MaxRent")]
    #[tabled(rename = "MaxRent")]
    pub max_rent: String,
    #[serde(rename = "CagrPct")]
    #[tabled(rename = "CagrPct")]
    pub cagr_pct: String,
    #[serde(rename = "RequiredIncome")]
    #[tabled(rename = "RequiredIncome")]
    pub required_income: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TrendRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "District")]
    #[tabled(rename = "District")]
    pub district: String,
    #[serde(rename = "MeanRent")]
    #[tabled(rename = "MeanRent")]
    pub mean_rent: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CitywideTrendRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "MeanRent")]
    #[tabled(rename = "MeanRent")]
    pub mean_rent: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AffordabilityRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "AvgYouthSalary")]
    #[tabled(rename = "AvgYouthSalary")]
    pub avg_youth_salary: String,
    #[serde(rename = "AvgMonthlyRent")]
    #[tabled(rename = "AvgMonthlyRent")]
    pub avg_monthly_rent: String,
    #[serde(rename = "BurdenPct")]
    #[tabled(rename = "BurdenPct")]
    pub burden_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RentControlRow {
    #[serde(rename = "District")]
    #[tabled(rename = "District")]
    pub district: String,
    #[serde(rename = "BeforeControl")]
    #[tabled(rename = "BeforeControl")]
    pub before_control: String,
    #[serde(rename = "AfterControl")]
    #[tabled(rename = "AfterControl")]
    pub after_control: String,
    #[serde(rename = "ReductionPct")]
    #[tabled(rename = "ReductionPct")]
    pub reduction_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TenantBurdenRow {
    #[serde(rename = "TenantCategory")]
    #[tabled(rename = "TenantCategory")]
    pub category: String,
    #[serde(rename = "BeforeBurdenPct")]
    #[tabled(rename = "BeforeBurdenPct")]
    pub before_burden_pct: String,
    #[serde(rename = "AfterBurdenPct")]
    #[tabled(rename = "AfterBurdenPct")]
    pub after_burden_pct: String,
    #[serde(rename = "ImprovementPct")]
    #[tabled(rename = "ImprovementPct")]
    pub improvement_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct BurdenBreakdownRow {
    #[serde(rename = "District")]
    #[tabled(rename = "District")]
    pub district: String,
    #[serde(rename = "YouthBeforePct")]
    #[tabled(rename = "YouthBeforePct")]
    pub youth_before_pct: String,
    #[serde(rename = "YouthAfterPct")]
    #[tabled(rename = "YouthAfterPct")]
    pub youth_after_pct: String,
    #[serde(rename = "LowIncomeBeforePct")]
    #[tabled(rename = "LowIncomeBeforePct")]
    pub low_income_before_pct: String,
    #[serde(rename = "LowIncomeAfterPct")]
    #[tabled(rename = "LowIncomeAfterPct")]
    pub low_income_after_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RevenueYearRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "WithoutProgram")]
    #[tabled(rename = "WithoutProgram")]
    pub without_program: String,
    #[serde(rename = "WithProgram")]
    #[tabled(rename = "WithProgram")]
    pub with_program: String,
    #[serde(rename = "ExtraGain")]
    #[tabled(rename = "ExtraGain")]
    pub extra_gain: String,
    #[serde(rename = "CumulativeGain")]
    #[tabled(rename = "CumulativeGain")]
    pub cumulative_gain: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CostEffectivenessRow {
    #[serde(rename = "District")]
    #[tabled(rename = "District")]
    pub district: String,
    #[serde(rename = "AffordabilityPct")]
    #[tabled(rename = "AffordabilityPct")]
    pub affordability_pct: String,
    #[serde(rename = "IncentiveCost")]
    #[tabled(rename = "IncentiveCost")]
    pub incentive_cost: String,
    #[serde(rename = "RoiRatio")]
    #[tabled(rename = "RoiRatio")]
    pub roi_ratio: String,
    #[serde(rename = "Complexity")]
    #[tabled(rename = "Complexity")]
    pub complexity: u8,
}

#[derive(Debug, Serialize)]
pub struct FiscalSummary {
    pub incentive_budget: f64,
    pub tax_savings: f64,
    pub landlord_net_gain: f64,
    pub cumulative_gain: f64,
    pub roi_pct: f64,
    pub payback_years: usize,
    pub revenue_growth_pct: f64,
    pub social_impact: f64,
    pub budget_flow: SankeyFlow,
}
