// Rent-control and fiscal-incentive simulators.
//
// The scenario block below is static reference data for the policy being
// evaluated; the calculators are pure functions over it plus the
// user-adjustable parameters (budget share, tax savings, growth rates).
use crate::util::average;
use once_cell::sync::Lazy;
use serde::Serialize;

/// Number of projected fiscal years.
pub const PROJECTION_HORIZON: usize = 10;

/// Annual rent revenue a landlord gives up under the price cap, in EUR.
pub const LANDLORD_RENT_LOSS: f64 = 1440.0;

/// Total housing budget the flow diagram splits, in millions of EUR.
pub const TOTAL_BUDGET: f64 = 100.0;

/// Share of the budget left after incentives in the reference allocation;
/// downstream program links scale against it.
pub const BASE_REMAINING_SHARE: f64 = 72.2;

pub const DEFAULT_INCENTIVE_BUDGET: f64 = 27.8;
pub const DEFAULT_TAX_SAVINGS: f64 = 7313.0;
pub const DEFAULT_GROWTH_WITHOUT_PCT: f64 = 2.0;
pub const DEFAULT_GROWTH_WITH_PCT: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct ControlledDistrict {
    pub name: &'static str,
    pub before: f64,
    pub after: f64,
}

#[derive(Debug, Clone)]
pub struct IncentiveLevel {
    pub label: &'static str,
    pub participation_pct: f64,
    pub rent_increase_pct: f64,
    pub net_benefit: f64,
}

#[derive(Debug, Clone)]
pub struct TenantCategory {
    pub name: &'static str,
    pub before_burden: f64,
    pub after_burden: f64,
}

/// Burden detail for the district subset studied in the control pilot.
#[derive(Debug, Clone)]
pub struct DistrictBurden {
    pub name: &'static str,
    pub youth_before: f64,
    pub youth_after: f64,
    pub low_income_before: f64,
    pub low_income_after: f64,
}

#[derive(Debug, Clone)]
pub struct DistrictProgram {
    pub name: &'static str,
    pub affordability_improvement: f64,
    pub incentive_cost: f64,
    pub complexity: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct SankeyNode {
    pub label: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SankeyLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SankeyFlow {
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
}

#[derive(Debug, Clone)]
pub struct PolicyScenario {
    pub controlled: Vec<ControlledDistrict>,
    pub incentive_levels: Vec<IncentiveLevel>,
    pub tenant_categories: Vec<TenantCategory>,
    pub district_burdens: Vec<DistrictBurden>,
    pub programs: Vec<DistrictProgram>,
    pub budget_flow: SankeyFlow,
    pub horizon_years: Vec<i32>,
    pub base_property_tax: f64,
    pub social_impact: f64,
}

pub static MADRID_SCENARIO: Lazy<PolicyScenario> = Lazy::new(|| PolicyScenario {
    controlled: vec![
        ControlledDistrict { name: "Salamanca", before: 25.0, after: 21.0 },
        ControlledDistrict { name: "Centro", before: 24.0, after: 20.0 },
        ControlledDistrict { name: "Chamberí", before: 23.0, after: 20.0 },
        ControlledDistrict { name: "Chamartín", before: 22.0, after: 19.0 },
        ControlledDistrict { name: "Arganzuela", before: 20.0, after: 18.0 },
        ControlledDistrict { name: "Tetuán", before: 18.0, after: 16.0 },
        ControlledDistrict { name: "Retiro", before: 21.0, after: 18.0 },
        ControlledDistrict { name: "Moncloa-Aravaca", before: 19.0, after: 17.0 },
        ControlledDistrict { name: "Fuencarral-El Pardo", before: 17.0, after: 15.0 },
        ControlledDistrict { name: "Usera", before: 16.0, after: 14.0 },
    ],
    incentive_levels: vec![
        IncentiveLevel {
            label: "No Incentives",
            participation_pct: 10.0,
            rent_increase_pct: 5.0,
            net_benefit: 0.0,
        },
        IncentiveLevel {
            label: "Partial Incentives",
            participation_pct: 40.0,
            rent_increase_pct: 3.0,
            net_benefit: 3000.0,
        },
        IncentiveLevel {
            label: "Full Incentives",
            participation_pct: 70.0,
            rent_increase_pct: 1.5,
            net_benefit: 5873.0,
        },
    ],
    tenant_categories: vec![
        TenantCategory { name: "Low-Income Renters", before_burden: 51.7, after_burden: 39.4 },
        TenantCategory { name: "Middle-Income Renters", before_burden: 35.4, after_burden: 25.9 },
        TenantCategory { name: "Young Professionals", before_burden: 41.2, after_burden: 30.9 },
    ],
    district_burdens: vec![
        DistrictBurden {
            name: "Salamanca",
            youth_before: 42.5,
            youth_after: 29.7,
            low_income_before: 54.9,
            low_income_after: 44.9,
        },
        DistrictBurden {
            name: "Centro",
            youth_before: 39.3,
            youth_after: 29.0,
            low_income_before: 52.8,
            low_income_after: 41.4,
        },
        DistrictBurden {
            name: "Chamberí",
            youth_before: 39.9,
            youth_after: 30.3,
            low_income_before: 54.6,
            low_income_after: 41.8,
        },
        DistrictBurden {
            name: "Retiro",
            youth_before: 44.4,
            youth_after: 31.6,
            low_income_before: 52.0,
            low_income_after: 40.2,
        },
        DistrictBurden {
            name: "Arganzuela",
            youth_before: 41.2,
            youth_after: 30.0,
            low_income_before: 46.0,
            low_income_after: 33.6,
        },
    ],
    programs: vec![
        DistrictProgram { name: "Salamanca", affordability_improvement: 30.1, incentive_cost: 235.0, complexity: 4 },
        DistrictProgram { name: "Centro", affordability_improvement: 26.5, incentive_cost: 220.0, complexity: 4 },
        DistrictProgram { name: "Chamberí", affordability_improvement: 24.3, incentive_cost: 210.0, complexity: 3 },
        DistrictProgram { name: "Chamartín", affordability_improvement: 23.7, incentive_cost: 190.0, complexity: 3 },
        DistrictProgram { name: "Arganzuela", affordability_improvement: 20.5, incentive_cost: 160.0, complexity: 2 },
        DistrictProgram { name: "Tetuán", affordability_improvement: 19.8, incentive_cost: 150.0, complexity: 2 },
        DistrictProgram { name: "Retiro", affordability_improvement: 22.1, incentive_cost: 180.0, complexity: 3 },
        DistrictProgram { name: "Moncloa-Aravaca", affordability_improvement: 21.5, incentive_cost: 175.0, complexity: 3 },
        DistrictProgram { name: "Fuencarral-El Pardo", affordability_improvement: 18.7, incentive_cost: 140.0, complexity: 2 },
        DistrictProgram { name: "Usera", affordability_improvement: 17.2, incentive_cost: 125.0, complexity: 1 },
    ],
    budget_flow: SankeyFlow {
        nodes: vec![
            SankeyNode { label: "Total Housing Budget", color: "#3498db" },
            SankeyNode { label: "Tax Incentives", color: "#e74c3c" },
            SankeyNode { label: "Remaining Budget", color: "#2980b9" },
            SankeyNode { label: "Affordable Housing Programs", color: "#27ae60" },
            SankeyNode { label: "Rental Assistance", color: "#8e44ad" },
            SankeyNode { label: "Other Housing Initiatives", color: "#f39c12" },
        ],
        links: vec![
            SankeyLink { source: 0, target: 1, value: 27.8, color: "rgba(231, 76, 60, 0.4)" },
            SankeyLink { source: 0, target: 2, value: 72.2, color: "rgba(41, 128, 185, 0.4)" },
            SankeyLink { source: 2, target: 3, value: 24.0, color: "rgba(39, 174, 96, 0.4)" },
            SankeyLink { source: 2, target: 4, value: 28.2, color: "rgba(142, 68, 173, 0.4)" },
            SankeyLink { source: 2, target: 5, value: 20.0, color: "rgba(243, 156, 18, 0.4)" },
        ],
    },
    horizon_years: (2025..2035).collect(),
    base_property_tax: 500.0,
    social_impact: 25.2,
});

#[derive(Debug, Clone)]
pub struct DistrictImpact {
    pub name: &'static str,
    pub before: f64,
    pub after: f64,
    pub reduction_pct: f64,
}

pub fn rent_control_impact(scenario: &PolicyScenario) -> Vec<DistrictImpact> {
    scenario
        .controlled
        .iter()
        .map(|d| DistrictImpact {
            name: d.name,
            before: d.before,
            after: d.after,
            reduction_pct: (d.before - d.after) / d.before * 100.0,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ControlKpis {
    pub avg_before: f64,
    pub avg_after: f64,
    pub avg_burden_before: f64,
    pub avg_burden_after: f64,
}

/// Citywide headline numbers: simple unweighted means across every
/// scenario district and tenant category. District selection in the
/// presentation layer narrows what is listed, never these values.
pub fn citywide_kpis(scenario: &PolicyScenario) -> ControlKpis {
    let before: Vec<f64> = scenario.controlled.iter().map(|d| d.before).collect();
    let after: Vec<f64> = scenario.controlled.iter().map(|d| d.after).collect();
    let burden_before: Vec<f64> = scenario
        .tenant_categories
        .iter()
        .map(|c| c.before_burden)
        .collect();
    let burden_after: Vec<f64> = scenario
        .tenant_categories
        .iter()
        .map(|c| c.after_burden)
        .collect();
    ControlKpis {
        avg_before: average(&before),
        avg_after: average(&after),
        avg_burden_before: average(&burden_before),
        avg_burden_after: average(&burden_after),
    }
}

#[derive(Debug, Clone)]
pub struct BurdenImpact {
    pub name: &'static str,
    pub before: f64,
    pub after: f64,
    pub improvement_pct: f64,
}

pub fn burden_improvement(scenario: &PolicyScenario) -> Vec<BurdenImpact> {
    scenario
        .tenant_categories
        .iter()
        .map(|c| BurdenImpact {
            name: c.name,
            before: c.before_burden,
            after: c.after_burden,
            improvement_pct: (c.before_burden - c.after_burden) / c.before_burden * 100.0,
        })
        .collect()
}

pub fn incentive_outcome<'a>(
    scenario: &'a PolicyScenario,
    label: &str,
) -> Option<&'a IncentiveLevel> {
    scenario
        .incentive_levels
        .iter()
        .find(|level| level.label.eq_ignore_ascii_case(label.trim()))
}

/// What a participating landlord keeps per year: the tax savings minus
/// the rent revenue lost to the cap.
pub fn landlord_net_gain(tax_savings: f64) -> f64 {
    tax_savings - LANDLORD_RENT_LOSS
}

#[derive(Debug, Clone)]
pub struct RevenueProjection {
    pub without_program: Vec<f64>,
    pub with_program: Vec<f64>,
    pub diff: Vec<f64>,
    pub cumulative_diff: f64,
}

/// Compound the base tax revenue over the horizon at both growth rates.
/// Rates are whole percentages (`2.0` means 2% per year).
pub fn revenue_projection(
    base: f64,
    growth_without_pct: f64,
    growth_with_pct: f64,
) -> RevenueProjection {
    let g_without = growth_without_pct / 100.0;
    let g_with = growth_with_pct / 100.0;
    let without_program: Vec<f64> = (0..PROJECTION_HORIZON)
        .map(|t| base * (1.0 + g_without).powi(t as i32))
        .collect();
    let with_program: Vec<f64> = (0..PROJECTION_HORIZON)
        .map(|t| base * (1.0 + g_with).powi(t as i32))
        .collect();
    let diff: Vec<f64> = with_program
        .iter()
        .zip(&without_program)
        .map(|(w, wo)| w - wo)
        .collect();
    let cumulative_diff = diff.iter().sum();
    RevenueProjection {
        without_program,
        with_program,
        diff,
        cumulative_diff,
    }
}

/// Return on the incentive outlay in percent. A zero budget is floored to
/// 1 so the ratio stays finite; the result is then a guard value, not a
/// meaningful return.
pub fn roi(cumulative_diff: f64, incentive_budget: f64) -> f64 {
    let budget = if incentive_budget == 0.0 {
        1.0
    } else {
        incentive_budget
    };
    cumulative_diff / budget * 100.0
}

/// First year (1-based) in which the running sum of incremental revenue
/// covers the budget; the full horizon length when it never does.
pub fn payback_period(diff: &[f64], incentive_budget: f64) -> usize {
    let mut cumulative = 0.0;
    for (index, gain) in diff.iter().enumerate() {
        cumulative += gain;
        if cumulative >= incentive_budget {
            return index + 1;
        }
    }
    PROJECTION_HORIZON
}

/// Relative uplift of the final projected year, in percent.
pub fn revenue_growth(projection: &RevenueProjection) -> f64 {
    match (
        projection.with_program.last(),
        projection.without_program.last(),
    ) {
        (Some(with), Some(without)) if *without != 0.0 => (with / without - 1.0) * 100.0,
        _ => 0.0,
    }
}

#[derive(Debug, Clone)]
pub struct CostEffectiveness {
    pub name: &'static str,
    pub ratio: f64,
}

/// Affordability improvement bought per euro of incentive cost, scaled to
/// a percentage for heat-mapping.
pub fn cost_effectiveness(scenario: &PolicyScenario) -> Vec<CostEffectiveness> {
    scenario
        .programs
        .iter()
        .map(|p| CostEffectiveness {
            name: p.name,
            ratio: p.affordability_improvement / p.incentive_cost * 100.0,
        })
        .collect()
}

/// Recompute the budget-flow link values for a chosen incentive share.
/// The incentive link carries the budget, the remainder flows to the
/// program links in the reference allocation's proportions.
pub fn budget_flow(scenario: &PolicyScenario, incentive_budget: f64) -> SankeyFlow {
    let remaining = TOTAL_BUDGET - incentive_budget;
    let links = scenario
        .budget_flow
        .links
        .iter()
        .map(|link| {
            let value = if link.target == 1 {
                incentive_budget
            } else if link.source == 0 {
                remaining
            } else {
                remaining * link.value / BASE_REMAINING_SHARE
            };
            SankeyLink { value, ..link.clone() }
        })
        .collect();
    SankeyFlow {
        nodes: scenario.budget_flow.nodes.clone(),
        links,
    }
}
