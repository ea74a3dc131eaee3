use serde::Serialize;

use super::schedule::{ExpenseSchedule, TaxSchedule};

#[derive(Debug, Clone, PartialEq)]
pub struct AssetClass {
    pub name: String,
    pub amount: f64,
    /// Annual appreciation rate as a fraction; may be negative.
    pub rate: f64,
    /// Liquid categories absorb savings and fund shortfalls; non-liquid
    /// categories only appreciate.
    pub liquid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanConfig {
    pub gross_income: f64,
    pub base_expenses: f64,
    pub inflation_rate: f64,
    pub income_growth_rate: f64,
    pub tax: TaxSchedule,
    pub extra_expenses: ExpenseSchedule,
    pub assets: Vec<AssetClass>,
    pub milestones: Vec<f64>,
}

impl PlanConfig {
    pub fn starting_net_worth(&self) -> f64 {
        self.assets.iter().map(|a| a.amount).sum()
    }
}

/// Per-category flows applied during the transition leaving a year.
/// Appreciation is booked as gain even when the rate is negative; net
/// change (gain - loss) stays the authoritative combined figure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFlows {
    pub gain: f64,
    pub loss: f64,
    pub net_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSnapshot {
    pub name: String,
    pub amount: f64,
    /// Present only in verbose runs; zero on the final row, which has no
    /// outgoing transition.
    pub flows: Option<AssetFlows>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRow {
    pub year: u32,
    pub gross_income: f64,
    pub tax_rate: f64,
    pub net_income: f64,
    pub base_expenses: f64,
    pub additional_expenses: f64,
    pub total_expenses: f64,
    /// Net income minus total expenses; exactly zero for year 0, which is
    /// the snapshot of starting conditions.
    pub annual_savings: f64,
    pub assets: Vec<AssetSnapshot>,
    pub total_net_worth: f64,
    pub unreached_milestones: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneOutcome {
    pub threshold: f64,
    pub reached_in: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub rows: Vec<ProjectionRow>,
    pub milestones: Vec<MilestoneOutcome>,
}

impl ProjectionResult {
    pub fn horizon_years(&self) -> u32 {
        self.rows.len().saturating_sub(1) as u32
    }

    pub fn initial_net_worth(&self) -> f64 {
        self.rows.first().map_or(0.0, |row| row.total_net_worth)
    }

    pub fn final_net_worth(&self) -> f64 {
        self.rows.last().map_or(0.0, |row| row.total_net_worth)
    }

    pub fn growth(&self) -> f64 {
        self.final_net_worth() - self.initial_net_worth()
    }

    /// None when the starting net worth is not positive.
    pub fn total_return(&self) -> Option<f64> {
        let initial = self.initial_net_worth();
        (initial > 0.0).then(|| self.final_net_worth() / initial - 1.0)
    }

    /// Compound annual growth rate; None for a zero-length horizon, a
    /// non-positive start, or a negative final value.
    pub fn cagr(&self) -> Option<f64> {
        let years = self.horizon_years();
        let initial = self.initial_net_worth();
        if years == 0 || initial <= 0.0 {
            return None;
        }
        let ratio = self.final_net_worth() / initial;
        if ratio < 0.0 {
            return None;
        }
        Some(ratio.powf(1.0 / f64::from(years)) - 1.0)
    }
}

/// First-reached-year bookkeeping for the configured net worth milestones.
/// Thresholds are sorted at construction; once a threshold is reached it is
/// never un-reached, even if net worth later falls below it.
#[derive(Debug, Clone)]
pub struct MilestoneTracker {
    thresholds: Vec<f64>,
    reached_in: Vec<Option<u32>>,
}

impl MilestoneTracker {
    pub fn new(milestones: &[f64]) -> Self {
        let mut thresholds = milestones.to_vec();
        thresholds.sort_by(|a, b| a.total_cmp(b));
        let reached_in = vec![None; thresholds.len()];
        Self {
            thresholds,
            reached_in,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn observe(&mut self, year: u32, net_worth: f64) {
        for (threshold, reached) in self.thresholds.iter().zip(self.reached_in.iter_mut()) {
            if reached.is_none() && net_worth >= *threshold {
                *reached = Some(year);
            }
        }
    }

    pub fn unreached(&self) -> Vec<f64> {
        self.thresholds
            .iter()
            .zip(self.reached_in.iter())
            .filter(|(_, reached)| reached.is_none())
            .map(|(&threshold, _)| threshold)
            .collect()
    }

    pub fn outcomes(&self) -> Vec<MilestoneOutcome> {
        self.thresholds
            .iter()
            .zip(self.reached_in.iter())
            .map(|(&threshold, &reached_in)| MilestoneOutcome {
                threshold,
                reached_in,
            })
            .collect()
    }
}
