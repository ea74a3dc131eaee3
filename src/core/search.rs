use std::collections::BTreeMap;

use serde::Serialize;

use super::engine::project_with_override;
use super::types::PlanConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateYear {
    pub retire_year: u32,
    pub final_net_worth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetirementVerdict {
    Found {
        retire_year: u32,
        final_net_worth: f64,
    },
    Unreachable {
        final_net_worth: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetirementSearchResult {
    pub horizon_years: u32,
    /// Final net worth when income stops at year 0.
    pub stop_now_net_worth: f64,
    /// Every candidate evaluated, in scan order.
    pub candidates: Vec<CandidateYear>,
    pub verdict: RetirementVerdict,
    pub message: String,
}

/// Search for the retirement year whose final net worth lands closest to
/// zero without going negative: evaluate the stop-now baseline, then scan
/// candidate years 1..=`years`, keeping the first strict improvement in
/// |final net worth| and stopping once a candidate ends negative.
///
/// The verdict is `Unreachable` only when no candidate improved on a
/// negative baseline; a non-negative baseline with no improvement means
/// stopping immediately is already the best answer.
pub fn find_die_with_zero_year(
    config: &PlanConfig,
    years: u32,
) -> Result<RetirementSearchResult, String> {
    let stop_now_net_worth = final_net_worth_when_retiring(config, years, 0)?;

    let mut best = BestCandidate::new(stop_now_net_worth);
    let mut candidates = Vec::new();

    for retire_year in 1..=years {
        let final_net_worth = final_net_worth_when_retiring(config, years, retire_year)?;
        candidates.push(CandidateYear {
            retire_year,
            final_net_worth,
        });
        if best.consider(retire_year, final_net_worth) {
            break;
        }
    }

    let verdict = best.verdict();
    let message = match verdict {
        RetirementVerdict::Found {
            retire_year: 0, ..
        } => "Stopping work immediately already lands closest to zero.".to_string(),
        RetirementVerdict::Found { retire_year, .. } => {
            format!("Stop working at year {retire_year}.")
        }
        RetirementVerdict::Unreachable { .. } => {
            "Cannot reach zero - expenses exceed asset growth even with continued income."
                .to_string()
        }
    };

    Ok(RetirementSearchResult {
        horizon_years: years,
        stop_now_net_worth,
        candidates,
        verdict,
        message,
    })
}

fn final_net_worth_when_retiring(
    config: &PlanConfig,
    years: u32,
    retire_year: u32,
) -> Result<f64, String> {
    let overrides = retirement_income_overrides(config, years, retire_year);
    let projection = project_with_override(config, years, false, Some(&overrides))?;
    Ok(projection.final_net_worth())
}

/// Income override covering the full horizon: the organic trajectory
/// (compounded iteratively, matching the engine) before `retire_year`,
/// zero from `retire_year` onward.
fn retirement_income_overrides(
    config: &PlanConfig,
    years: u32,
    retire_year: u32,
) -> BTreeMap<u32, f64> {
    let mut overrides = BTreeMap::new();
    let mut income = config.gross_income;
    for year in 0..=years {
        if year < retire_year {
            if year > 0 {
                income *= 1.0 + config.income_growth_rate;
            }
            overrides.insert(year, income);
        } else {
            overrides.insert(year, 0.0);
        }
    }
    overrides
}

struct BestCandidate {
    year: u32,
    net_worth: f64,
    miss: f64,
}

impl BestCandidate {
    fn new(stop_now_net_worth: f64) -> Self {
        Self {
            year: 0,
            net_worth: stop_now_net_worth,
            miss: stop_now_net_worth.abs(),
        }
    }

    /// Records a strict improvement; ties keep the earlier year. Returns
    /// true when the scan should stop (first negative final net worth).
    fn consider(&mut self, retire_year: u32, final_net_worth: f64) -> bool {
        if final_net_worth.abs() < self.miss {
            self.year = retire_year;
            self.net_worth = final_net_worth;
            self.miss = final_net_worth.abs();
        }
        final_net_worth < 0.0
    }

    fn verdict(&self) -> RetirementVerdict {
        if self.year == 0 && self.net_worth < 0.0 {
            RetirementVerdict::Unreachable {
                final_net_worth: self.net_worth,
            }
        } else {
            RetirementVerdict::Found {
                retire_year: self.year,
                final_net_worth: self.net_worth,
            }
        }
    }
}
