use std::collections::BTreeMap;
use std::collections::BTreeSet;

use super::types::{
    AssetFlows, AssetSnapshot, MilestoneTracker, PlanConfig, ProjectionResult, ProjectionRow,
};

/// Project net worth year by year over `years` annual transitions,
/// producing `years + 1` rows.
///
/// Known limitation: when the total liquid value is not positive, that
/// year's savings flow is skipped entirely, so positive savings go
/// unallocated and a shortfall does not reduce net worth.
pub fn project(
    config: &PlanConfig,
    years: u32,
    verbose: bool,
) -> Result<ProjectionResult, String> {
    project_with_override(config, years, verbose, None)
}

/// `project` with a forced gross income per year. An overridden year uses
/// the forced value as-is; organic growth resumes from it at the next
/// non-overridden year.
pub(crate) fn project_with_override(
    config: &PlanConfig,
    years: u32,
    verbose: bool,
    income_override: Option<&BTreeMap<u32, f64>>,
) -> Result<ProjectionResult, String> {
    validate_config(config)?;

    let mut gross_income = config.gross_income;
    let mut base_expenses = config.base_expenses;
    // Fresh working copy per invocation; runs never share portfolio state.
    let mut amounts: Vec<f64> = config.assets.iter().map(|a| a.amount).collect();
    let mut tracker = MilestoneTracker::new(&config.milestones);

    let mut rows: Vec<ProjectionRow> = Vec::with_capacity(years as usize + 1);

    for year in 0..=years {
        match income_override.and_then(|overrides| overrides.get(&year)) {
            Some(&forced) => gross_income = forced,
            None if year > 0 => gross_income *= 1.0 + config.income_growth_rate,
            None => {}
        }
        if year > 0 {
            base_expenses *= 1.0 + config.inflation_rate;
        }

        let tax_rate = config.tax.rate_for(year);
        let net_income = gross_income * (1.0 - tax_rate);
        let (additional_expenses, _) = config.extra_expenses.for_year(year);
        let total_expenses = base_expenses + additional_expenses;
        let annual_savings = if year > 0 {
            net_income - total_expenses
        } else {
            0.0
        };

        if year > 0 {
            let flows = advance_portfolio(config, &mut amounts, annual_savings);
            if verbose {
                if let Some(previous) = rows.last_mut() {
                    for (snapshot, flow) in previous.assets.iter_mut().zip(flows.iter()) {
                        snapshot.flows = Some(*flow);
                    }
                }
            }
        }

        let total_net_worth: f64 = amounts.iter().sum();
        tracker.observe(year, total_net_worth);

        let assets = config
            .assets
            .iter()
            .zip(amounts.iter())
            .map(|(class, &amount)| AssetSnapshot {
                name: class.name.clone(),
                amount,
                flows: verbose.then(AssetFlows::default),
            })
            .collect();

        rows.push(ProjectionRow {
            year,
            gross_income,
            tax_rate,
            net_income,
            base_expenses,
            additional_expenses,
            total_expenses,
            annual_savings,
            assets,
            total_net_worth,
            unreached_milestones: (!tracker.is_empty()).then(|| tracker.unreached()),
        });
    }

    Ok(ProjectionResult {
        rows,
        milestones: tracker.outcomes(),
    })
}

/// One annual transition: savings flow across liquid categories first,
/// proportional to each category's share of total liquid value, then
/// appreciation on every category. Returns per-category flows in config
/// order.
fn advance_portfolio(
    config: &PlanConfig,
    amounts: &mut [f64],
    annual_savings: f64,
) -> Vec<AssetFlows> {
    let mut gains = vec![0.0; amounts.len()];
    let mut losses = vec![0.0; amounts.len()];

    if annual_savings != 0.0 {
        let total_liquid: f64 = config
            .assets
            .iter()
            .zip(amounts.iter())
            .filter(|(class, _)| class.liquid)
            .map(|(_, &amount)| amount)
            .sum();

        if total_liquid > 0.0 {
            for (index, class) in config.assets.iter().enumerate() {
                if !class.liquid {
                    continue;
                }
                let share = amounts[index] / total_liquid;
                if annual_savings > 0.0 {
                    let contribution = annual_savings * share;
                    amounts[index] += contribution;
                    gains[index] += contribution;
                } else {
                    let liquidation = -annual_savings * share;
                    amounts[index] -= liquidation;
                    losses[index] += liquidation;
                }
            }
        }
    }

    for (index, class) in config.assets.iter().enumerate() {
        let appreciation = amounts[index] * class.rate;
        amounts[index] += appreciation;
        gains[index] += appreciation;
    }

    gains
        .iter()
        .zip(losses.iter())
        .map(|(&gain, &loss)| AssetFlows {
            gain,
            loss,
            net_change: gain - loss,
        })
        .collect()
}

fn validate_config(config: &PlanConfig) -> Result<(), String> {
    if !config.gross_income.is_finite() || config.gross_income < 0.0 {
        return Err("gross income must be finite and >= 0".to_string());
    }
    if !config.base_expenses.is_finite() || config.base_expenses < 0.0 {
        return Err("annual expenses must be finite and >= 0".to_string());
    }
    if !config.inflation_rate.is_finite() || config.inflation_rate <= -1.0 {
        return Err("inflation rate must be a finite fraction > -1".to_string());
    }
    if !config.income_growth_rate.is_finite() || config.income_growth_rate <= -1.0 {
        return Err("income growth rate must be a finite fraction > -1".to_string());
    }

    for (&year, expense) in config.extra_expenses.entries() {
        if !expense.amount.is_finite() {
            return Err(format!("additional expense for year {year} must be finite"));
        }
    }

    let mut seen_names = BTreeSet::new();
    for class in &config.assets {
        if class.name.trim().is_empty() {
            return Err("asset category name must not be empty".to_string());
        }
        if !seen_names.insert(class.name.as_str()) {
            return Err(format!("duplicate asset category '{}'", class.name));
        }
        if !class.amount.is_finite() {
            return Err(format!("asset '{}' amount must be finite", class.name));
        }
        if !class.rate.is_finite() || class.rate <= -1.0 {
            return Err(format!(
                "asset '{}' rate must be a finite fraction > -1",
                class.name
            ));
        }
    }

    for &milestone in &config.milestones {
        if !milestone.is_finite() || milestone <= 0.0 {
            return Err("milestones must be finite and > 0".to_string());
        }
    }

    Ok(())
}
