use crate::core::{
    PlanConfig, ProjectionResult, ProjectionRow, RetirementSearchResult, RetirementVerdict,
};

const RULE_WIDTH: usize = 80;

/// Render the full console summary for a projected plan: initial
/// conditions, schedules, the year-by-year table, key metrics, and the
/// die-with-zero analysis.
pub fn render_plan_report(
    config: &PlanConfig,
    projection: &ProjectionResult,
    search: &RetirementSearchResult,
) -> String {
    let mut out = String::new();

    heading(&mut out, '=', "FINANCIAL PROJECTION SUMMARY");
    out.push('\n');
    render_initial_conditions(&mut out, config);
    render_asset_allocation(&mut out, config);

    out.push('\n');
    heading(&mut out, '-', "YEAR-BY-YEAR PROJECTION:");
    out.push_str(&render_projection_table(&projection.rows));

    out.push('\n');
    heading(&mut out, '=', "KEY METRICS:");
    render_key_metrics(&mut out, projection);

    out.push('\n');
    heading(&mut out, '=', "DIE WITH ZERO ANALYSIS:");
    render_die_with_zero(&mut out, search);

    out
}

fn heading(out: &mut String, rule: char, title: &str) {
    let line: String = std::iter::repeat(rule).take(RULE_WIDTH).collect();
    out.push_str(&line);
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(&line);
    out.push('\n');
}

fn render_initial_conditions(out: &mut String, config: &PlanConfig) {
    let initial_tax_rate = config.tax.rate_for(0);

    out.push_str("INITIAL CONDITIONS:\n");
    out.push_str(&format!(
        "  Starting Net Worth: {}\n",
        format_currency(config.starting_net_worth())
    ));
    out.push_str(&format!(
        "  Annual Gross Income: {}\n",
        format_currency(config.gross_income)
    ));
    out.push_str(&format!(
        "  Initial Tax Rate: {}\n",
        format_percent(initial_tax_rate, 1)
    ));
    out.push_str(&format!(
        "  Initial Net Income: {}\n",
        format_currency(config.gross_income * (1.0 - initial_tax_rate))
    ));
    out.push_str(&format!(
        "  Initial Annual Expenses: {}\n",
        format_currency(config.base_expenses)
    ));
    out.push_str(&format!(
        "  Inflation Rate: {}\n",
        format_percent(config.inflation_rate, 1)
    ));
    out.push_str(&format!(
        "  Income Growth Rate: {}\n",
        format_percent(config.income_growth_rate, 1)
    ));

    if let Some(steps) = config.tax.steps() {
        if steps.len() > 1 {
            out.push_str("\n  Tax Rate Schedule:\n");
            for (year, rate) in steps {
                out.push_str(&format!("    Year {year}+: {}\n", format_percent(*rate, 1)));
            }
        }
    }

    if !config.extra_expenses.is_empty() {
        out.push_str("\n  Additional Expense Schedule:\n");
        for (year, expense) in config.extra_expenses.entries() {
            out.push_str(&format!(
                "    Year {year}+: {} ({})\n",
                format_currency(expense.amount),
                expense.description
            ));
        }
    }
}

fn render_asset_allocation(out: &mut String, config: &PlanConfig) {
    out.push_str("\nASSET ALLOCATION:\n");
    for class in &config.assets {
        let liquidity = if class.liquid { "liquid" } else { "non-liquid" };
        out.push_str(&format!(
            "  {}: {} @ {} annual return ({liquidity})\n",
            class.name,
            format_currency(class.amount),
            format_percent(class.rate, 1)
        ));
    }
}

fn render_projection_table(rows: &[ProjectionRow]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let verbose = first.assets.iter().any(|snapshot| snapshot.flows.is_some());
    let with_milestones = first.unreached_milestones.is_some();
    let asset_names: Vec<&str> = first
        .assets
        .iter()
        .map(|snapshot| snapshot.name.as_str())
        .collect();

    let mut header: Vec<String> = [
        "Year",
        "Gross Income",
        "Tax Rate",
        "Net Income",
        "Base Expenses",
        "Additional Expenses",
        "Total Expenses",
        "Annual Savings",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for name in &asset_names {
        header.push((*name).to_string());
    }
    if verbose {
        for name in &asset_names {
            header.push(format!("{name} Gain"));
            header.push(format!("{name} Loss"));
            header.push(format!("{name} Net"));
        }
    }
    header.push("Total Net Worth".to_string());
    if with_milestones {
        header.push("Unrealized Milestones".to_string());
    }

    let mut table = vec![header];
    for row in rows {
        let mut cells = vec![
            row.year.to_string(),
            format_thousands(row.gross_income),
            format_percent(row.tax_rate, 1),
            format_thousands(row.net_income),
            format_thousands(row.base_expenses),
            format_thousands(row.additional_expenses),
            format_thousands(row.total_expenses),
            format_thousands(row.annual_savings),
        ];
        for snapshot in &row.assets {
            cells.push(format_thousands(snapshot.amount));
        }
        if verbose {
            for snapshot in &row.assets {
                let flows = snapshot.flows.unwrap_or_default();
                cells.push(format_thousands(flows.gain));
                cells.push(format_thousands(flows.loss));
                cells.push(format_thousands(flows.net_change));
            }
        }
        cells.push(format_thousands(row.total_net_worth));
        if with_milestones {
            let unreached = row.unreached_milestones.as_deref().unwrap_or(&[]);
            cells.push(if unreached.is_empty() {
                "All reached!".to_string()
            } else {
                unreached
                    .iter()
                    .map(|&threshold| milestone_label(threshold))
                    .collect::<Vec<_>>()
                    .join(", ")
            });
        }
        table.push(cells);
    }

    let columns = table[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|col| {
            table
                .iter()
                .map(|cells| cells[col].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for cells in &table {
        let line: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, &width)| format!("{cell:>width$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

fn render_key_metrics(out: &mut String, projection: &ProjectionResult) {
    let years = projection.horizon_years();
    out.push_str(&format!(
        "  Final Net Worth (Year {years}): {}\n",
        format_currency(projection.final_net_worth())
    ));
    out.push_str(&format!(
        "  Growth: {}\n",
        format_currency(projection.growth())
    ));
    out.push_str(&format!(
        "  Total Return: {}\n",
        projection
            .total_return()
            .map_or("n/a".to_string(), |value| format_percent(value, 1))
    ));
    out.push_str(&format!(
        "  CAGR: {}\n",
        projection
            .cagr()
            .map_or("n/a".to_string(), |value| format_percent(value, 2))
    ));
    out.push_str(&format!(
        "  Final Annual Expenses: {}\n",
        format_currency(
            projection
                .rows
                .last()
                .map_or(0.0, |row| row.total_expenses)
        )
    ));
}

fn render_die_with_zero(out: &mut String, search: &RetirementSearchResult) {
    let horizon = search.horizon_years;
    out.push_str("  If you stop working NOW (year 0):\n");
    out.push_str(&format!(
        "    Final net worth in year {horizon}: {}\n",
        format_currency(search.stop_now_net_worth)
    ));

    out.push_str("\n  Optimal retirement year to die with zero:\n");
    out.push_str(&format!("    {}\n", search.message));
    if let RetirementVerdict::Found {
        final_net_worth, ..
    } = search.verdict
    {
        out.push_str(&format!(
            "    Final net worth in year {horizon}: {}\n",
            format_currency(final_net_worth)
        ));
    }
}

pub fn format_currency(value: f64) -> String {
    format!("€{}", format_thousands(value))
}

pub fn format_percent(rate: f64, decimals: usize) -> String {
    format!("{:.prec$}%", rate * 100.0, prec = decimals)
}

/// Two-decimal rendering with thousands separators, e.g. -1234567.8 into
/// "-1,234,567.80".
fn format_thousands(value: f64) -> String {
    let rendered = format!("{value:.2}");
    let (sign, digits) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}.{fraction}")
}

/// Compact milestone labels as shown in the projection table, e.g.
/// "€1.5M" or "€500K".
fn milestone_label(threshold: f64) -> String {
    if threshold >= 1_000_000.0 {
        format!("€{:.1}M", threshold / 1_000_000.0)
    } else {
        format!("€{:.0}K", threshold / 1_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        AssetClass, ExpenseSchedule, ExtraExpense, TaxSchedule, find_die_with_zero_year, project,
    };

    fn sample_config() -> PlanConfig {
        PlanConfig {
            gross_income: 80_000.0,
            base_expenses: 40_000.0,
            inflation_rate: 0.02,
            income_growth_rate: 0.02,
            tax: TaxSchedule::stepped([(0, 0.30), (20, 0.40)].into_iter().collect())
                .expect("valid schedule"),
            extra_expenses: ExpenseSchedule::new(
                [(
                    0,
                    ExtraExpense {
                        amount: 15_000.0,
                        description: "Kids education".to_string(),
                    },
                )]
                .into_iter()
                .collect(),
            ),
            assets: vec![
                AssetClass {
                    name: "ETFs".to_string(),
                    amount: 200_000.0,
                    rate: 0.07,
                    liquid: true,
                },
                AssetClass {
                    name: "Real Estate".to_string(),
                    amount: 400_000.0,
                    rate: 0.03,
                    liquid: false,
                },
            ],
            milestones: vec![1_000_000.0, 2_000_000.0],
        }
    }

    #[test]
    fn formats_thousands_with_separators() {
        assert_eq!(format_thousands(0.0), "0.00");
        assert_eq!(format_thousands(999.0), "999.00");
        assert_eq!(format_thousands(1_234.5), "1,234.50");
        assert_eq!(format_thousands(1_234_567.891), "1,234,567.89");
        assert_eq!(format_thousands(-1_234.5), "-1,234.50");
    }

    #[test]
    fn formats_currency_and_percent() {
        assert_eq!(format_currency(40_000.0), "€40,000.00");
        assert_eq!(format_percent(0.30, 1), "30.0%");
        assert_eq!(format_percent(0.0234, 2), "2.34%");
    }

    #[test]
    fn labels_milestones_compactly() {
        assert_eq!(milestone_label(1_500_000.0), "€1.5M");
        assert_eq!(milestone_label(1_000_000.0), "€1.0M");
        assert_eq!(milestone_label(500_000.0), "€500K");
    }

    #[test]
    fn report_contains_every_section() {
        let config = sample_config();
        let projection = project(&config, 5, false).expect("projection succeeds");
        let search = find_die_with_zero_year(&config, 5).expect("search succeeds");
        let report = render_plan_report(&config, &projection, &search);

        assert!(report.contains("FINANCIAL PROJECTION SUMMARY"));
        assert!(report.contains("INITIAL CONDITIONS:"));
        assert!(report.contains("Tax Rate Schedule:"));
        assert!(report.contains("Additional Expense Schedule:"));
        assert!(report.contains("Kids education"));
        assert!(report.contains("ASSET ALLOCATION:"));
        assert!(report.contains("ETFs: €200,000.00 @ 7.0% annual return (liquid)"));
        assert!(report.contains("Real Estate: €400,000.00 @ 3.0% annual return (non-liquid)"));
        assert!(report.contains("YEAR-BY-YEAR PROJECTION:"));
        assert!(report.contains("Total Net Worth"));
        assert!(report.contains("Unrealized Milestones"));
        assert!(report.contains("KEY METRICS:"));
        assert!(report.contains("DIE WITH ZERO ANALYSIS:"));
        assert!(report.contains("If you stop working NOW (year 0):"));
    }

    #[test]
    fn verbose_projection_adds_flow_columns() {
        let config = sample_config();
        let projection = project(&config, 3, true).expect("projection succeeds");
        let table = render_projection_table(&projection.rows);

        assert!(table.contains("ETFs Gain"));
        assert!(table.contains("ETFs Loss"));
        assert!(table.contains("ETFs Net"));
    }

    #[test]
    fn zero_length_horizon_reports_unavailable_ratios() {
        let config = sample_config();
        let projection = project(&config, 0, false).expect("projection succeeds");
        let search = find_die_with_zero_year(&config, 0).expect("search succeeds");
        let report = render_plan_report(&config, &projection, &search);

        assert!(report.contains("Total Return: 0.0%"));
        assert!(report.contains("CAGR: n/a"));
    }

    #[test]
    fn milestone_column_collapses_when_all_reached() {
        let mut config = sample_config();
        config.milestones = vec![100_000.0];
        let projection = project(&config, 1, false).expect("projection succeeds");
        let table = render_projection_table(&projection.rows);

        assert!(table.contains("All reached!"));
    }
}
