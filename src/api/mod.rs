use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    AssetClass, CandidateYear, ExpenseSchedule, ExtraExpense, MilestoneOutcome, PlanConfig,
    ProjectionResult, ProjectionRow, RetirementSearchResult, RetirementVerdict, TaxSchedule,
    find_die_with_zero_year, project,
};
use crate::report;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "diezero",
    about = "Net worth projection with die-with-zero retirement year search"
)]
struct Cli {
    #[arg(long, help = "Annual gross income before tax")]
    gross_income: f64,
    #[arg(long, help = "Annual living expenses in today's money")]
    annual_expenses: f64,
    #[arg(long, default_value_t = 40, help = "Number of years to project")]
    years: u32,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Expected annual inflation in percent"
    )]
    inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Expected annual income growth in percent"
    )]
    income_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 30.0,
        help = "Flat tax rate in percent; ignored when --tax-schedule is set"
    )]
    tax_rate: f64,
    #[arg(
        long,
        help = "Stepped tax schedule as YEAR:PERCENT pairs, e.g. 0:30,20:40"
    )]
    tax_schedule: Option<String>,
    #[arg(
        long = "extra-expense",
        help = "Additional expense step as YEAR:AMOUNT:DESCRIPTION, repeatable"
    )]
    extra_expenses: Vec<String>,
    #[arg(
        long = "asset",
        required = true,
        help = "Asset category as NAME:AMOUNT:PERCENT[:liquid|illiquid], repeatable"
    )]
    assets: Vec<String>,
    #[arg(long, help = "Comma-separated net worth milestones to track")]
    milestones: Option<String>,
    #[arg(long, help = "Include per-asset gain/loss columns in the projection")]
    verbose: bool,
    #[arg(long, help = "Print the JSON plan response instead of the text report")]
    json: bool,
}

/// Percent-based request model shared by the CLI and the HTTP API; a single
/// validation pass converts it into the engine's fractional `PlanConfig`.
#[derive(Debug, Clone)]
struct PlanRequest {
    gross_income: f64,
    annual_expenses: f64,
    years: u32,
    inflation_rate: f64,
    income_growth_rate: f64,
    tax_rate: f64,
    tax_schedule: Option<BTreeMap<u32, f64>>,
    extra_expenses: BTreeMap<u32, (f64, String)>,
    assets: Vec<AssetSpec>,
    milestones: Vec<f64>,
    verbose: bool,
}

#[derive(Debug, Clone)]
struct AssetSpec {
    name: String,
    amount: f64,
    rate: f64,
    liquid: bool,
}

#[derive(Debug, Clone, Copy)]
struct RunOptions {
    years: u32,
    verbose: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    gross_income: Option<f64>,
    annual_expenses: Option<f64>,
    years: Option<u32>,
    inflation_rate: Option<f64>,
    income_growth_rate: Option<f64>,
    tax_rate: Option<f64>,
    tax_schedule: Option<BTreeMap<u32, f64>>,
    extra_expenses: Option<BTreeMap<u32, ExpensePayload>>,
    assets: Option<Vec<AssetPayload>>,
    milestones: Option<Vec<f64>>,
    verbose: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpensePayload {
    amount: f64,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetPayload {
    name: String,
    amount: f64,
    rate: f64,
    liquid: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    years: u32,
    verbose: bool,
    starting_net_worth: f64,
    final_net_worth: f64,
    growth: f64,
    total_return: Option<f64>,
    cagr: Option<f64>,
    rows: Vec<ProjectionRow>,
    milestones: Vec<MilestoneOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetirementResponse {
    horizon_years: u32,
    stop_now_net_worth: f64,
    unreachable: bool,
    retire_year: Option<u32>,
    final_net_worth: f64,
    candidates: Vec<CandidateYear>,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    projection: ProjectResponse,
    retirement: RetirementResponse,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct IndexResponse {
    endpoints: &'static [&'static str],
}

/// Defaults mirror the worked example the projection was designed around.
fn default_plan_request() -> PlanRequest {
    PlanRequest {
        gross_income: 80_000.0,
        annual_expenses: 40_000.0,
        years: 40,
        inflation_rate: 2.0,
        income_growth_rate: 2.0,
        tax_rate: 30.0,
        tax_schedule: None,
        extra_expenses: [
            (0, (15_000.0, "Kids education".to_string())),
            (18, (0.0, "None".to_string())),
        ]
        .into_iter()
        .collect(),
        assets: vec![
            AssetSpec {
                name: "ETFs".to_string(),
                amount: 200_000.0,
                rate: 7.0,
                liquid: true,
            },
            AssetSpec {
                name: "Crypto".to_string(),
                amount: 50_000.0,
                rate: 12.0,
                liquid: true,
            },
            AssetSpec {
                name: "Real Estate".to_string(),
                amount: 400_000.0,
                rate: 3.0,
                liquid: false,
            },
        ],
        milestones: vec![1_000_000.0, 2_000_000.0, 3_000_000.0],
        verbose: false,
    }
}

fn plan_request_from_cli(cli: &Cli) -> Result<PlanRequest, String> {
    let tax_schedule = cli
        .tax_schedule
        .as_deref()
        .map(parse_schedule_spec)
        .transpose()?;

    let mut extra_expenses = BTreeMap::new();
    for spec in &cli.extra_expenses {
        let (year, amount, description) = parse_expense_spec(spec)?;
        if extra_expenses
            .insert(year, (amount, description))
            .is_some()
        {
            return Err(format!("duplicate --extra-expense year {year}"));
        }
    }

    let assets = cli
        .assets
        .iter()
        .map(|spec| parse_asset_spec(spec))
        .collect::<Result<Vec<_>, _>>()?;

    let milestones = match cli.milestones.as_deref() {
        Some(spec) => parse_milestones_spec(spec)?,
        None => Vec::new(),
    };

    Ok(PlanRequest {
        gross_income: cli.gross_income,
        annual_expenses: cli.annual_expenses,
        years: cli.years,
        inflation_rate: cli.inflation_rate,
        income_growth_rate: cli.income_growth_rate,
        tax_rate: cli.tax_rate,
        tax_schedule,
        extra_expenses,
        assets,
        milestones,
        verbose: cli.verbose,
    })
}

fn plan_request_from_payload(payload: PlanPayload) -> PlanRequest {
    let mut request = default_plan_request();

    if let Some(v) = payload.gross_income {
        request.gross_income = v;
    }
    if let Some(v) = payload.annual_expenses {
        request.annual_expenses = v;
    }
    if let Some(v) = payload.years {
        request.years = v;
    }
    if let Some(v) = payload.inflation_rate {
        request.inflation_rate = v;
    }
    if let Some(v) = payload.income_growth_rate {
        request.income_growth_rate = v;
    }
    if let Some(v) = payload.tax_rate {
        request.tax_rate = v;
        request.tax_schedule = None;
    }
    if let Some(v) = payload.tax_schedule {
        request.tax_schedule = Some(v);
    }
    if let Some(v) = payload.extra_expenses {
        request.extra_expenses = v
            .into_iter()
            .map(|(year, expense)| (year, (expense.amount, expense.description)))
            .collect();
    }
    if let Some(v) = payload.assets {
        request.assets = v
            .into_iter()
            .map(|asset| AssetSpec {
                name: asset.name,
                amount: asset.amount,
                rate: asset.rate,
                liquid: asset.liquid.unwrap_or(true),
            })
            .collect();
    }
    if let Some(v) = payload.milestones {
        request.milestones = v;
    }
    if let Some(v) = payload.verbose {
        request.verbose = v;
    }

    request
}

fn parse_schedule_spec(spec: &str) -> Result<BTreeMap<u32, f64>, String> {
    let mut entries = BTreeMap::new();
    for part in spec.split(',') {
        let part = part.trim();
        let Some((year, rate)) = part.split_once(':') else {
            return Err(format!("schedule entry '{part}' must be YEAR:PERCENT"));
        };
        let year = year
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid schedule year '{}'", year.trim()))?;
        let rate = rate
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid schedule rate '{}'", rate.trim()))?;
        if entries.insert(year, rate).is_some() {
            return Err(format!("duplicate schedule year {year}"));
        }
    }
    Ok(entries)
}

fn parse_expense_spec(spec: &str) -> Result<(u32, f64, String), String> {
    let mut parts = spec.splitn(3, ':');
    let year = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("expense '{spec}' must be YEAR:AMOUNT:DESCRIPTION"))?;
    let amount = parts
        .next()
        .map(str::trim)
        .ok_or_else(|| format!("expense '{spec}' must be YEAR:AMOUNT:DESCRIPTION"))?;
    let description = parts.next().unwrap_or("").trim().to_string();

    let year = year
        .parse::<u32>()
        .map_err(|_| format!("invalid expense year '{year}'"))?;
    let amount = amount
        .parse::<f64>()
        .map_err(|_| format!("invalid expense amount '{amount}'"))?;
    Ok((year, amount, description))
}

fn parse_asset_spec(spec: &str) -> Result<AssetSpec, String> {
    let mut parts = spec.splitn(4, ':');
    let name = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("asset '{spec}' must be NAME:AMOUNT:PERCENT[:liquid|illiquid]"))?;
    let amount = parts
        .next()
        .map(str::trim)
        .ok_or_else(|| format!("asset '{spec}' is missing an amount"))?;
    let rate = parts
        .next()
        .map(str::trim)
        .ok_or_else(|| format!("asset '{spec}' is missing a rate"))?;
    let liquid = match parts.next().map(|s| s.trim().to_ascii_lowercase()) {
        None => true,
        Some(token) if token == "liquid" => true,
        Some(token) if token == "illiquid" => false,
        Some(token) => {
            return Err(format!(
                "asset liquidity must be 'liquid' or 'illiquid', got '{token}'"
            ));
        }
    };

    let amount = amount
        .parse::<f64>()
        .map_err(|_| format!("invalid asset amount '{amount}'"))?;
    let rate = rate
        .parse::<f64>()
        .map_err(|_| format!("invalid asset rate '{rate}'"))?;

    Ok(AssetSpec {
        name: name.to_string(),
        amount,
        rate,
        liquid,
    })
}

fn parse_milestones_spec(spec: &str) -> Result<Vec<f64>, String> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|part| {
            part.parse::<f64>()
                .map_err(|_| format!("invalid milestone '{part}'"))
        })
        .collect()
}

fn build_config(request: &PlanRequest) -> Result<(PlanConfig, RunOptions), String> {
    if !request.gross_income.is_finite() || request.gross_income < 0.0 {
        return Err("--gross-income must be finite and >= 0".to_string());
    }
    if !request.annual_expenses.is_finite() || request.annual_expenses < 0.0 {
        return Err("--annual-expenses must be finite and >= 0".to_string());
    }
    if !request.inflation_rate.is_finite() || request.inflation_rate <= -100.0 {
        return Err("--inflation-rate must be > -100".to_string());
    }
    if !request.income_growth_rate.is_finite() || request.income_growth_rate <= -100.0 {
        return Err("--income-growth-rate must be > -100".to_string());
    }

    let tax = match &request.tax_schedule {
        Some(steps) => {
            let mut fractions = BTreeMap::new();
            for (&year, &rate) in steps {
                if !(0.0..=100.0).contains(&rate) {
                    return Err(format!(
                        "--tax-schedule rate for year {year} must be between 0 and 100"
                    ));
                }
                fractions.insert(year, rate / 100.0);
            }
            TaxSchedule::stepped(fractions)?
        }
        None => {
            if !(0.0..=100.0).contains(&request.tax_rate) {
                return Err("--tax-rate must be between 0 and 100".to_string());
            }
            TaxSchedule::flat(request.tax_rate / 100.0)?
        }
    };

    let extra_expenses = ExpenseSchedule::new(
        request
            .extra_expenses
            .iter()
            .map(|(&year, (amount, description))| {
                (
                    year,
                    ExtraExpense {
                        amount: *amount,
                        description: description.clone(),
                    },
                )
            })
            .collect(),
    );

    if request.assets.is_empty() {
        return Err("at least one --asset is required".to_string());
    }
    let mut assets = Vec::with_capacity(request.assets.len());
    for spec in &request.assets {
        if !spec.amount.is_finite() {
            return Err(format!("asset '{}' amount must be finite", spec.name));
        }
        if !spec.rate.is_finite() || spec.rate <= -100.0 {
            return Err(format!("asset '{}' rate must be > -100", spec.name));
        }
        assets.push(AssetClass {
            name: spec.name.clone(),
            amount: spec.amount,
            rate: spec.rate / 100.0,
            liquid: spec.liquid,
        });
    }

    for &milestone in &request.milestones {
        if !milestone.is_finite() || milestone <= 0.0 {
            return Err("--milestones entries must be > 0".to_string());
        }
    }

    let config = PlanConfig {
        gross_income: request.gross_income,
        base_expenses: request.annual_expenses,
        inflation_rate: request.inflation_rate / 100.0,
        income_growth_rate: request.income_growth_rate / 100.0,
        tax,
        extra_expenses,
        assets,
        milestones: request.milestones.clone(),
    };
    let options = RunOptions {
        years: request.years,
        verbose: request.verbose,
    };
    Ok((config, options))
}

pub fn run_cli(raw_args: &[String]) -> Result<(), String> {
    let cli = Cli::parse_from(raw_args);
    let request = plan_request_from_cli(&cli)?;
    let (config, options) = build_config(&request)?;

    let projection = project(&config, options.years, options.verbose)?;
    let search = find_die_with_zero_year(&config, options.years)?;

    if cli.json {
        let response = build_plan_response(&config, &projection, &search, options);
        let body = serde_json::to_string_pretty(&response)
            .map_err(|e| format!("failed to encode response: {e}"))?;
        println!("{body}");
    } else {
        println!(
            "{}",
            report::render_plan_report(&config, &projection, &search)
        );
    }
    Ok(())
}

fn build_project_response(
    config: &PlanConfig,
    projection: &ProjectionResult,
    options: RunOptions,
) -> ProjectResponse {
    ProjectResponse {
        years: options.years,
        verbose: options.verbose,
        starting_net_worth: config.starting_net_worth(),
        final_net_worth: projection.final_net_worth(),
        growth: projection.growth(),
        total_return: projection.total_return(),
        cagr: projection.cagr(),
        rows: projection.rows.clone(),
        milestones: projection.milestones.clone(),
    }
}

fn build_retirement_response(search: &RetirementSearchResult) -> RetirementResponse {
    let (unreachable, retire_year, final_net_worth) = match search.verdict {
        RetirementVerdict::Found {
            retire_year,
            final_net_worth,
        } => (false, Some(retire_year), final_net_worth),
        RetirementVerdict::Unreachable { final_net_worth } => (true, None, final_net_worth),
    };

    RetirementResponse {
        horizon_years: search.horizon_years,
        stop_now_net_worth: search.stop_now_net_worth,
        unreachable,
        retire_year,
        final_net_worth,
        candidates: search.candidates.clone(),
        message: search.message.clone(),
    }
}

fn build_plan_response(
    config: &PlanConfig,
    projection: &ProjectionResult,
    search: &RetirementSearchResult,
    options: RunOptions,
) -> PlanResponse {
    PlanResponse {
        projection: build_project_response(config, projection, options),
        retirement: build_retirement_response(search),
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route(
            "/api/retirement",
            get(retirement_get_handler).post(retirement_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("diezero HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn index_handler() -> Response {
    json_response(
        StatusCode::OK,
        IndexResponse {
            endpoints: &["/api/project", "/api/retirement"],
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    project_handler_impl(payload)
}

fn project_handler_impl(payload: PlanPayload) -> Response {
    let request = plan_request_from_payload(payload);
    let (config, options) = match build_config(&request) {
        Ok(built) => built,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match project(&config, options.years, options.verbose) {
        Ok(projection) => json_response(
            StatusCode::OK,
            build_project_response(&config, &projection, options),
        ),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn retirement_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    retirement_handler_impl(payload)
}

async fn retirement_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    retirement_handler_impl(payload)
}

fn retirement_handler_impl(payload: PlanPayload) -> Response {
    let request = plan_request_from_payload(payload);
    let (config, options) = match build_config(&request) {
        Ok(built) => built,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match find_die_with_zero_year(&config, options.years) {
        Ok(search) => json_response(StatusCode::OK, build_retirement_response(&search)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn plan_request_from_json(json: &str) -> Result<PlanRequest, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    Ok(plan_request_from_payload(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn parses_asset_specs() {
        let asset = parse_asset_spec("ETFs:200000:7").expect("valid spec");
        assert_eq!(asset.name, "ETFs");
        assert_approx(asset.amount, 200_000.0);
        assert_approx(asset.rate, 7.0);
        assert!(asset.liquid);

        let asset = parse_asset_spec("Real Estate:400000:3:illiquid").expect("valid spec");
        assert_eq!(asset.name, "Real Estate");
        assert!(!asset.liquid);

        assert!(parse_asset_spec("NoAmount").is_err());
        assert!(parse_asset_spec("X:abc:3").is_err());
        assert!(parse_asset_spec("X:1000:3:frozen").is_err());
    }

    #[test]
    fn parses_schedule_specs() {
        let schedule = parse_schedule_spec("0:30, 20:40").expect("valid spec");
        assert_eq!(schedule.len(), 2);
        assert_approx(schedule[&0], 30.0);
        assert_approx(schedule[&20], 40.0);

        assert!(parse_schedule_spec("0-30").is_err());
        assert!(parse_schedule_spec("0:30,0:40").is_err());
        assert!(parse_schedule_spec("x:30").is_err());
    }

    #[test]
    fn parses_expense_specs_with_colons_in_description() {
        let (year, amount, description) =
            parse_expense_spec("5:20000:Kids: school and clubs").expect("valid spec");
        assert_eq!(year, 5);
        assert_approx(amount, 20_000.0);
        assert_eq!(description, "Kids: school and clubs");

        let (_, _, description) = parse_expense_spec("5:20000").expect("valid spec");
        assert_eq!(description, "");

        assert!(parse_expense_spec("five:20000:desc").is_err());
    }

    #[test]
    fn parses_milestone_specs() {
        let milestones = parse_milestones_spec("1000000, 2000000").expect("valid spec");
        assert_eq!(milestones, vec![1_000_000.0, 2_000_000.0]);
        assert!(parse_milestones_spec("1e6,abc").is_err());
    }

    #[test]
    fn default_request_builds_a_valid_config() {
        let request = default_plan_request();
        let (config, options) = build_config(&request).expect("defaults are valid");

        assert_approx(config.gross_income, 80_000.0);
        assert_approx(config.inflation_rate, 0.02);
        assert_approx(config.tax.rate_for(0), 0.30);
        assert_eq!(config.assets.len(), 3);
        assert_approx(config.assets[0].rate, 0.07);
        assert!(!config.assets[2].liquid);
        assert_approx(config.extra_expenses.for_year(5).0, 15_000.0);
        assert_approx(config.extra_expenses.for_year(18).0, 0.0);
        assert_eq!(options.years, 40);
        assert!(!options.verbose);
    }

    #[test]
    fn build_config_converts_percentages_to_fractions() {
        let mut request = default_plan_request();
        request.tax_schedule = Some([(0, 30.0), (20, 40.0)].into_iter().collect());
        let (config, _) = build_config(&request).expect("valid request");

        assert_approx(config.tax.rate_for(5), 0.30);
        assert_approx(config.tax.rate_for(20), 0.40);
        assert_approx(config.income_growth_rate, 0.02);
    }

    #[test]
    fn build_config_rejects_out_of_range_inputs() {
        let mut negative_income = default_plan_request();
        negative_income.gross_income = -1.0;
        let err = build_config(&negative_income).expect_err("must reject negative income");
        assert!(err.contains("--gross-income"));

        let mut bad_tax = default_plan_request();
        bad_tax.tax_rate = 150.0;
        let err = build_config(&bad_tax).expect_err("must reject tax above 100");
        assert!(err.contains("--tax-rate"));

        let mut bad_schedule = default_plan_request();
        bad_schedule.tax_schedule = Some([(0, 101.0)].into_iter().collect());
        let err = build_config(&bad_schedule).expect_err("must reject schedule above 100");
        assert!(err.contains("--tax-schedule"));

        let mut no_assets = default_plan_request();
        no_assets.assets.clear();
        let err = build_config(&no_assets).expect_err("must require an asset");
        assert!(err.contains("--asset"));

        let mut bad_milestone = default_plan_request();
        bad_milestone.milestones = vec![-5.0];
        let err = build_config(&bad_milestone).expect_err("must reject negative milestone");
        assert!(err.contains("--milestones"));
    }

    #[test]
    fn payload_overlay_replaces_defaults() {
        let request = plan_request_from_json(
            r#"{
              "grossIncome": 90000,
              "annualExpenses": 45000,
              "years": 25,
              "taxSchedule": {"0": 25, "10": 35},
              "extraExpenses": {"3": {"amount": 8000, "description": "School"}},
              "assets": [
                {"name": "Index fund", "amount": 150000, "rate": 6},
                {"name": "Flat", "amount": 300000, "rate": 2, "liquid": false}
              ],
              "milestones": [500000],
              "verbose": true
            }"#,
        )
        .expect("valid payload");

        assert_approx(request.gross_income, 90_000.0);
        assert_approx(request.annual_expenses, 45_000.0);
        assert_eq!(request.years, 25);
        assert!(request.verbose);
        assert_eq!(request.assets.len(), 2);
        assert!(request.assets[0].liquid);
        assert!(!request.assets[1].liquid);
        assert_eq!(request.milestones, vec![500_000.0]);

        let schedule = request.tax_schedule.as_ref().expect("schedule set");
        assert_approx(schedule[&10], 35.0);
        assert_approx(request.extra_expenses[&3].0, 8_000.0);
        assert_eq!(request.extra_expenses[&3].1, "School");
    }

    #[test]
    fn flat_tax_payload_clears_the_default_schedule() {
        let request = plan_request_from_json(r#"{"taxRate": 20}"#).expect("valid payload");
        assert!(request.tax_schedule.is_none());
        assert_approx(request.tax_rate, 20.0);
    }

    #[test]
    fn empty_payload_matches_the_defaults() {
        let request = plan_request_from_json("{}").expect("valid payload");
        let defaults = default_plan_request();
        assert_approx(request.gross_income, defaults.gross_income);
        assert_eq!(request.years, defaults.years);
        assert_eq!(request.assets.len(), defaults.assets.len());
    }

    #[test]
    fn project_response_serializes_camel_case() {
        let mut request = default_plan_request();
        request.years = 3;
        let (config, options) = build_config(&request).expect("valid request");
        let projection = project(&config, options.years, options.verbose).expect("projection");
        let response = build_project_response(&config, &projection, options);

        let value = serde_json::to_value(&response).expect("serializable");
        assert!(value.get("startingNetWorth").is_some());
        assert!(value.get("finalNetWorth").is_some());
        let rows = value.get("rows").and_then(|rows| rows.as_array());
        assert_eq!(rows.map(|rows| rows.len()), Some(4));
        let first_row = rows.and_then(|rows| rows.first());
        assert!(
            first_row
                .and_then(|row| row.get("totalNetWorth"))
                .is_some()
        );
    }

    #[test]
    fn retirement_response_exposes_the_verdict() {
        let request = default_plan_request();
        let (config, _) = build_config(&request).expect("valid request");
        let search = find_die_with_zero_year(&config, 10).expect("search succeeds");
        let response = build_retirement_response(&search);

        assert_eq!(response.horizon_years, 10);
        assert_eq!(response.unreachable, response.retire_year.is_none());

        let value = serde_json::to_value(&response).expect("serializable");
        assert!(value.get("stopNowNetWorth").is_some());
        assert!(value.get("candidates").is_some());
    }
}
