mod engine;
mod schedule;
mod search;
mod types;

pub use engine::project;
pub use schedule::{ExpenseSchedule, ExtraExpense, TaxSchedule};
pub use search::{
    CandidateYear, RetirementSearchResult, RetirementVerdict, find_die_with_zero_year,
};
pub use types::{
    AssetClass, AssetFlows, AssetSnapshot, MilestoneOutcome, MilestoneTracker, PlanConfig,
    ProjectionResult, ProjectionRow,
};
