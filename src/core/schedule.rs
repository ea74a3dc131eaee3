use std::collections::BTreeMap;

/// Tax rate over time: either one flat rate or a year-keyed step function.
/// Stepped schedules are validated at construction and never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxSchedule {
    kind: TaxKind,
}

#[derive(Debug, Clone, PartialEq)]
enum TaxKind {
    Flat(f64),
    Stepped(BTreeMap<u32, f64>),
}

impl TaxSchedule {
    pub fn flat(rate: f64) -> Result<Self, String> {
        if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
            return Err(format!("tax rate must be between 0 and 1, got {rate}"));
        }
        Ok(Self {
            kind: TaxKind::Flat(rate),
        })
    }

    pub fn stepped(entries: BTreeMap<u32, f64>) -> Result<Self, String> {
        if entries.is_empty() {
            return Err("stepped tax schedule must contain at least one entry".to_string());
        }
        for (&year, &rate) in &entries {
            if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
                return Err(format!(
                    "tax rate for year {year} must be between 0 and 1, got {rate}"
                ));
            }
        }
        Ok(Self {
            kind: TaxKind::Stepped(entries),
        })
    }

    pub fn rate_for(&self, year: u32) -> f64 {
        match &self.kind {
            TaxKind::Flat(rate) => *rate,
            TaxKind::Stepped(entries) => *latest_at_or_before(entries, year)
                .expect("stepped schedule holds at least one entry"),
        }
    }

    /// The year-to-rate steps, or None for a flat schedule.
    pub fn steps(&self) -> Option<&BTreeMap<u32, f64>> {
        match &self.kind {
            TaxKind::Flat(_) => None,
            TaxKind::Stepped(entries) => Some(entries),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtraExpense {
    pub amount: f64,
    pub description: String,
}

/// Additional expenses over time, same step semantics as the tax schedule.
/// An empty schedule resolves to zero for every year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseSchedule {
    entries: BTreeMap<u32, ExtraExpense>,
}

impl ExpenseSchedule {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(entries: BTreeMap<u32, ExtraExpense>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &BTreeMap<u32, ExtraExpense> {
        &self.entries
    }

    pub fn for_year(&self, year: u32) -> (f64, &str) {
        match latest_at_or_before(&self.entries, year) {
            Some(expense) => (expense.amount, expense.description.as_str()),
            None => (0.0, ""),
        }
    }
}

/// Step-function lookup shared by both schedule kinds: the value at the
/// greatest key <= `year`, falling back to the value at the smallest key
/// when `year` precedes every entry.
fn latest_at_or_before<V>(entries: &BTreeMap<u32, V>, year: u32) -> Option<&V> {
    entries
        .range(..=year)
        .next_back()
        .map(|(_, value)| value)
        .or_else(|| entries.values().next())
}
