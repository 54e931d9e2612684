//! Client-side filtering.
//!
//! A [`FilterSpec`] says which criteria an entity understands and which record
//! fields each one looks at. [`FilterCriteria`] carries the values the user
//! typed. Compiling the two yields a [`CompiledFilter`] holding only the
//! active predicates; a record passes when every predicate holds.
//!
//! Three predicate kinds exist:
//!
//! - **search**: case-insensitive substring over several candidate fields,
//!   any of which may match
//! - **categorical**: exact match of one criterion against one field
//! - **date range**: a `from`/`to` pair over one date field, inclusive, at day
//!   granularity
//!
//! Empty or whitespace-only criterion values impose no constraint.

use crate::error::{DeskError, Result};
use crate::model::Record;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How categorical criteria compare against field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseMode {
    #[default]
    Sensitive,
    Insensitive,
}

/// Criterion name → current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria(BTreeMap<String, String>);

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn clear(&mut self, name: &str) {
        self.0.remove(name);
    }

    /// The trimmed value of a criterion, or `None` when it imposes no constraint.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Names of every criterion set, active or not.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// True when no criterion is active.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| v.trim().is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterCriteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchRule {
    criterion: String,
    fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CategoricalRule {
    criterion: String,
    field: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DateRangeRule {
    from: String,
    to: String,
    field: String,
}

/// Which criteria an entity accepts and which fields they apply to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    search: Option<SearchRule>,
    categorical: Vec<CategoricalRule>,
    date_ranges: Vec<DateRangeRule>,
    case: CaseMode,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidate fields may be dotted paths into nested objects.
    pub fn search(mut self, criterion: impl Into<String>, fields: &[&str]) -> Self {
        self.search = Some(SearchRule {
            criterion: criterion.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self
    }

    pub fn categorical(mut self, criterion: impl Into<String>, field: impl Into<String>) -> Self {
        self.categorical.push(CategoricalRule {
            criterion: criterion.into(),
            field: field.into(),
        });
        self
    }

    pub fn date_range(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        self.date_ranges.push(DateRangeRule {
            from: from.into(),
            to: to.into(),
            field: field.into(),
        });
        self
    }

    pub fn case_mode(mut self, case: CaseMode) -> Self {
        self.case = case;
        self
    }

    /// Every criterion name this filter reacts to.
    pub fn criteria_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        if let Some(rule) = &self.search {
            names.push(rule.criterion.as_str());
        }
        names.extend(self.categorical.iter().map(|r| r.criterion.as_str()));
        for rule in &self.date_ranges {
            names.push(rule.from.as_str());
            names.push(rule.to.as_str());
        }
        names
    }

    /// Resolves criteria into the active predicates.
    ///
    /// Unknown criteria are ignored. A date bound that does not
    /// parse is an error rather than a silent no-match.
    pub fn compile(&self, criteria: &FilterCriteria) -> Result<CompiledFilter> {
        let mut predicates = Vec::new();

        if let Some(rule) = &self.search {
            if let Some(needle) = criteria.get(&rule.criterion) {
                predicates.push(Predicate::Search {
                    needle: needle.to_lowercase(),
                    fields: rule.fields.clone(),
                });
            }
        }

        for rule in &self.categorical {
            if let Some(value) = criteria.get(&rule.criterion) {
                predicates.push(Predicate::Exact {
                    field: rule.field.clone(),
                    value: value.to_string(),
                    case: self.case,
                });
            }
        }

        for rule in &self.date_ranges {
            let from = criteria.get(&rule.from).map(parse_bound).transpose()?;
            let to = criteria.get(&rule.to).map(parse_bound).transpose()?;
            if from.is_some() || to.is_some() {
                predicates.push(Predicate::Range {
                    field: rule.field.clone(),
                    from,
                    to,
                });
            }
        }

        Ok(CompiledFilter { predicates })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Search {
        needle: String,
        fields: Vec<String>,
    },
    Exact {
        field: String,
        value: String,
        case: CaseMode,
    },
    Range {
        field: String,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl Predicate {
    fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Search { needle, fields } => fields.iter().any(|field| {
                record
                    .text(field)
                    .is_some_and(|text| text.to_lowercase().contains(needle.as_str()))
            }),
            Predicate::Exact { field, value, case } => {
                let Some(actual) = record.text(field) else {
                    return false;
                };
                match case {
                    CaseMode::Sensitive => actual == *value,
                    CaseMode::Insensitive => actual.to_lowercase() == value.to_lowercase(),
                }
            }
            Predicate::Range { field, from, to } => {
                let Some(date) = record.text(field).as_deref().and_then(parse_date) else {
                    return false;
                };
                from.map_or(true, |from| date >= from) && to.map_or(true, |to| date <= to)
            }
        }
    }
}

/// The active predicates for one set of criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    predicates: Vec<Predicate>,
}

impl CompiledFilter {
    /// No active predicate: every record passes.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Stops at the first predicate that fails.
    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Matching records in their original order.
    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}

/// One-shot helper: compile and apply.
pub fn filter_records(
    records: &[Record],
    spec: &FilterSpec,
    criteria: &FilterCriteria,
) -> Result<Vec<Record>> {
    Ok(spec.compile(criteria)?.apply(records))
}

/// Reads `YYYY-MM-DD`, RFC 3339 timestamps, and naive `YYYY-MM-DDTHH:MM:SS[.f]`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

fn parse_bound(value: &str) -> Result<NaiveDate> {
    parse_date(value)
        .ok_or_else(|| DeskError::InvalidCriteria(format!("'{}' is not a valid date", value)))
}
