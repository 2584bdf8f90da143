//! Sort/filter translation between the grid and the remote service.
//!
//! The remote service takes two plain strings per list request:
//!
//! - `order` — `"field"` or `"field DESC"`, empty for no sort
//! - `filter` — `"field+op+value"` triples joined by `,`, empty for no filter
//!
//! Nothing is escaped. A `+` or `,` inside a field or value makes the
//! transport string ambiguous; callers must keep them out of raw values.
//! Group connectors are dropped the same way: `[a, "or", b]` is sent as
//! `a,b` and the service reads it as a conjunction.

use serde_json::Value;
use tracing::warn;

use crate::error::GridError;
use crate::model::Truck;

/// Single-column sort requested by the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub selector: String,
    pub desc: bool,
}

impl SortSpec {
    pub fn asc(selector: impl Into<String>) -> Self {
        Self { selector: selector.into(), desc: false }
    }

    pub fn desc(selector: impl Into<String>) -> Self {
        Self { selector: selector.into(), desc: true }
    }
}

/// One `(field, operator, value)` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl Comparison {
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

/// Row-selection predicate: a single comparison or a conjunction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    Single(Comparison),
    All(Vec<Comparison>),
}

/// Write a filter expression as the transport string.
///
/// `None` and an empty conjunction both translate to `""`.
pub fn translate_filter(filter: Option<&FilterExpr>) -> String {
    match filter {
        None => String::new(),
        Some(FilterExpr::Single(c)) => triple(c),
        Some(FilterExpr::All(cs)) => cs.iter().map(triple).collect::<Vec<_>>().join(","),
    }
}

fn triple(c: &Comparison) -> String {
    format!("{}+{}+{}", c.field, c.operator, c.value)
}

/// Write a sort descriptor as the transport `order` string.
pub fn translate_sort(sort: Option<&SortSpec>) -> String {
    match sort {
        None => String::new(),
        Some(s) if s.desc => format!("{} DESC", s.selector),
        Some(s) => s.selector.clone(),
    }
}

/// Stable client-side sort of a page.
///
/// The remote service does not guarantee its own ordering, so the adapter
/// re-sorts each page by the requested column. Unknown selectors leave
/// the page untouched.
pub fn sort_trucks(trucks: &mut [Truck], sort: &SortSpec) {
    trucks.sort_by(|a, b| {
        let ord = a
            .compare_field(b, &sort.selector)
            .unwrap_or(std::cmp::Ordering::Equal);
        if sort.desc { ord.reverse() } else { ord }
    });
}

// ── Load options ────────────────────────────────────────────────────

/// Paging, sort and filter options passed by the grid to `load`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadOptions {
    pub take: usize,
    pub skip: usize,
    pub sort: Option<SortSpec>,
    pub filter: Option<FilterExpr>,
}

impl LoadOptions {
    pub fn page(take: usize, skip: usize) -> Self {
        Self { take, skip, ..Default::default() }
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Parse the grid's JSON load options.
    ///
    /// ```json
    /// {"take": 25, "skip": 0,
    ///  "sort": [{"selector": "number", "desc": true}],
    ///  "filter": [["brand", "=", "Volvo"], "and", ["rental", "=", false]]}
    /// ```
    pub fn from_json(value: &Value) -> Result<Self, GridError> {
        let obj = value
            .as_object()
            .ok_or_else(|| GridError::InvalidOptions("expected an object".into()))?;

        let take = match obj.get("take") {
            Some(v) => as_count(v, "take")?,
            None => return Err(GridError::InvalidOptions("missing take".into())),
        };
        let skip = match obj.get("skip") {
            Some(Value::Null) | None => 0,
            Some(v) => as_count(v, "skip")?,
        };

        let sort = match obj.get("sort") {
            Some(Value::Null) | None => None,
            Some(v) => parse_sort(v)?,
        };
        let filter = match obj.get("filter") {
            Some(Value::Null) | None => None,
            Some(v) => Some(parse_filter(v)?),
        };

        Ok(Self { take, skip, sort, filter })
    }
}

fn as_count(v: &Value, name: &str) -> Result<usize, GridError> {
    v.as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| GridError::InvalidOptions(format!("{} must be a non-negative integer", name)))
}

/// Only the first descriptor is honoured; the grid sorts by one column.
fn parse_sort(v: &Value) -> Result<Option<SortSpec>, GridError> {
    let first = match v {
        Value::Array(items) => match items.first() {
            Some(first) => first,
            None => return Ok(None),
        },
        other => other,
    };
    match first {
        Value::String(selector) => Ok(Some(SortSpec::asc(selector.clone()))),
        Value::Object(o) => {
            let selector = o
                .get("selector")
                .and_then(Value::as_str)
                .ok_or_else(|| GridError::InvalidOptions("sort descriptor without selector".into()))?;
            let desc = o.get("desc").and_then(Value::as_bool).unwrap_or(false);
            Ok(Some(SortSpec { selector: selector.to_string(), desc }))
        }
        other => Err(GridError::InvalidOptions(format!("unexpected sort descriptor: {}", other))),
    }
}

fn parse_filter(v: &Value) -> Result<FilterExpr, GridError> {
    let items = v
        .as_array()
        .ok_or_else(|| GridError::UnsupportedFilter(format!("expected an array, got {}", v)))?;

    // A group starts with a nested array; a lone triple starts with the field name.
    if !matches!(items.first(), Some(Value::Array(_))) {
        return Ok(FilterExpr::Single(parse_triple(items)?));
    }

    let mut all = Vec::new();
    for item in items {
        match item {
            Value::Array(inner) => all.push(parse_triple(inner)?),
            Value::String(op) if op.eq_ignore_ascii_case("and") => {}
            // The transport string only joins with `,`, so every other
            // connector is sent as a conjunction.
            other => warn!(connector = %other, "filter connector sent as \"and\""),
        }
    }
    Ok(FilterExpr::All(all))
}

fn parse_triple(items: &[Value]) -> Result<Comparison, GridError> {
    match items {
        [Value::String(field), Value::String(op), value] if !value.is_array() && !value.is_object() => {
            Ok(Comparison::new(field.clone(), op.clone(), scalar_text(value)))
        }
        _ => Err(GridError::UnsupportedFilter(format!(
            "expected [field, operator, value], got {}",
            Value::Array(items.to_vec())
        ))),
    }
}

fn scalar_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
