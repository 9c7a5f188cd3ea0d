use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::ViewKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[default]
    Text,
    Date,
    Number,
}

/// One display column. A compound column joins two row fields
/// (e.g. first and last name) into a single cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnKey {
    pub name: String,
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compound_key: Option<String>,
}

impl ColumnKey {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            kind: ColumnType::Text,
            compound_key: None,
        }
    }

    pub fn compound(name: impl Into<String>, second: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            compound_key: Some(second.into()),
            ..Self::new(name, title)
        }
    }

    pub fn of_type(mut self, kind: ColumnType) -> Self {
        self.kind = kind;
        self
    }

    /// Display text for this column on `row`. Rows are never modified.
    pub fn render(&self, row: &Value) -> String {
        let first = render_value(lookup(row, &self.name), self.kind);
        match &self.compound_key {
            Some(second) => {
                let second = render_value(lookup(row, second), self.kind);
                [first, second]
                    .into_iter()
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            }
            None => first,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Declarative table contract for one list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Detail route prefix; rows link to `/{path_name}/{id}`.
    pub path_name: String,
    pub columns: Vec<ColumnKey>,
    /// Columns or fields matched by the inline search box.
    pub search_keys: Vec<String>,
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&ColumnKey> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn for_view(view: ViewKind) -> Self {
        let (columns, search_keys) = match view {
            ViewKind::Cells => (
                vec![
                    ColumnKey::new("name", "Cell"),
                    ColumnKey::compound("leader.first_name", "leader.last_name", "Leader"),
                    ColumnKey::new("fellowship.name", "Fellowship"),
                    ColumnKey::new("members_count", "Members").of_type(ColumnType::Number),
                    ColumnKey::new("created_at", "Created").of_type(ColumnType::Date),
                ],
                vec!["name", "leader.first_name", "fellowship.name"],
            ),
            ViewKind::Fellowships => (
                vec![
                    ColumnKey::new("name", "Fellowship"),
                    ColumnKey::compound("leader.first_name", "leader.last_name", "Leader"),
                    ColumnKey::new("church.name", "Church"),
                    ColumnKey::new("cells_count", "Cells").of_type(ColumnType::Number),
                ],
                vec!["name", "leader.first_name", "church.name"],
            ),
            ViewKind::Workers => (
                vec![
                    ColumnKey::compound("first_name", "last_name", "Name"),
                    ColumnKey::new("phone", "Phone"),
                    ColumnKey::new("gender", "Gender"),
                    ColumnKey::new("department", "Department"),
                    ColumnKey::new("status", "Status"),
                ],
                vec!["first_name", "phone", "department"],
            ),
            ViewKind::Churches => (
                vec![
                    ColumnKey::new("name", "Church"),
                    ColumnKey::new("country", "Country"),
                    ColumnKey::compound("pastor.first_name", "pastor.last_name", "Pastor"),
                    ColumnKey::new("created_at", "Created").of_type(ColumnType::Date),
                ],
                vec!["name", "country"],
            ),
        };
        Self {
            path_name: format!("d/{}", view.slug()),
            columns,
            search_keys: search_keys.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Resolve a dotted field path (`leader.first_name`) on a row.
pub fn lookup<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(row, |value, segment| value.get(segment))
}

fn render_value(value: Option<&Value>, kind: ColumnType) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) if kind == ColumnType::Date => format_date(s),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn format_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

/// Numbers sort numerically, everything else case-insensitively.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}
