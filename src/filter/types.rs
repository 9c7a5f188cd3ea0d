use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::FilterError;

/// Query parameter carrying the server page.
pub const PAGE_PARAM: &str = "page";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    Name,
    Church,
    Fellowship,
    Cell,
    Department,
    Gender,
    Status,
    Phone,
    Country,
}

impl FilterKey {
    pub const ALL: [FilterKey; 9] = [
        FilterKey::Name,
        FilterKey::Church,
        FilterKey::Fellowship,
        FilterKey::Cell,
        FilterKey::Department,
        FilterKey::Gender,
        FilterKey::Status,
        FilterKey::Phone,
        FilterKey::Country,
    ];

    /// Name used in the query string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::Name => "name",
            FilterKey::Church => "church",
            FilterKey::Fellowship => "fellowship",
            FilterKey::Cell => "cell",
            FilterKey::Department => "department",
            FilterKey::Gender => "gender",
            FilterKey::Status => "status",
            FilterKey::Phone => "phone",
            FilterKey::Country => "country",
        }
    }

    pub fn from_query_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `child` is only meaningful within the currently selected `parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeRule {
    pub child: FilterKey,
    pub parent: FilterKey,
}

impl CascadeRule {
    pub const fn new(child: FilterKey, parent: FilterKey) -> Self {
        Self { child, parent }
    }
}

const CELLS_KEYS: &[FilterKey] = &[FilterKey::Name, FilterKey::Church, FilterKey::Fellowship];
const FELLOWSHIPS_KEYS: &[FilterKey] = &[FilterKey::Name, FilterKey::Church];
const WORKERS_KEYS: &[FilterKey] = &[
    FilterKey::Name,
    FilterKey::Church,
    FilterKey::Fellowship,
    FilterKey::Cell,
    FilterKey::Phone,
    FilterKey::Gender,
    FilterKey::Status,
    FilterKey::Department,
];
const CHURCHES_KEYS: &[FilterKey] = &[FilterKey::Name, FilterKey::Country];

const CELLS_RULES: &[CascadeRule] = &[CascadeRule::new(FilterKey::Fellowship, FilterKey::Church)];
const WORKERS_RULES: &[CascadeRule] = &[
    CascadeRule::new(FilterKey::Fellowship, FilterKey::Church),
    CascadeRule::new(FilterKey::Cell, FilterKey::Fellowship),
];

/// The list views that share the filter/URL-state model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Cells,
    Fellowships,
    Workers,
    Churches,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        ViewKind::Cells,
        ViewKind::Fellowships,
        ViewKind::Workers,
        ViewKind::Churches,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            ViewKind::Cells => "cells",
            ViewKind::Fellowships => "fellowships",
            ViewKind::Workers => "workers",
            ViewKind::Churches => "churches",
        }
    }

    /// Portal path of the list view, e.g. `/d/cells`.
    pub fn path(&self) -> String {
        format!("/d/{}", self.slug())
    }

    /// Backend collection endpoint, relative to the API base URL.
    pub fn endpoint(&self) -> String {
        format!("/{}", self.slug())
    }

    /// Filter keys accepted by this view, in query-string order.
    pub fn keys(&self) -> &'static [FilterKey] {
        match self {
            ViewKind::Cells => CELLS_KEYS,
            ViewKind::Fellowships => FELLOWSHIPS_KEYS,
            ViewKind::Workers => WORKERS_KEYS,
            ViewKind::Churches => CHURCHES_KEYS,
        }
    }

    pub fn accepts(&self, key: FilterKey) -> bool {
        self.keys().contains(&key)
    }

    pub fn cascade_rules(&self) -> &'static [CascadeRule] {
        match self {
            ViewKind::Cells => CELLS_RULES,
            ViewKind::Workers => WORKERS_RULES,
            ViewKind::Fellowships | ViewKind::Churches => &[],
        }
    }

    /// Resolve a view from a portal path such as `/d/cells`.
    pub fn from_path(path: &str) -> Option<Self> {
        let slug = path.trim_end_matches('/').strip_prefix("/d/")?;
        slug.parse().ok()
    }
}

impl FromStr for ViewKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.slug() == s)
            .ok_or_else(|| FilterError::UnknownView(s.to_string()))
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Current filters of one list view. Only keys the view declares are stored,
/// and stored values are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    view: ViewKind,
    values: BTreeMap<FilterKey, String>,
    page: u32,
}

impl FilterState {
    pub fn new(view: ViewKind) -> Self {
        Self {
            view,
            values: BTreeMap::new(),
            page: 1,
        }
    }

    pub fn view(&self) -> ViewKind {
        self.view
    }

    pub fn get(&self, key: FilterKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Set or clear a value. Blank values and keys the view does not
    /// declare are treated as a clear.
    pub fn set(&mut self, key: FilterKey, value: Option<String>) {
        match normalize_value(value) {
            Some(v) if self.view.accepts(key) => {
                self.values.insert(key, v);
            }
            _ => {
                self.values.remove(&key);
            }
        }
    }

    pub fn with(mut self, key: FilterKey, value: impl Into<String>) -> Self {
        self.set(key, Some(value.into()));
        self
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.set_page(page);
        self
    }

    /// Present values in the view's key order.
    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, &str)> + '_ {
        self.view
            .keys()
            .iter()
            .filter_map(|k| self.values.get(k).map(|v| (*k, v.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Query pairs (filters in key order, then `page`) as sent to the backend.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs: Vec<(&'static str, String)> = self
            .iter()
            .map(|(k, v)| (k.as_str(), v.to_string()))
            .collect();
        pairs.push((PAGE_PARAM, self.page.to_string()));
        pairs
    }
}

/// A partial update to a [`FilterState`]. `None` (or a blank string) clears
/// the key; `page: None` lets the codec reset the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPatch")]
pub struct FilterPatch {
    values: BTreeMap<FilterKey, Option<String>>,
    page: Option<u32>,
}

#[derive(Deserialize)]
struct RawPatch {
    #[serde(default, flatten)]
    values: BTreeMap<FilterKey, Option<String>>,
    #[serde(default)]
    page: Option<u32>,
}

impl From<RawPatch> for FilterPatch {
    fn from(raw: RawPatch) -> Self {
        let mut patch = FilterPatch { values: BTreeMap::new(), page: raw.page };
        for (key, value) in raw.values {
            patch.insert(key, value);
        }
        patch
    }
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: FilterKey, value: impl Into<String>) -> Self {
        self.insert(key, Some(value.into()));
        self
    }

    pub fn clear(mut self, key: FilterKey) -> Self {
        self.insert(key, None);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn insert(&mut self, key: FilterKey, value: Option<String>) {
        self.values.insert(key, normalize_value(value));
    }

    /// `Some(None)` when the patch clears `key`, `Some(Some(v))` when it sets it.
    pub fn get(&self, key: FilterKey) -> Option<Option<&str>> {
        self.values.get(&key).map(|v| v.as_deref())
    }

    pub fn contains(&self, key: FilterKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn clears(&self, key: FilterKey) -> bool {
        matches!(self.get(key), Some(None))
    }

    pub fn page_value(&self) -> Option<u32> {
        self.page
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.page.is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, Option<&str>)> + '_ {
        self.values.iter().map(|(k, v)| (*k, v.as_deref()))
    }
}

fn normalize_value(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_round_trip_through_paths() {
        for view in ViewKind::ALL {
            assert_eq!(ViewKind::from_path(&view.path()), Some(view));
        }
        assert_eq!(ViewKind::from_path("/d/cells/"), Some(ViewKind::Cells));
        assert_eq!(ViewKind::from_path("/x/cells"), None);
    }

    #[test]
    fn state_drops_blank_and_foreign_keys() {
        let mut state = FilterState::new(ViewKind::Fellowships);
        state.set(FilterKey::Name, Some("  ".to_string()));
        state.set(FilterKey::Cell, Some("9".to_string()));
        assert!(state.is_empty());
    }

    #[test]
    fn page_is_never_zero() {
        let state = FilterState::new(ViewKind::Cells).with_page(0);
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn patch_deserializes_nulls_as_clears() {
        let patch: FilterPatch =
            serde_json::from_value(serde_json::json!({"church": null, "cell": "", "name": "Kob"})).unwrap();
        assert!(patch.clears(FilterKey::Church));
        assert!(patch.clears(FilterKey::Cell));
        assert_eq!(patch.get(FilterKey::Name), Some(Some("Kob")));
        assert_eq!(patch.page_value(), None);
    }
}
