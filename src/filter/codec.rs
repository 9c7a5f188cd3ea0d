use std::fmt;

use serde::Serialize;
use url::form_urlencoded;

use super::cascade;
use super::error::FilterError;
use super::types::{FilterKey, FilterPatch, FilterState, ViewKind, PAGE_PARAM};

/// A portal address: path plus optional query string (without the `?`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    path: String,
    query: Option<String>,
}

impl Location {
    pub fn new(path: impl Into<String>, query: Option<String>) -> Self {
        Self {
            path: path.into(),
            query: query.filter(|q| !q.is_empty()),
        }
    }

    /// Parse an href such as `/d/cells?church=3&page=2`. Fragments are dropped.
    pub fn parse(href: &str) -> Result<Self, FilterError> {
        let href = href.split('#').next().unwrap_or_default();
        let (path, query) = match href.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (href, None),
        };
        if !path.starts_with('/') {
            return Err(FilterError::InvalidLocation(href.to_string()));
        }
        Ok(Self::new(path, query))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn href(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

impl Serialize for Location {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.href())
    }
}

/// Reads and writes one view's [`FilterState`] from/to the query string.
/// The query string is the only copy of the state; every write re-derives
/// it completely from the parsed state plus the patch.
#[derive(Debug, Clone, Copy)]
pub struct QueryCodec {
    view: ViewKind,
}

impl QueryCodec {
    pub fn new(view: ViewKind) -> Self {
        Self { view }
    }

    /// Codec for the view a location's path points at.
    pub fn for_location(location: &Location) -> Result<Self, FilterError> {
        ViewKind::from_path(location.path())
            .map(Self::new)
            .ok_or_else(|| FilterError::UnknownView(location.path().to_string()))
    }

    pub fn view(&self) -> ViewKind {
        self.view
    }

    /// Parse the state out of a location. Never fails: unknown keys are
    /// ignored, blank values are absent, and a missing or malformed page is 1.
    pub fn read(&self, location: &Location) -> FilterState {
        let mut state = FilterState::new(self.view);
        let Some(query) = location.query() else {
            return state;
        };

        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            if name == PAGE_PARAM {
                state.set_page(parse_page(&value));
                continue;
            }
            if let Some(key) = FilterKey::from_query_name(&name) {
                state.set(key, Some(value.into_owned()));
            }
        }
        state
    }

    /// Serialize a state onto the view's path. `page` is always written.
    pub fn write(&self, state: &FilterState) -> Location {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in state.to_query_pairs() {
            serializer.append_pair(name, &value);
        }
        Location::new(self.view.path(), Some(serializer.finish()))
    }

    /// Apply a patch to the state held by `location`. A non-empty patch that
    /// does not set `page` sends the view back to page 1.
    pub fn update(&self, location: &Location, patch: &FilterPatch) -> Location {
        let next = self.apply(self.read(location), patch);
        let mut written = self.write(&next);
        written.path = location.path().to_string();
        written
    }

    /// Run the view's cascade rules over `patch`, then [`update`](Self::update).
    pub fn resolve_and_update(&self, location: &Location, patch: &FilterPatch) -> Location {
        let previous = self.read(location);
        let effective = cascade::resolve(&previous, patch, self.view.cascade_rules());
        let next = self.apply(previous, &effective);
        let mut written = self.write(&next);
        written.path = location.path().to_string();
        written
    }

    /// Drop every filter: the bare path with no query string.
    pub fn clear(&self, location: &Location) -> Location {
        Location::new(location.path(), None)
    }

    fn apply(&self, mut state: FilterState, patch: &FilterPatch) -> FilterState {
        if patch.is_empty() {
            return state;
        }
        for (key, value) in patch.iter() {
            state.set(key, value.map(str::to_string));
        }
        state.set_page(patch.page_value().unwrap_or(1));
        state
    }
}

fn parse_page(raw: &str) -> u32 {
    raw.trim().parse::<u32>().ok().filter(|p| *p >= 1).unwrap_or(1)
}
