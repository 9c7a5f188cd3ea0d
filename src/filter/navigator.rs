use super::codec::{Location, QueryCodec};
use super::error::FilterError;
use super::types::{FilterPatch, FilterState, ViewKind};

/// Owns the current location of one list view and its history.
///
/// Filter edits replace the current entry so that back/forward moves between
/// visits rather than individual keystrokes; explicit visits push.
#[derive(Debug, Clone)]
pub struct Navigator {
    codec: QueryCodec,
    entries: Vec<Location>,
    index: usize,
}

impl Navigator {
    pub fn new(view: ViewKind) -> Self {
        Self {
            codec: QueryCodec::new(view),
            entries: vec![Location::new(view.path(), None)],
            index: 0,
        }
    }

    /// Start at an existing location, which must belong to `view`.
    pub fn at(view: ViewKind, location: Location) -> Result<Self, FilterError> {
        if ViewKind::from_path(location.path()) != Some(view) {
            return Err(FilterError::WrongView {
                view,
                path: location.path().to_string(),
            });
        }
        Ok(Self {
            codec: QueryCodec::new(view),
            entries: vec![location],
            index: 0,
        })
    }

    pub fn view(&self) -> ViewKind {
        self.codec.view()
    }

    pub fn current(&self) -> &Location {
        &self.entries[self.index]
    }

    /// Re-parsed on every call; there is no other copy of the state.
    pub fn state(&self) -> FilterState {
        self.codec.read(self.current())
    }

    /// Cascade, encode and replace the current entry.
    pub fn update(&mut self, patch: &FilterPatch) -> &Location {
        let next = self.codec.resolve_and_update(self.current(), patch);
        self.replace(next);
        self.current()
    }

    pub fn clear(&mut self) -> &Location {
        let next = self.codec.clear(self.current());
        self.replace(next);
        self.current()
    }

    pub fn replace(&mut self, location: Location) {
        tracing::trace!(to = %location, "replace location");
        self.entries[self.index] = location;
    }

    /// Push a new entry, dropping any forward history.
    pub fn visit(&mut self, location: Location) {
        tracing::trace!(to = %location, "push location");
        self.entries.truncate(self.index + 1);
        self.entries.push(location);
        self.index += 1;
    }

    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }
}
