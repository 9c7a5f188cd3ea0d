//! Paginated list table.
//!
//! Sorting and the inline search box only ever see the rows of the currently
//! loaded server page. Server-side filters decide which page is loaded; the
//! table's own page cursor moves in lockstep with the server page.

pub mod column;

pub use column::{ColumnKey, ColumnType, SortDirection, TableSpec};

use serde::Serialize;
use serde_json::Value;

use crate::api::PaginatedResult;
use column::{compare_cells, lookup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    pub fn from_result<T>(result: &PaginatedResult<T>) -> Self {
        Self {
            page: result.current_page.max(1),
            total_pages: result.total_pages(),
            has_next_page: result.has_next_page(),
            has_previous_page: result.has_previous_page(),
        }
    }
}

/// Shown instead of an empty table body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyState {
    pub illustration: &'static str,
    pub message: String,
}

impl EmptyState {
    pub fn no_results() -> Self {
        Self {
            illustration: "empty-table",
            message: "No records found".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedColumn {
    pub name: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedRow {
    pub id: Option<String>,
    pub href: Option<String>,
    pub cells: Vec<String>,
}

/// Serializable snapshot of a table, ready for a client to draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub columns: Vec<RenderedColumn>,
    pub rows: Vec<RenderedRow>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty: Option<EmptyState>,
}

#[derive(Debug, Clone)]
pub struct Table {
    spec: TableSpec,
    rows: Vec<Value>,
    pagination: Pagination,
    sort: Option<(String, SortDirection)>,
    search: String,
}

impl Table {
    pub fn new(spec: TableSpec, result: PaginatedResult<Value>) -> Self {
        let pagination = Pagination::from_result(&result);
        Self {
            spec,
            rows: result.data,
            pagination,
            sort: None,
            search: String::new(),
        }
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Sort the loaded page by a column. Unknown columns are ignored.
    pub fn sort_by(&mut self, column: &str, direction: SortDirection) {
        if self.spec.column(column).is_some() {
            self.sort = Some((column.to_string(), direction));
        }
    }

    pub fn search(&mut self, text: &str) {
        self.search = text.trim().to_lowercase();
    }

    /// Rows of the loaded page that survive the inline search, in sort order.
    pub fn visible_rows(&self) -> Vec<&Value> {
        let mut rows: Vec<&Value> = self.rows.iter().filter(|r| self.matches(r)).collect();
        if let Some((name, direction)) = &self.sort {
            if let Some(column) = self.spec.column(name) {
                rows.sort_by(|a, b| direction.apply(compare_cells(&column.render(a), &column.render(b))));
            }
        }
        rows
    }

    /// Detail route for a row, `/{path_name}/{id}`.
    pub fn row_href(&self, row: &Value) -> Option<String> {
        row_id(row).map(|id| format!("/{}/{}", self.spec.path_name.trim_matches('/'), id))
    }

    /// Advance the table cursor and hand the new server page to the caller.
    /// Returns false (and does nothing) on the last page.
    pub fn next_page<F: FnOnce(u32)>(&mut self, on_next_page: F) -> bool {
        if !self.pagination.has_next_page {
            return false;
        }
        self.move_to(self.pagination.page + 1);
        on_next_page(self.pagination.page);
        true
    }

    pub fn previous_page<F: FnOnce(u32)>(&mut self, on_previous_page: F) -> bool {
        if !self.pagination.has_previous_page || self.pagination.page <= 1 {
            return false;
        }
        self.move_to(self.pagination.page - 1);
        on_previous_page(self.pagination.page);
        true
    }

    pub fn render(&self) -> TableView {
        let rows: Vec<RenderedRow> = self
            .visible_rows()
            .into_iter()
            .map(|row| RenderedRow {
                id: row_id(row),
                href: self.row_href(row),
                cells: self.spec.columns.iter().map(|c| c.render(row)).collect(),
            })
            .collect();
        let empty = rows.is_empty().then(EmptyState::no_results);
        TableView {
            columns: self
                .spec
                .columns
                .iter()
                .map(|c| RenderedColumn {
                    name: c.name.clone(),
                    title: c.title.clone(),
                })
                .collect(),
            rows,
            pagination: self.pagination,
            empty,
        }
    }

    fn move_to(&mut self, page: u32) {
        self.pagination.page = page;
        self.pagination.has_previous_page = page > 1;
        self.pagination.has_next_page = page < self.pagination.total_pages;
    }

    fn matches(&self, row: &Value) -> bool {
        if self.search.is_empty() {
            return true;
        }
        self.spec.search_keys.iter().any(|key| {
            let text = match self.spec.column(key) {
                Some(column) => column.render(row),
                None => match lookup(row, key) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                },
            };
            text.to_lowercase().contains(&self.search)
        })
    }
}

fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ViewKind;
    use serde_json::json;

    fn page(rows: Vec<Value>, current: u32, last: u32) -> PaginatedResult<Value> {
        PaginatedResult {
            data: rows,
            per_page: 15,
            current_page: current,
            last_page: last,
            next_page_url: (current < last).then(|| format!("/workers?page={}", current + 1)),
            prev_page_url: (current > 1).then(|| format!("/workers?page={}", current - 1)),
        }
    }

    fn workers() -> Table {
        Table::new(
            TableSpec::for_view(ViewKind::Workers),
            page(
                vec![
                    json!({"id": 7, "first_name": "Yaw", "last_name": "Boateng", "phone": "024"}),
                    json!({"id": 3, "first_name": "ama", "last_name": "Owusu", "phone": "020"}),
                    json!({"id": "x9", "first_name": "Kofi", "last_name": "Adjei", "phone": "027"}),
                ],
                1,
                3,
            ),
        )
    }

    #[test]
    fn renders_compound_cells_and_links() {
        let view = workers().render();
        assert_eq!(view.rows[0].cells[0], "Yaw Boateng");
        assert_eq!(view.rows[0].href.as_deref(), Some("/d/workers/7"));
        assert_eq!(view.rows[2].href.as_deref(), Some("/d/workers/x9"));
        assert!(view.empty.is_none());
    }

    #[test]
    fn sort_only_reorders_loaded_page() {
        let mut table = workers();
        table.sort_by("first_name", SortDirection::Asc);
        let names: Vec<String> = table.render().rows.into_iter().map(|r| r.cells[0].clone()).collect();
        assert_eq!(names, vec!["ama Owusu", "Kofi Adjei", "Yaw Boateng"]);

        table.sort_by("phone", SortDirection::Desc);
        let ids: Vec<Option<String>> = table.render().rows.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some("x9".into()), Some("7".into()), Some("3".into())]);
    }

    #[test]
    fn inline_search_narrows_current_page() {
        let mut table = workers();
        table.search("KOF");
        let view = table.render();
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.pagination.page, 1);

        table.search("nobody");
        assert_eq!(table.render().empty, Some(EmptyState::no_results()));
    }

    #[test]
    fn next_and_previous_drive_server_page() {
        let mut table = workers();
        let mut requested = Vec::new();
        assert!(!table.previous_page(|p| requested.push(p)));
        assert!(table.next_page(|p| requested.push(p)));
        assert!(table.next_page(|p| requested.push(p)));
        assert!(!table.next_page(|p| requested.push(p)));
        assert!(table.previous_page(|p| requested.push(p)));
        assert_eq!(requested, vec![2, 3, 2]);
        assert!(table.pagination().has_next_page);
    }

    #[test]
    fn empty_page_shows_placeholder() {
        let table = Table::new(TableSpec::for_view(ViewKind::Cells), PaginatedResult::empty(1));
        let view = table.render();
        assert!(view.rows.is_empty());
        assert_eq!(view.empty, Some(EmptyState::no_results()));
        assert_eq!(view.columns.len(), 5);
    }
}
