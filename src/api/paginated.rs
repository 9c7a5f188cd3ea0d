use serde::{Deserialize, Serialize};

/// One server page of a list endpoint. Fields other than these are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub per_page: u32,
    pub current_page: u32,
    pub last_page: u32,
    #[serde(default)]
    pub next_page_url: Option<String>,
    #[serde(default)]
    pub prev_page_url: Option<String>,
}

impl<T> PaginatedResult<T> {
    /// Stand-in for a page that could not be loaded.
    pub fn empty(page: u32) -> Self {
        Self {
            data: Vec::new(),
            per_page: 0,
            current_page: page.max(1),
            last_page: page.max(1),
            next_page_url: None,
            prev_page_url: None,
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.next_page_url.is_some()
    }

    pub fn has_previous_page(&self) -> bool {
        self.prev_page_url.is_some()
    }

    pub fn total_pages(&self) -> u32 {
        self.last_page.max(self.current_page).max(1)
    }
}
