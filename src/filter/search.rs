use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::types::{FilterKey, FilterPatch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Pending { value: String, deadline: Instant },
    Committed,
}

/// Debounce between the search box draft and the `name` filter.
///
/// The draft follows every keystroke; a write is only released once input
/// has been quiet for `window`, and only the latest value is written.
#[derive(Debug, Clone)]
pub struct SearchBridge {
    draft: String,
    state: SearchState,
    window: Duration,
    // last value we wrote; its echo back from the URL is not an external change
    echo: Option<String>,
}

impl SearchBridge {
    pub fn new(initial: Option<&str>, window: Duration) -> Self {
        Self {
            draft: initial.unwrap_or_default().to_string(),
            state: SearchState::Idle,
            window,
            echo: None,
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            SearchState::Pending { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }

    /// Keystroke: update the draft now, (re)schedule the write.
    pub fn input(&mut self, value: impl Into<String>, now: Instant) {
        let value = value.into();
        self.draft = value.clone();
        self.state = SearchState::Pending {
            value,
            deadline: now + self.window,
        };
    }

    /// Release the pending write once its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> Option<FilterPatch> {
        let SearchState::Pending { value, deadline } = &self.state else {
            return None;
        };
        if now < *deadline {
            return None;
        }
        let value = value.trim().to_string();
        self.state = SearchState::Committed;
        self.echo = Some(value.clone());
        Some(name_patch(value))
    }

    /// The URL's `name` changed (back/forward, a clear elsewhere). Pulls the
    /// draft into line and drops any pending write; never produces a write.
    pub fn external_change(&mut self, url_name: Option<&str>) {
        let url_name = url_name.unwrap_or_default();
        if self.echo.as_deref() == Some(url_name) {
            self.echo = None;
            return;
        }
        self.echo = None;
        if url_name == self.draft {
            return;
        }
        tracing::debug!(from = %self.draft, to = url_name, "search draft reset from location");
        self.draft = url_name.to_string();
        self.state = SearchState::Idle;
    }

    /// Teardown: forget the pending write.
    pub fn cancel(&mut self) {
        if matches!(self.state, SearchState::Pending { .. }) {
            self.state = SearchState::Idle;
        }
    }
}

fn name_patch(value: String) -> FilterPatch {
    if value.is_empty() {
        FilterPatch::new().clear(FilterKey::Name)
    } else {
        FilterPatch::new().set(FilterKey::Name, value)
    }
}

#[derive(Debug)]
enum SearchEvent {
    Input(String),
    External(Option<String>),
}

/// Runs a [`SearchBridge`] on a tokio task. Committed patches arrive on the
/// receiver returned by [`spawn`](Self::spawn). Dropping the handle aborts
/// the task, so no write can land after teardown.
#[derive(Debug)]
pub struct DebouncedSearch {
    events: mpsc::UnboundedSender<SearchEvent>,
    task: JoinHandle<()>,
}

impl DebouncedSearch {
    pub fn spawn(
        initial: Option<String>,
        window: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<FilterPatch>) {
        let (events, mut inbox) = mpsc::unbounded_channel();
        let (commits, outbox) = mpsc::unbounded_channel();
        let mut bridge = SearchBridge::new(initial.as_deref(), window);

        let task = tokio::spawn(async move {
            loop {
                let pending = bridge.deadline();
                let wake = pending.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));
                tokio::select! {
                    event = inbox.recv() => match event {
                        Some(SearchEvent::Input(value)) => bridge.input(value, Instant::now()),
                        Some(SearchEvent::External(name)) => bridge.external_change(name.as_deref()),
                        None => break,
                    },
                    _ = sleep_until(wake), if pending.is_some() => {
                        if let Some(patch) = bridge.tick(Instant::now()) {
                            if commits.send(patch).is_err() {
                                break;
                            }
                        }
                    }
                }
            }
            bridge.cancel();
        });

        (Self { events, task }, outbox)
    }

    pub fn input(&self, value: impl Into<String>) {
        let _ = self.events.send(SearchEvent::Input(value.into()));
    }

    pub fn external_change(&self, name: Option<&str>) {
        let _ = self.events.send(SearchEvent::External(name.map(str::to_string)));
    }
}

impl Drop for DebouncedSearch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::error::TryRecvError;

    const WINDOW: Duration = Duration::from_millis(300);

    #[test]
    fn only_latest_value_is_committed() {
        let t0 = Instant::now();
        let mut bridge = SearchBridge::new(None, WINDOW);
        bridge.input("K", t0);
        bridge.input("Ko", t0 + Duration::from_millis(100));
        bridge.input("Kobiti", t0 + Duration::from_millis(200));
        assert_eq!(bridge.draft(), "Kobiti");

        assert_eq!(bridge.tick(t0 + Duration::from_millis(400)), None);
        let patch = bridge.tick(t0 + Duration::from_millis(500)).unwrap();
        assert_eq!(patch, FilterPatch::new().set(FilterKey::Name, "Kobiti"));
        assert_eq!(bridge.state(), &SearchState::Committed);
        assert_eq!(bridge.tick(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn emptied_box_clears_name() {
        let t0 = Instant::now();
        let mut bridge = SearchBridge::new(Some("Kob"), WINDOW);
        bridge.input("", t0);
        assert_eq!(bridge.tick(t0 + WINDOW), Some(FilterPatch::new().clear(FilterKey::Name)));
    }

    #[test]
    fn external_change_resets_draft_and_cancels() {
        let t0 = Instant::now();
        let mut bridge = SearchBridge::new(Some("Kob"), WINDOW);
        bridge.input("Kobi", t0);
        bridge.external_change(None);
        assert_eq!(bridge.draft(), "");
        assert_eq!(bridge.state(), &SearchState::Idle);
        assert_eq!(bridge.tick(t0 + WINDOW), None);
    }

    #[test]
    fn own_write_echo_is_not_external() {
        let t0 = Instant::now();
        let mut bridge = SearchBridge::new(None, WINDOW);
        bridge.input("ab", t0);
        bridge.tick(t0 + WINDOW).unwrap();
        bridge.input("abc", t0 + WINDOW);
        // navigation triggered by the "ab" write arrives late
        bridge.external_change(Some("ab"));
        assert_eq!(bridge.draft(), "abc");
        assert!(bridge.deadline().is_some());
    }

    #[test]
    fn cancel_drops_pending_write() {
        let t0 = Instant::now();
        let mut bridge = SearchBridge::new(None, WINDOW);
        bridge.input("x", t0);
        bridge.cancel();
        assert_eq!(bridge.tick(t0 + WINDOW), None);
    }

    #[tokio::test(start_paused = true)]
    async fn driver_writes_after_quiescence() {
        let (search, mut commits) = DebouncedSearch::spawn(None, WINDOW);
        for prefix in ["K", "Ko", "Kob", "Kobi", "Kobit", "Kobiti"] {
            search.input(prefix);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        let started = Instant::now();
        let patch = commits.recv().await.unwrap();
        assert_eq!(patch, FilterPatch::new().set(FilterKey::Name, "Kobiti"));
        assert!(started.elapsed() >= Duration::from_millis(250));
        assert_eq!(commits.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_driver_discards_pending_write() {
        let (search, mut commits) = DebouncedSearch::spawn(None, WINDOW);
        search.input("late");
        tokio::task::yield_now().await;
        drop(search);
        tokio::time::sleep(WINDOW * 2).await;
        assert!(commits.recv().await.is_none());
    }
}
