//! Hypercube paging

mod reduce;

pub use reduce::{reduce_page, ReducedPage, ReducedRow};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use parking_lot::RwLock;
use hv_core::{DataSession, HypercubeLayout, HypercubePage, PageRect};

use crate::{AdapterConfig, DataError};

/// Layout and page fetched for the same window. Always replaced together.
#[derive(Debug, Clone)]
pub struct HypercubeSnapshot {
    pub layout: Arc<HypercubeLayout>,
    pub page: Arc<HypercubePage>,
}

impl HypercubeSnapshot {
    pub fn window(&self) -> PageRect {
        self.page.rect
    }

    /// Check that the page is a valid window of the layout
    fn validate(&self) -> Result<(), DataError> {
        let rect = self.page.rect;
        let expected_rows = rect.visible_rows(self.layout.total_rows());
        if self.page.rows.len() != expected_rows {
            return Err(DataError::PageMismatch(format!(
                "{} rows for a window expecting {}",
                self.page.rows.len(),
                expected_rows
            )));
        }

        let expected_width = self.layout.size.columns.saturating_sub(rect.left).min(rect.width);
        if let Some(row) = self.page.rows.iter().find(|row| row.len() != expected_width) {
            return Err(DataError::PageMismatch(format!(
                "row with {} cells, expected {}",
                row.len(),
                expected_width
            )));
        }
        Ok(())
    }
}

/// Pages a hypercube out of a data session.
///
/// A failed request keeps the last good snapshot and raises the error flag.
pub struct HypercubeAdapter {
    session: Arc<dyn DataSession>,
    config: AdapterConfig,
    current: RwLock<Option<HypercubeSnapshot>>,
    window: RwLock<PageRect>,
    error: RwLock<Option<DataError>>,
    /// Latest issued request; older responses are dropped
    request_seq: AtomicU64,
}

impl HypercubeAdapter {
    pub fn new(session: Arc<dyn DataSession>, config: AdapterConfig) -> Self {
        let window = config.window;
        Self {
            session,
            config,
            current: RwLock::new(None),
            window: RwLock::new(window),
            error: RwLock::new(None),
            request_seq: AtomicU64::new(0),
        }
    }

    pub fn session(&self) -> &Arc<dyn DataSession> {
        &self.session
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Window of the current snapshot, or the one `fetch` loads next
    pub fn window(&self) -> PageRect {
        *self.window.read()
    }

    pub fn snapshot(&self) -> Option<HypercubeSnapshot> {
        self.current.read().clone()
    }

    pub fn layout(&self) -> Option<Arc<HypercubeLayout>> {
        self.current.read().as_ref().map(|s| s.layout.clone())
    }

    pub fn page(&self) -> Option<Arc<HypercubePage>> {
        self.current.read().as_ref().map(|s| s.page.clone())
    }

    /// Last failure since the last successful load
    pub fn last_error(&self) -> Option<DataError> {
        self.error.read().clone()
    }

    pub fn has_error(&self) -> bool {
        self.error.read().is_some()
    }

    /// Re-fetch layout and page for the current window
    pub async fn fetch(&self) -> Result<HypercubeSnapshot, DataError> {
        let window = self.window();
        self.load(window).await
    }

    /// Move the window to start at `new_top`, keeping its width and height
    pub async fn offset(&self, new_top: usize) -> Result<HypercubeSnapshot, DataError> {
        let window = self.window().with_top(new_top);
        self.load(window).await
    }

    /// Point the adapter at a new window. Responses to requests issued for the
    /// old window are dropped; the next `fetch` loads the new one.
    pub fn set_window(&self, window: PageRect) {
        self.request_seq.fetch_add(1, Ordering::SeqCst);
        *self.window.write() = window;
        tracing::debug!(
            "Window moved to top={} left={} width={} height={}",
            window.top, window.left, window.width, window.height
        );
    }

    /// Overview of the current page, folding `by_factor` rows into one
    pub fn reduced(&self, by_factor: usize) -> Result<ReducedPage, DataError> {
        let snapshot = self.snapshot().ok_or(DataError::NotLoaded)?;
        reduce_page(&snapshot.layout, &snapshot.page, by_factor)
    }

    /// Overview using the configured factor
    pub fn reduced_default(&self) -> Result<ReducedPage, DataError> {
        self.reduced(self.config.reduced_factor)
    }

    async fn load(&self, window: PageRect) -> Result<HypercubeSnapshot, DataError> {
        let seq = self.request_seq.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(
            "Requesting page top={} left={} width={} height={} from {}",
            window.top, window.left, window.width, window.height,
            self.session.session_name()
        );

        let result = self.request(window).await;

        if self.request_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!("Dropping superseded page response (top={})", window.top);
            return result;
        }

        match result {
            Ok(snapshot) => {
                *self.current.write() = Some(snapshot.clone());
                *self.window.write() = window;
                *self.error.write() = None;
                tracing::debug!("Loaded {} rows at top={}", snapshot.page.len(), window.top);
                Ok(snapshot)
            }
            Err(e) => {
                if e.is_fatal() {
                    tracing::error!("Data session {} closed", self.session.session_name());
                } else {
                    tracing::warn!("Page request failed, keeping last good page: {}", e);
                }
                *self.error.write() = Some(e.clone());
                Err(e)
            }
        }
    }

    async fn request(&self, window: PageRect) -> Result<HypercubeSnapshot, DataError> {
        let layout = self.session.get_layout().await?;
        let page = self.session.get_page(window).await?;
        let snapshot = HypercubeSnapshot {
            layout: Arc::new(layout),
            page: Arc::new(page),
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{MemoryDocument, Operation};
    use hv_core::SessionError;

    fn document(rows: usize) -> MemoryDocument {
        let labels: Vec<String> = (0..rows).map(|i| format!("item-{:03}", i)).collect();
        let values: Vec<f64> = (0..rows).map(|i| i as f64).collect();
        MemoryDocument::builder("paging")
            .field("Item", labels)
            .measure("Value", values)
            .build()
            .unwrap()
    }

    fn adapter(doc: &MemoryDocument, height: usize) -> (Arc<crate::MemoryObject>, HypercubeAdapter) {
        let object = Arc::new(doc.hypercube(&["Item"], &["Value"]).unwrap());
        let config = AdapterConfig {
            window: PageRect::new(0, 0, 2, height),
            ..AdapterConfig::default()
        };
        (object.clone(), HypercubeAdapter::new(object, config))
    }

    #[tokio::test]
    async fn test_fetch_loads_layout_and_page() {
        let doc = document(120);
        let (_object, adapter) = adapter(&doc, 40);

        let snapshot = adapter.fetch().await.unwrap();
        assert_eq!(snapshot.layout.total_rows(), 120);
        assert_eq!(snapshot.page.len(), 40);
        assert_eq!(snapshot.page.rows[0][0].text, "item-000");
        assert!(!adapter.has_error());
    }

    #[tokio::test]
    async fn test_offset_replaces_page_and_layout_together() {
        let doc = document(120);
        let (_object, adapter) = adapter(&doc, 40);
        adapter.fetch().await.unwrap();

        let snapshot = adapter.offset(50).await.unwrap();

        assert_eq!(snapshot.window(), PageRect::new(50, 0, 2, 40));
        assert_eq!(adapter.window().top, 50);
        let current = adapter.snapshot().unwrap();
        assert!(Arc::ptr_eq(&current.page, &snapshot.page));
        assert!(Arc::ptr_eq(&current.layout, &snapshot.layout));
        assert_eq!(current.page.rows[0][0].text, "item-050");
        assert_eq!(current.page.states(0).len(), current.page.len());
        assert_eq!(current.page.len(), current.window().visible_rows(current.layout.total_rows()));
    }

    #[tokio::test]
    async fn test_offset_near_end_returns_partial_page() {
        let doc = document(120);
        let (_object, adapter) = adapter(&doc, 40);

        let snapshot = adapter.offset(100).await.unwrap();
        assert_eq!(snapshot.page.len(), 20);
    }

    #[tokio::test]
    async fn test_failed_request_keeps_last_good_page() {
        let doc = document(120);
        let (object, adapter) = adapter(&doc, 40);
        adapter.fetch().await.unwrap();

        object.fail_next(Operation::GetPage, SessionError::Timeout);
        let err = adapter.offset(50).await.unwrap_err();

        assert_eq!(err, DataError::Session(SessionError::Timeout));
        assert!(adapter.has_error());
        let current = adapter.snapshot().unwrap();
        assert_eq!(current.window().top, 0);
        assert_eq!(current.page.len(), 40);
        assert_eq!(adapter.window().top, 0);

        adapter.offset(50).await.unwrap();
        assert!(!adapter.has_error());
    }

    #[tokio::test]
    async fn test_set_window_applies_on_next_fetch() {
        let doc = document(120);
        let (_object, adapter) = adapter(&doc, 40);
        adapter.fetch().await.unwrap();

        adapter.set_window(PageRect::new(20, 0, 2, 5));
        assert_eq!(adapter.snapshot().unwrap().page.len(), 40);

        let snapshot = adapter.fetch().await.unwrap();
        assert_eq!(snapshot.window(), PageRect::new(20, 0, 2, 5));
        assert_eq!(snapshot.page.len(), 5);
        assert_eq!(snapshot.page.rows[0][0].text, "item-020");
    }

    #[tokio::test]
    async fn test_closed_session_is_fatal() {
        let doc = document(10);
        let (_object, adapter) = adapter(&doc, 40);
        doc.close();

        let err = adapter.fetch().await.unwrap_err();
        assert!(err.is_fatal());
        assert!(adapter.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_reduced_requires_data() {
        let doc = document(10);
        let (_object, adapter) = adapter(&doc, 40);
        assert_eq!(adapter.reduced(2).unwrap_err(), DataError::NotLoaded);

        adapter.fetch().await.unwrap();
        let reduced = adapter.reduced(4).unwrap();
        assert_eq!(reduced.rows.len(), 3);
        assert_eq!(reduced.total_rows, 10);
    }
}
