//! Binding between a renderer, a hypercube adapter and a selection session

use std::sync::Arc;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use uuid::Uuid;
use hv_core::{
    events::events::SelectionsConfirmed, Bounds, CancelOutcome, CommitOutcome, ElementId,
    OutsideClickOutcome, PointerEvent, PointerHub, PointerSubscription, SelectionCoordinator,
    SelectionPath, SelectionSessionState,
};
use hv_data::HypercubeAdapter;

use crate::config::VisualConfig;
use crate::minimap::MiniMapModel;
use crate::scene::{build_scene, SceneDescriptor, SceneInput};
use crate::{ViewError, VisualId};

/// Interaction events emitted by a renderer
#[derive(Debug, Clone, PartialEq)]
pub enum RendererEvent {
    InteractionStart,
    InteractionDelta {
        added: Vec<ElementId>,
        removed: Vec<ElementId>,
    },
    InteractionEnd,
}

/// Where a pointer event landed
#[derive(Debug, Clone, PartialEq)]
pub enum PointerOutcome {
    Inside,
    Outside(OutsideClickOutcome),
}

/// What the presentation layer shows about the current selection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionSummary {
    pub state: SelectionSessionState,
    pub count: usize,
    /// Label of the first pending element, when it is on the current page
    pub first_label: Option<String>,
    pub error: Option<String>,
}

/// One chart visual.
///
/// Owns its coordinator and pointer subscription; nothing is shared with other
/// visuals except the data session behind the adapter.
pub struct VisualBinding {
    id: VisualId,
    config: RwLock<VisualConfig>,
    adapter: Arc<HypercubeAdapter>,
    coordinator: Arc<SelectionCoordinator>,
    bounds: RwLock<Option<Bounds>>,
    pointer: Mutex<Option<PointerSubscription>>,
}

impl VisualBinding {
    pub fn new(
        config: VisualConfig,
        adapter: Arc<HypercubeAdapter>,
        coordinator: Arc<SelectionCoordinator>,
    ) -> Result<Self, ViewError> {
        config.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            config: RwLock::new(config),
            adapter,
            coordinator,
            bounds: RwLock::new(None),
            pointer: Mutex::new(None),
        })
    }

    pub fn id(&self) -> VisualId {
        self.id
    }

    pub fn config(&self) -> VisualConfig {
        self.config.read().clone()
    }

    pub fn adapter(&self) -> &Arc<HypercubeAdapter> {
        &self.adapter
    }

    pub fn coordinator(&self) -> &Arc<SelectionCoordinator> {
        &self.coordinator
    }

    /// Register an observer for confirmed selections
    pub fn on_confirmed<F>(&self, f: F)
    where
        F: FnMut(&SelectionsConfirmed) + Send + Sync + 'static,
    {
        self.coordinator.on_confirmed(f);
    }

    /// Screen area of the visual; clicks outside it are outside interactions
    pub fn set_bounds(&self, bounds: Bounds) {
        *self.bounds.write() = Some(bounds);
    }

    pub fn bounds(&self) -> Option<Bounds> {
        *self.bounds.read()
    }

    fn selection_path(&self) -> SelectionPath {
        SelectionPath::hypercube(self.config.read().dimension)
    }

    /// Start listening to document-level pointer events
    pub fn mount(&self, hub: &PointerHub) {
        let subscription = hub.subscribe();
        tracing::debug!("Visual {} mounted (pointer subscription {})", self.id, subscription.id());
        *self.pointer.lock() = Some(subscription);
    }

    pub fn is_mounted(&self) -> bool {
        self.pointer.lock().is_some()
    }

    /// Release the pointer subscription and revert any open selection
    pub async fn unmount(&self) -> Result<(), ViewError> {
        self.pointer.lock().take();
        if self.coordinator.state().is_open() {
            self.coordinator.cancel().await?;
        }
        tracing::debug!("Visual {} unmounted", self.id);
        Ok(())
    }

    /// Translate a renderer event into selection calls
    pub async fn handle_renderer_event(&self, event: RendererEvent) -> Result<(), ViewError> {
        match event {
            RendererEvent::InteractionStart => {
                if self.coordinator.state() == SelectionSessionState::Committing {
                    // Toggles already feed the session that follows the commit
                    tracing::debug!("Interaction started on {} during commit", self.id);
                    return Ok(());
                }
                self.coordinator.begin_selection(self.selection_path()).await?;
            }
            RendererEvent::InteractionDelta { added, removed } => {
                for elem in added.into_iter().chain(removed) {
                    self.coordinator.toggle(elem);
                }
            }
            RendererEvent::InteractionEnd => {
                tracing::trace!("Interaction ended on {}", self.id);
            }
        }
        Ok(())
    }

    /// Route a document-level pointer event
    pub async fn handle_pointer(&self, event: PointerEvent) -> Result<PointerOutcome, ViewError> {
        let inside = self.bounds().map(|b| b.contains(&event)).unwrap_or(false);
        if inside {
            return Ok(PointerOutcome::Inside);
        }

        let outcome = self.coordinator.outside_interaction().await?;
        match &outcome {
            OutsideClickOutcome::Committed(CommitOutcome::Committed { .. }) | OutsideClickOutcome::Closed => {
                self.refresh_quietly().await;
            }
            _ => {}
        }
        Ok(PointerOutcome::Outside(outcome))
    }

    /// Process every pointer event queued on the subscription. A failure on one
    /// event does not stop the rest.
    pub async fn drain_pointer_events(&self) -> Vec<Result<PointerOutcome, ViewError>> {
        let events: Vec<PointerEvent> = {
            let mut pointer = self.pointer.lock();
            match pointer.as_mut() {
                Some(subscription) => std::iter::from_fn(|| subscription.try_recv()).collect(),
                None => Vec::new(),
            }
        };

        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            let outcome = self.handle_pointer(event).await;
            if let Err(e) = &outcome {
                tracing::warn!("Pointer event on visual {} failed: {}", self.id, e);
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Toolbar confirm
    pub async fn confirm(&self) -> Result<CommitOutcome, ViewError> {
        let outcome = self.coordinator.commit().await?;
        if matches!(outcome, CommitOutcome::Committed { .. }) {
            self.refresh_quietly().await;
        }
        Ok(outcome)
    }

    /// Toolbar cancel
    pub async fn cancel(&self) -> Result<CancelOutcome, ViewError> {
        let outcome = self.coordinator.cancel().await?;
        if outcome == CancelOutcome::Reverted {
            self.refresh_quietly().await;
        }
        Ok(outcome)
    }

    /// Re-fetch the current window
    pub async fn refresh(&self) -> Result<(), ViewError> {
        self.adapter.fetch().await?;
        Ok(())
    }

    async fn refresh_quietly(&self) {
        if let Err(e) = self.adapter.fetch().await {
            tracing::warn!("Refresh of visual {} failed: {}", self.id, e);
        }
    }

    /// Build the scene for the current data and selection
    pub fn scene(&self) -> Result<SceneDescriptor, ViewError> {
        let snapshot = self
            .adapter
            .snapshot()
            .ok_or(ViewError::Data(hv_data::DataError::NotLoaded))?;
        let config = self.config.read().clone();
        let chart_type = config.effective_chart_type()?;
        let settings = config.resolve_settings()?;
        let selection = self.coordinator.snapshot();

        let error = self
            .adapter
            .last_error()
            .map(|e| e.to_string())
            .or_else(|| selection.last_error.clone());

        Ok(build_scene(SceneInput {
            visual: self.id,
            chart_type,
            settings: &settings,
            bar_height: config.options.bar_height(),
            layout: &snapshot.layout,
            page: &snapshot.page,
            selection: &selection,
            dimension: config.dimension,
            minimap: config.minimap,
            error,
        }))
    }

    pub fn selection_summary(&self) -> SelectionSummary {
        let selection = self.coordinator.snapshot();
        let dimension = self.config.read().dimension;

        let first_label = selection.pending.first().and_then(|elem| {
            let page = self.adapter.page()?;
            let column = dimension.checked_sub(page.rect.left)?;
            page.label_of(column, *elem).map(str::to_string)
        });

        SelectionSummary {
            state: selection.state,
            count: selection.pending.len(),
            first_label,
            error: selection.last_error,
        }
    }

    /// Minimap for the current window, if this visual shows one
    pub fn minimap(&self) -> Option<MiniMapModel> {
        let config = self.config.read().clone();
        let settings = config.resolve_settings().ok()?;
        if !(config.minimap && settings.minimap) {
            return None;
        }

        let factor = if config.reduced_data { config.reduced_factor } else { 1 };
        match self.adapter.reduced(factor) {
            Ok(reduced) => Some(MiniMapModel::new(&reduced, self.adapter.window())),
            Err(e) => {
                tracing::debug!("No minimap for visual {}: {}", self.id, e);
                None
            }
        }
    }

    /// Scroll the main window to the minimap position `fraction`
    pub async fn scroll_minimap(&self, fraction: f32) -> Result<(), ViewError> {
        let model = self.minimap().ok_or(ViewError::Data(hv_data::DataError::NotLoaded))?;
        let top = model.top_for(fraction);
        if top != self.adapter.window().top {
            self.adapter.offset(top).await?;
        }
        Ok(())
    }

    pub fn save_config(&self) -> Value {
        self.config.read().save_config()
    }

    /// Overlay a saved configuration. A changed page moves the adapter's
    /// window and reloads it.
    pub async fn load_config(&self, config: Value) -> Result<(), ViewError> {
        let moved = {
            let mut current = self.config.write();
            let before = current.page;
            current.load_config(config)?;
            (current.page != before).then_some(current.page)
        };
        if let Some(page) = moved {
            self.adapter.set_window(page);
            self.refresh().await?;
        }
        Ok(())
    }
}
