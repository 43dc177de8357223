//! Hypercube viewer
//!
//! Hosts one chart visual and a dropdown over the demo sales document so
//! selections made in either show up in the other.

use std::sync::Arc;
use anyhow::{Context as _, Result};
use eframe::egui::{self, Context, Sense, Stroke, Ui};
use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

use hv_core::{
    DataSession, EventBus, PageRect, PointerEvent, PointerHub, SelectionCoordinator,
};
use hv_data::{HypercubeAdapter, MemoryDocument, MemoryObject};
use hv_ui::{
    visual_widget_id, Dropdown, DropdownAction, DropdownOptions, DropdownView, SelectionToolbar,
    Theme, ToolbarAction, ToolbarView,
};
use hv_views::{ChartType, ScenePlot, ViewError, VisualBinding, VisualConfig};

mod demo;

const MINIMAP_HEIGHT: f32 = 40.0;

struct ViewerApp {
    runtime: Runtime,
    /// Kept alive for the sessions handed out below
    _document: MemoryDocument,
    hub: PointerHub,
    visual: Arc<VisualBinding>,
    regions: Arc<MemoryObject>,
    plot: ScenePlot,
    toolbar: SelectionToolbar,
    dropdown: Dropdown,
    dropdown_view: Option<DropdownView>,
    theme: Theme,
    status: Option<String>,
    confirmed: Arc<Mutex<Vec<String>>>,
}

impl ViewerApp {
    fn new(runtime: Runtime) -> Result<Self> {
        let document = demo::sales_document().context("building demo document")?;
        let sales = Arc::new(document.hypercube(&["Month"], &["Sales"])?);
        let regions = Arc::new(document.list_object("Region")?);

        let mut config = VisualConfig::new(ChartType::VerticalBarchart);
        config.page = PageRect::new(0, 0, 2, 12);
        config.reduced_factor = 3;

        let adapter = Arc::new(HypercubeAdapter::new(sales.clone(), config.adapter_config()));
        let coordinator = Arc::new(SelectionCoordinator::new(sales, Arc::new(EventBus::new())));
        let visual = Arc::new(VisualBinding::new(config, adapter, coordinator)?);

        let hub = PointerHub::new();
        visual.mount(&hub);

        let confirmed = Arc::new(Mutex::new(Vec::new()));
        let log = confirmed.clone();
        visual.on_confirmed(move |event| {
            log.lock().push(format!("{}: {} value(s)", event.path, event.values.len()));
        });

        let options = DropdownOptions {
            multiple: true,
            placeholder: Some("All regions".to_string()),
            clear_selections_row: Some("Clear selections".to_string()),
            ..DropdownOptions::default()
        };

        let mut app = Self {
            runtime,
            _document: document,
            hub,
            visual,
            regions,
            plot: ScenePlot::default(),
            toolbar: SelectionToolbar::default(),
            dropdown: Dropdown::new("region", options),
            dropdown_view: None,
            theme: Theme::light(),
            status: None,
            confirmed,
        };
        app.reload();
        info!("Viewer ready with visual {}", app.visual.id());
        Ok(app)
    }

    /// Re-fetch the chart window and the dropdown list
    fn reload(&mut self) {
        if let Err(e) = self.runtime.block_on(self.visual.refresh()) {
            self.report(e);
        }
        let regions = self.regions.clone();
        let options = self.dropdown.options.clone();
        let view = self.runtime.block_on(async move {
            let layout = regions.get_layout().await?;
            let page = regions.get_page(PageRect::default()).await?;
            Ok::<_, hv_core::SessionError>(DropdownView::new(&layout, &page, &options))
        });
        match view {
            Ok(view) => self.dropdown_view = Some(view),
            Err(e) => self.report(e),
        }
    }

    fn report(&mut self, e: impl std::fmt::Display) {
        warn!("{}", e);
        self.status = Some(e.to_string());
    }

    fn dropdown_ui(&mut self, ui: &mut Ui) {
        let Some(view) = self.dropdown_view.clone() else {
            ui.label("Loading regions…");
            return;
        };
        let actions = self.dropdown.ui(ui, &view, &self.theme);
        if actions.is_empty() {
            return;
        }
        for action in &actions {
            if let Err(e) = self.runtime.block_on(action.apply(self.regions.as_ref())) {
                self.report(e);
            }
        }
        if actions.iter().any(|a| !matches!(a, DropdownAction::Open)) {
            self.reload();
        }
    }

    fn toolbar_ui(&mut self, ui: &mut Ui) {
        let summary = self.visual.selection_summary();
        let view = ToolbarView::new(
            summary.state,
            summary.count,
            summary.first_label.as_deref(),
            summary.error.as_deref(),
        );
        match self.toolbar.ui(ui, &view, &self.theme) {
            Some(ToolbarAction::Confirm) => {
                if let Err(e) = self.runtime.block_on(self.visual.confirm()) {
                    self.report(e);
                }
                self.reload();
            }
            Some(ToolbarAction::Cancel) => {
                if let Err(e) = self.runtime.block_on(self.visual.cancel()) {
                    self.report(e);
                }
            }
            None => {}
        }
    }

    fn chart_ui(&mut self, ui: &mut Ui) {
        let scene = match self.visual.scene() {
            Ok(scene) => scene,
            Err(ViewError::Data(hv_data::DataError::NotLoaded)) => {
                ui.label("No data");
                return;
            }
            Err(e) => {
                self.report(e);
                return;
            }
        };

        if let Some(title) = &scene.title {
            ui.heading(title);
        }
        let response = self.plot.show(ui, &scene);
        self.visual.set_bounds(response.bounds);
        for event in response.events {
            if let Err(e) = self.runtime.block_on(self.visual.handle_renderer_event(event)) {
                self.report(e);
            }
        }
        if let Some(error) = &scene.error {
            ui.colored_label(self.theme.palette.error.main, error);
        }
    }

    fn minimap_ui(&mut self, ui: &mut Ui) {
        let Some(model) = self.visual.minimap() else {
            return;
        };
        let width = ui.available_width();
        let (rect, _) = ui.allocate_exact_size(egui::vec2(width, MINIMAP_HEIGHT), Sense::hover());
        let response = ui.interact(
            rect,
            visual_widget_id(self.visual.id(), "minimap").id(),
            Sense::click_and_drag(),
        );
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, self.theme.palette.divider.gamma_multiply(0.3));

        if !model.bars.is_empty() {
            let bar_width = rect.width() / model.bars.len() as f32;
            for (i, bar) in model.bars.iter().enumerate() {
                let x = rect.left() + i as f32 * bar_width;
                let top = rect.bottom() - bar.height * rect.height();
                painter.rect_filled(
                    egui::Rect::from_min_max(egui::pos2(x + 1.0, top), egui::pos2(x + bar_width - 1.0, rect.bottom())),
                    0.0,
                    self.theme.palette.primary.light,
                );
            }
        }

        let thumb = egui::Rect::from_min_max(
            egui::pos2(rect.left() + model.thumb_start * rect.width(), rect.top()),
            egui::pos2(
                rect.left() + (model.thumb_start + model.thumb_extent) * rect.width(),
                rect.bottom(),
            ),
        );
        painter.rect_stroke(thumb, 0.0, Stroke::new(2.0, self.theme.palette.primary.dark));

        if response.clicked() || response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                let fraction = ((pos.x - rect.left()) / rect.width()).clamp(0.0, 1.0);
                if let Err(e) = self.runtime.block_on(self.visual.scroll_minimap(fraction)) {
                    self.report(e);
                }
            }
        }
        response.on_hover_text(format!("{} rows", model.total_rows));
    }

    /// Forward this frame's clicks to every mounted visual
    fn dispatch_pointer(&mut self, ctx: &Context) {
        let clicked = ctx.input(|i| {
            i.pointer
                .any_pressed()
                .then(|| i.pointer.interact_pos())
                .flatten()
        });
        if let Some(pos) = clicked {
            self.hub.dispatch(PointerEvent::new(pos.x, pos.y));
        }
        let results = self.runtime.block_on(self.visual.drain_pointer_events());
        if results.is_empty() {
            return;
        }
        for result in &results {
            match result {
                Ok(outcome) => tracing::debug!("Pointer outcome: {:?}", outcome),
                Err(e) => self.report(e),
            }
        }
        self.reload();
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("filters").show(ctx, |ui| {
            ui.horizontal(|ui| self.dropdown_ui(ui));
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let state = self.visual.coordinator().state();
                ui.label(format!("Selection: {}", state));
                if let Some(last) = self.confirmed.lock().last() {
                    ui.separator();
                    ui.label(format!("Last confirmed {}", last));
                }
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.colored_label(self.theme.palette.error.main, status);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.toolbar_ui(ui);
            self.chart_ui(ui);
            self.minimap_ui(ui);
        });

        self.dispatch_pointer(ctx);
    }
}

impl Drop for ViewerApp {
    fn drop(&mut self) {
        if let Err(e) = self.runtime.block_on(self.visual.unmount()) {
            error!("Unmount failed: {}", e);
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let runtime = Runtime::new().context("starting tokio runtime")?;
    let app = ViewerApp::new(runtime)?;
    let theme = app.theme.clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 640.0])
            .with_min_inner_size([640.0, 480.0]),
        default_theme: eframe::Theme::Light,
        persist_window: false,
        ..Default::default()
    };

    info!("Starting hypercube viewer");
    eframe::run_native(
        "Hypercube Viewer",
        options,
        Box::new(move |cc| {
            hv_ui::apply_theme(&cc.egui_ctx, &theme);
            Box::new(app)
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
