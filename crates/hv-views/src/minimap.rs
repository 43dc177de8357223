//! Overview strip for scrolling long bar charts

use hv_core::{ElementId, PageRect};
use hv_data::ReducedPage;

#[derive(Debug, Clone, PartialEq)]
pub struct MiniMapBar {
    pub elem: ElementId,
    pub label: String,
    pub value: f64,
    /// Value relative to the largest bar, 0..=1
    pub height: f32,
}

/// Bars of a reduced page plus the scroll thumb of the main window
#[derive(Debug, Clone, PartialEq)]
pub struct MiniMapModel {
    pub total_rows: usize,
    pub window: PageRect,
    pub bars: Vec<MiniMapBar>,
    /// Start of the visible window as a fraction of all rows
    pub thumb_start: f32,
    /// Visible share of all rows
    pub thumb_extent: f32,
}

impl MiniMapModel {
    pub fn new(reduced: &ReducedPage, window: PageRect) -> Self {
        let peak = reduced
            .rows
            .iter()
            .filter_map(|r| r.values.first())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));

        let bars = reduced
            .rows
            .iter()
            .map(|row| {
                let value = row.values.first().copied().unwrap_or(0.0);
                let height = if peak > 0.0 { (value.abs() / peak) as f32 } else { 0.0 };
                MiniMapBar {
                    elem: row.elem,
                    label: row.label.clone(),
                    value,
                    height,
                }
            })
            .collect();

        let total_rows = reduced.total_rows;
        let (thumb_start, thumb_extent) = if total_rows == 0 {
            (0.0, 1.0)
        } else {
            let visible = window.visible_rows(total_rows).max(1);
            (
                (window.top.min(total_rows) as f32 / total_rows as f32),
                (visible as f32 / total_rows as f32).min(1.0),
            )
        };

        Self {
            total_rows,
            window,
            bars,
            thumb_start,
            thumb_extent,
        }
    }

    /// First row to show when the thumb is dragged to `fraction`
    pub fn top_for(&self, fraction: f32) -> usize {
        let last_top = self.total_rows.saturating_sub(self.window.height);
        let top = (fraction.clamp(0.0, 1.0) * self.total_rows as f32).round() as usize;
        top.min(last_top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hv_data::ReducedRow;

    fn reduced(total_rows: usize) -> ReducedPage {
        ReducedPage {
            factor: 10,
            total_rows,
            source: PageRect::new(0, 0, 2, 100),
            rows: vec![
                ReducedRow { label: "a".into(), elem: ElementId(0), first_row: 0, values: vec![5.0] },
                ReducedRow { label: "b".into(), elem: ElementId(10), first_row: 10, values: vec![20.0] },
            ],
        }
    }

    #[test]
    fn test_thumb_from_window() {
        let model = MiniMapModel::new(&reduced(400), PageRect::new(100, 0, 2, 100));

        assert_eq!(model.thumb_start, 0.25);
        assert_eq!(model.thumb_extent, 0.25);
        assert_eq!(model.bars[0].height, 0.25);
        assert_eq!(model.bars[1].height, 1.0);
    }

    #[test]
    fn test_top_for_clamps_to_last_page() {
        let model = MiniMapModel::new(&reduced(400), PageRect::new(0, 0, 2, 100));

        assert_eq!(model.top_for(0.5), 200);
        assert_eq!(model.top_for(0.9), 300);
        assert_eq!(model.top_for(-1.0), 0);
    }

    #[test]
    fn test_empty_cube() {
        let model = MiniMapModel::new(&reduced(0), PageRect::default());
        assert_eq!(model.thumb_extent, 1.0);
        assert_eq!(model.top_for(0.5), 0);
    }
}
