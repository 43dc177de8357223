//! Coarsened overview pages

use serde::{Deserialize, Serialize};
use hv_core::{ElementId, HypercubeLayout, HypercubePage, PageRect};

use crate::DataError;

/// One overview row standing in for `factor` source rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedRow {
    /// Label of the first source row
    pub label: String,
    pub elem: ElementId,
    /// Absolute row index of the first source row
    pub first_row: usize,
    /// Average of each measure over the folded rows
    pub values: Vec<f64>,
}

/// A low resolution copy of a page, e.g. for a minimap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedPage {
    pub factor: usize,
    /// Row count of the whole cube, not of the reduced rows
    pub total_rows: usize,
    /// Window the source page covered
    pub source: PageRect,
    pub rows: Vec<ReducedRow>,
}

/// Fold every `factor` rows of `page` into one, sampling the first dimension
/// and averaging every measure.
pub fn reduce_page(
    layout: &HypercubeLayout,
    page: &HypercubePage,
    factor: usize,
) -> Result<ReducedPage, DataError> {
    if factor == 0 {
        return Err(DataError::InvalidFactor);
    }

    let measure_start = layout.dimensions.len().saturating_sub(page.rect.left);
    let rows = page
        .rows
        .chunks(factor)
        .enumerate()
        .map(|(chunk_idx, chunk)| {
            let first = &chunk[0];
            let (label, elem) = first
                .first()
                .map(|c| (c.text.clone(), c.elem))
                .unwrap_or_else(|| (String::new(), ElementId::NULL));

            let width = first.len().saturating_sub(measure_start);
            let values = (0..width)
                .map(|m| {
                    let nums: Vec<f64> = chunk
                        .iter()
                        .filter_map(|row| row.get(measure_start + m).and_then(|c| c.num))
                        .collect();
                    if nums.is_empty() {
                        0.0
                    } else {
                        nums.iter().sum::<f64>() / nums.len() as f64
                    }
                })
                .collect();

            ReducedRow {
                label,
                elem,
                first_row: page.rect.top + chunk_idx * factor,
                values,
            }
        })
        .collect();

    Ok(ReducedPage {
        factor,
        total_rows: layout.total_rows(),
        source: page.rect,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hv_core::{Cell, CellState, CubeSize, DimensionInfo, MeasureInfo};

    fn sample(rows: usize, top: usize) -> (HypercubeLayout, HypercubePage) {
        let layout = HypercubeLayout {
            dimensions: vec![DimensionInfo { title: "Month".into(), cardinal: 500 }],
            measures: vec![MeasureInfo { title: "Sales".into(), min: 0.0, max: 1000.0 }],
            size: CubeSize { columns: 2, rows: 500 },
        };
        let page = HypercubePage {
            rect: PageRect::new(top, 0, 2, rows),
            rows: (0..rows)
                .map(|i| {
                    vec![
                        Cell::dimension(format!("m{}", top + i), ElementId((top + i) as i64), CellState::Normal),
                        Cell::measure((i * 2) as f64),
                    ]
                })
                .collect(),
        };
        (layout, page)
    }

    #[test]
    fn test_reduce_averages_measures() {
        let (layout, page) = sample(6, 100);
        let reduced = reduce_page(&layout, &page, 3).unwrap();

        assert_eq!(reduced.rows.len(), 2);
        assert_eq!(reduced.rows[0].label, "m100");
        assert_eq!(reduced.rows[0].values, vec![2.0]);
        assert_eq!(reduced.rows[1].first_row, 103);
        assert_eq!(reduced.rows[1].values, vec![8.0]);
    }

    #[test]
    fn test_reduce_preserves_total_rows() {
        let (layout, page) = sample(7, 0);
        let reduced = reduce_page(&layout, &page, 3).unwrap();

        assert_eq!(reduced.total_rows, 500);
        assert_eq!(reduced.rows.len(), 3);
        assert_eq!(reduced.rows[2].values, vec![12.0]);
    }

    #[test]
    fn test_zero_factor() {
        let (layout, page) = sample(2, 0);
        assert_eq!(reduce_page(&layout, &page, 0), Err(DataError::InvalidFactor));
    }
}
