//! Demo document
//! Synthetic monthly sales used by the viewer

use hv_data::{DataError, MemoryDocument};

pub const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
pub const PRODUCTS: [&str; 3] = ["Tea", "Coffee", "Cocoa"];
const MONTHS: usize = 36;

/// Build the sales document: one row per month, region and product
pub fn sales_document() -> Result<MemoryDocument, DataError> {
    let mut months = Vec::new();
    let mut regions = Vec::new();
    let mut products = Vec::new();
    let mut sales = Vec::new();

    for m in 0..MONTHS {
        let label = format!("{}-{:02}", 2021 + m / 12, m % 12 + 1);
        let t = m as f64;
        for (r, region) in REGIONS.iter().enumerate() {
            for (p, product) in PRODUCTS.iter().enumerate() {
                // Trend plus a yearly season and pseudo-random noise
                let trend = 100.0 + t * 2.5 + r as f64 * 15.0;
                let seasonal = (t * std::f64::consts::PI / 6.0 + p as f64).sin() * 20.0;
                let noise = ((t + 1.0) * (r * 3 + p + 1) as f64 * 12.345).sin() * 5.0;

                months.push(label.clone());
                regions.push(region.to_string());
                products.push(product.to_string());
                sales.push((trend + seasonal + noise).max(0.0).round());
            }
        }
    }

    MemoryDocument::builder("sales")
        .field("Month", months)
        .field("Region", regions)
        .field("Product", products)
        .measure("Sales", sales)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sales_document_fields() {
        let doc = sales_document().unwrap();
        assert!(doc.hypercube(&["Month"], &["Sales"]).is_ok());
        assert!(doc.list_object("Region").is_ok());
        assert!(doc.list_object("Customer").is_err());
    }
}
