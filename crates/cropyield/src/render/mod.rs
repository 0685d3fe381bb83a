//! Output formats: the HTML page and plain terminal text.

pub mod html;
pub mod text;

pub use html::{render_page, PageView};

/// "Optimal Growing Conditions" tips.
pub const GROWING_CONDITIONS: &[&str] = &[
    "Wheat: 15-20°C, moderate rainfall",
    "Rice: 20-25°C, high rainfall",
    "Maize: 18-25°C, moderate rainfall",
    "Potato: 15-20°C, moderate rainfall",
];

/// "Soil Health Tips".
pub const SOIL_HEALTH_TIPS: &[&str] = &[
    "Rotate crops yearly to prevent nutrient depletion",
    "Consider cover crops during off-seasons",
    "Test soil pH and nutrient levels regularly",
    "Add organic matter to improve soil structure",
];

/// A stored yield for the recent-predictions list, at most two decimals.
#[must_use]
pub fn short_yield(yield_tons_per_hectare: f64) -> String {
    if yield_tons_per_hectare.is_finite() {
        format!("{}", (yield_tons_per_hectare * 100.0).round() / 100.0)
    } else {
        format!("{yield_tons_per_hectare}")
    }
}
