//! Color utilities for charts

/// Categorical palette, cycled by series index
pub const PALETTE: [&str; 8] = [
    "#3b82f6", // Blue
    "#f97316", // Orange
    "#22c55e", // Green
    "#ec4899", // Pink
    "#8b5cf6", // Purple
    "#eab308", // Yellow
    "#06b6d4", // Cyan
    "#ef4444", // Red
];

/// Get a categorical color from the palette
pub fn categorical_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}
