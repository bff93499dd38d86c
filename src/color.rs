use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Chart colours
// ---------------------------------------------------------------------------

fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

/// Blue used for time series and the leading bar of a ranking.
pub fn accent() -> Color32 {
    from_hsl(220.0, 0.75, 0.5)
}

/// Light grey for the non-highlighted bars (#D3D3D3).
pub fn muted() -> Color32 {
    from_hsl(0.0, 0.0, 0.827)
}

/// Bar fills for a ranking of `n` entries: the first is highlighted, the
/// rest are muted.
pub fn rank_colors(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| if i == 0 { accent() } else { muted() })
        .collect()
}
