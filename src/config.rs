use std::path::PathBuf;

/// Static dashboard settings. There are no CLI flags or config files; the
/// defaults are the configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Dataset loaded at startup.
    pub data_path: PathBuf,
    /// Prefix for revenue figures, e.g. `R$ 1,234.56`.
    pub currency_symbol: String,
    /// Size of the best / worst category charts.
    pub top_categories: usize,
    /// Size of the state and city charts.
    pub top_regions: usize,
    /// Size of each RFM customer chart.
    pub top_customers: usize,
    pub window_title: String,
    pub window_size: [f32; 2],
    pub min_window_size: [f32; 2],
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("dashboard/main_data.csv"),
            currency_symbol: "R$ ".to_string(),
            top_categories: 5,
            top_regions: 10,
            top_customers: 5,
            window_title: "Olist E-Commerce Dashboard".to_string(),
            window_size: [1280.0, 900.0],
            min_window_size: [720.0, 480.0],
        }
    }
}
