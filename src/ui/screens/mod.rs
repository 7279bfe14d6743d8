pub mod advisory;
pub mod crop;
pub mod dashboard;
pub mod forecast;
pub mod history;

pub use advisory::AdvisoryScreen;
pub use crop::CropScreen;
pub use dashboard::DashboardScreen;
pub use forecast::ForecastScreen;
pub use history::HistoryScreen;
