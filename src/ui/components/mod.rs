pub mod gauge;
pub mod input;

pub use gauge::{delta_t_gauge, humidity_gauge, progress_gauge, temperature_gauge, vpd_gauge};
pub use input::InputWidget;
