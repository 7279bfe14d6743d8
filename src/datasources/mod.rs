pub mod advisor;
pub mod mailer;
pub mod openweathermap;

pub use advisor::RemoteAdvisor;
pub use mailer::Mailer;
pub use openweathermap::OpenWeatherMapClient;
