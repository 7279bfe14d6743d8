pub mod advisory;
pub mod crop;
pub mod daily;
pub mod forecast;
pub mod phenology;
pub mod recommendation;

pub use advisory::*;
pub use crop::*;
pub use daily::*;
pub use forecast::*;
pub use phenology::*;
pub use recommendation::*;
