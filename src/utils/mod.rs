pub mod logging;
pub mod wait;
