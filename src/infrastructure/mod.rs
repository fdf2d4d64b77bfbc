pub mod cdp_driver;
pub mod driver;
pub mod js_executor;

pub use cdp_driver::CdpDriver;
pub use driver::BrowserDriver;
pub use js_executor::{DomProbe, JsExecutor};
