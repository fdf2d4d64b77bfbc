pub mod launch;

pub use launch::{allow_downloads, launch_browser};
