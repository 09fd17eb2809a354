pub mod capture;
pub mod catalog;
pub mod config;
pub mod driver;
pub mod emotion;
pub mod playback;
pub mod render;
pub mod session;
pub mod util;
