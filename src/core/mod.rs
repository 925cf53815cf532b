pub mod breadcrumb;
pub mod config;
pub mod export;
pub mod filters;
pub mod menu;
pub mod navigator;
pub mod params;
pub mod paths;
pub mod query;

pub use breadcrumb::Breadcrumb;
pub use config::Config;
pub use menu::Menu;
pub use navigator::{NavError, NavEvent, NavState, Navigator};
