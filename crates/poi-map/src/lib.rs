//! Point-of-interest map backed by OpenStreetMap.
//!
//! A location is geocoded through Nominatim, a box is laid around it and every
//! configured POI type is fetched from the Overpass API concurrently. The joined
//! results become one [`map::Layer`] per POI subtype whose markers can be
//! filtered by name, toggled per layer and selected one at a time.

pub mod aggregate;
pub mod app;
pub mod bbox;
pub mod config;
pub mod geocode;
pub mod geodesy;
pub mod map;
pub mod notify;
pub mod overpass;
pub mod store;
pub mod types;

pub use app::{App, AppError, LoadReport, LoadSource};
pub use config::Config;
