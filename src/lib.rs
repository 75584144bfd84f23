mod error;
pub use error::{Error, Result};

pub mod config;
pub mod histogram;
pub mod distributions;
pub mod detector;
pub mod event;
pub mod angles;
pub mod accumulate;
pub mod extract;
pub mod io;
pub mod utils;

pub use geometry::Vector;
