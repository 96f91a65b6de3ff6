pub mod baseline;
pub mod chapters;
pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod plan;
pub mod util;
