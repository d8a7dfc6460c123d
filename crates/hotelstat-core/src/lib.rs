pub mod align;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod decompose;
pub mod error;
pub mod fetch;
pub mod frames;
pub mod pipeline;
pub mod summary;

pub use hotelstat_parser as parser;
