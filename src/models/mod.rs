//! Data models for request parameters and typed payloads

mod page;
mod region;

pub use page::*;
pub use region::*;
