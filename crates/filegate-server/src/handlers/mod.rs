//! File gateway request handlers

pub mod download;
pub mod list;
pub mod service;
pub mod upload;

pub use download::*;
pub use list::*;
pub use service::*;
pub use upload::*;
