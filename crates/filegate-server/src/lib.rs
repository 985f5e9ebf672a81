//! # Filegate
//!
//! HTTP file gateway over a single object storage bucket.
//!
//! This crate provides:
//! - **Download**: stream an object back as an attachment
//! - **Listing**: JSON listing of every object in the bucket
//! - **Upload**: single and batched multipart uploads
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP Clients                      │
//! │            (browsers, curl, scripts)                │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                    File Gateway                     │
//! ├─────────────────────────────────────────────────────┤
//! │  Request ID │ Logging │ Multipart Decoder           │
//! ├─────────────────────────────────────────────────────┤
//! │                     Handlers                        │
//! │   (download, list-files, upload, upload-multiple)   │
//! ├─────────────────────────────────────────────────────┤
//! │                  filegate-store                     │
//! │            (S3-compatible / in-memory)              │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{GatewayConfig, StoreBackend};
pub use error::ApiError;
pub use server::{run_server, run_server_with_shutdown, shutdown_signal};
pub use state::AppState;
