//! Verdant Server Library
//!
//! Plant image analysis backend. The binary in main.rs wires these modules
//! into an HTTP server.
//!
//! # Modules
//!
//! - `staging`: request-scoped temporary files for uploads
//! - `analysis`: provider abstraction and the Gemini client
//! - `report`: PDF report layout and rendering
//! - `routes`: HTTP handlers and the application router

pub mod analysis;
pub mod config;
pub mod error;
pub mod report;
pub mod routes;
pub mod staging;
pub mod state;

pub use config::Config;
pub use state::AppState;
