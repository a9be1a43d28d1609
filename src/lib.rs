// ABOUTME: Library root for kahu - real-time status sync for deployable services.
// ABOUTME: The CLI binary is in main.rs; everything it drives lives here.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod optimistic;
pub mod output;
pub mod poll;
pub mod reconcile;
pub mod snapshot;
pub mod status;
pub mod supervisor;
pub mod transport;
pub mod types;
