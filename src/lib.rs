pub mod app;
pub mod config;
pub mod model;
pub mod repository;
pub mod service;

pub use app::build_swapper;

// Re-export commonly used types for tests
pub use model::{EligibleToken, HeldToken, SwapOutcome, SwapRecord};
pub use service::{BatchSummary, ServiceError, SkipReason, TokenOutcome, TokenSwapper};
