//! Shared test infrastructure.
//!
//! This module provides:
//! - **Fixtures**: Functions with the loop shapes the cost model distinguishes.
//! - **Mocks**: A scripted `AffineAnalyzer` for exercising fallback paths.


/// Mock implementations of collaborator traits.
pub mod mocks;

/// Installs a test subscriber so `RUST_LOG` works under `cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
