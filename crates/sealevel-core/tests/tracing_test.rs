//! Tests for tracing initialization.

use sealevel_core::tracing::{init_tracing, init_tracing_with};

#[test]
fn test_only_first_init_installs_subscriber() {
    // Tests in this binary share one process; whichever call runs first wins.
    let first = init_tracing();
    let second = init_tracing();
    let third = init_tracing_with("sealevel_analysis=debug");
    assert!(!second);
    assert!(!third);
    tracing::info!(installed = first, "tracing initialised repeatedly without panicking");
}
