//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::error::{Error, Result};
use crate::graphics_device::ResourceState;

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("queue submit failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("queue submit failed"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_state_display() {
    let err = Error::InvalidResourceState {
        expected: ResourceState::Present,
        actual: ResourceState::RenderTarget,
    };
    let display = format!("{}", err);
    assert!(display.contains("Present"));
    assert!(display.contains("RenderTarget"));
}

#[test]
fn test_asset_and_unsupported_display() {
    let err = Error::AssetLoadFailed("assets/textures/missing.png".to_string());
    assert!(format!("{}", err).contains("missing.png"));

    let err = Error::Unsupported("3D textures".to_string());
    assert_eq!(format!("{}", err), "Unsupported: 3D textures");
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("no hardware adapter".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Initialization failed"));
    assert!(display.contains("no hardware adapter"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::InvalidResource("descriptor index 9 out of range".to_string());
    assert_eq!(err.clone(), err);
    assert_ne!(err, Error::OutOfMemory);
}

// ============================================================================
// ERROR PROPAGATION TESTS
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::OutOfMemory)
    }

    fn outer() -> Result<i32> {
        inner()?;
        Ok(42)
    }

    assert_eq!(outer(), Err(Error::OutOfMemory));
}
