//! Utility helpers for tests.
//!
//! Rig builders, scripted terrain and body doubles, and an observer that
//! captures [`legwork::LocomotionError`] events.

pub mod body;
pub mod errors;
pub mod probes;
pub mod rigs;

/// Assert that all strings in `keys` are present in `text`.
///
/// # Panics
/// Panics with a helpful message if any key is missing.
pub fn assert_all_present(text: &str, keys: &[&str]) {
    for key in keys {
        assert!(text.contains(key), "{key} not found in output:\n{text}");
    }
}

/// Assert that all strings in `keys` are absent from `text`.
///
/// # Panics
/// Panics with a helpful message if any key is found.
pub fn assert_all_absent(text: &str, keys: &[&str]) {
    for key in keys {
        assert!(!text.contains(key), "{key} should not be present in:\n{text}");
    }
}
