// Event Wizard Tests
//
// This is a meta-package that organizes the test structure
// It doesn't contain actual test code, just the organization of tests

#[cfg(feature = "e2e")]
pub use event_wizard_e2e_tests as e2e;
