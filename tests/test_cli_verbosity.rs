//! Verbosity levels as resolved from the global command-line flags

use log::LevelFilter;
use wiki_sync::VerbosityLevel;

#[test]
fn test_verbosity_from_flags() {
    assert_eq!(VerbosityLevel::from_flags(false, false), VerbosityLevel::Normal);
    assert_eq!(VerbosityLevel::from_flags(true, false), VerbosityLevel::Verbose);
    assert_eq!(VerbosityLevel::from_flags(false, true), VerbosityLevel::Quiet);
    // Verbose wins if both are given
    assert_eq!(VerbosityLevel::from_flags(true, true), VerbosityLevel::Verbose);
}

#[test]
fn test_default_verbosity_is_normal() {
    assert_eq!(VerbosityLevel::default(), VerbosityLevel::Normal);
}

#[test]
fn test_log_levels() {
    assert_eq!(VerbosityLevel::Quiet.log_level(), LevelFilter::Error);
    assert_eq!(VerbosityLevel::Normal.log_level(), LevelFilter::Warn);
    assert_eq!(VerbosityLevel::Verbose.log_level(), LevelFilter::Debug);
}
