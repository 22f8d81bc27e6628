//! TypeScript Generation Tests
//!
//! Validates that SilverWall view and status types can be exported to TypeScript
//! when the tauri feature is enabled.

#[cfg(feature = "tauri")]
#[test]
fn test_core_types_implement_specta_type() {
    use specta::Type;

    // If this compiles, all types are properly configured for TypeScript export.
    fn assert_type<T: Type>() {}

    // Wire types
    assert_type::<silverwall::TelemetryFrame>();
    assert_type::<silverwall::CarSample>();
    assert_type::<silverwall::RaceStatus>();
    assert_type::<silverwall::TrackGeometry>();

    // View-models
    assert_type::<silverwall::ConnectionStatus>();
    assert_type::<silverwall::Countdown>();
    assert_type::<silverwall::DashboardView>();
    assert_type::<silverwall::SelectedDriverDetail>();
    assert_type::<silverwall::CarMarker>();
    assert_type::<silverwall::UpdateRate>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn test_tauri_feature_disabled() {
    // Types still compile without specta::Type
    let _ = silverwall::UpdateRate::EveryFrame;
    let _ = silverwall::ConnectionStatus::Disconnected;
}
