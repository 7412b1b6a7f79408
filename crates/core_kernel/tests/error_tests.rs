//! Port error classification

use core_kernel::{HealthCheckResult, PortError};

#[test]
fn test_port_error_classification() {
    assert!(PortError::not_found("PayoutRequest", "PAYO-1").is_not_found());
    assert!(PortError::conflict("payout number taken").is_conflict());
    assert!(PortError::connection("refused").is_transient());
    assert!(PortError::unavailable("postgres").is_transient());
    assert!(!PortError::internal("boom").is_transient());
    assert!(!PortError::validation("negative").is_conflict());
}

#[test]
fn test_messages_carry_context() {
    let err = PortError::unavailable("postgres");
    assert_eq!(err.to_string(), "Service unavailable: postgres");

    let err = PortError::validation("amount must be positive");
    assert!(err.to_string().contains("amount must be positive"));
}

#[test]
fn test_health_result_serializes_without_empty_message() {
    let json = serde_json::to_value(HealthCheckResult::measured("postgres-rule-store", 3)).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["latency_ms"], 3);
    assert!(json.get("message").is_none());
}
