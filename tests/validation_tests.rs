
use fleetsched::action::Action;
use fleetsched::schedule::{Period, Schedule};
use fleetsched::validate::{CreateJobRequest, Validator};
use harness::{machine, machine_with_actions, MockDirectory};

fn request(
    machines: &[&str],
    action: &str,
    payload: serde_json::Value,
    schedule: Schedule,
) -> CreateJobRequest {
    CreateJobRequest {
        name: "test".to_string(),
        machines: machines.iter().map(|s| s.to_string()).collect(),
        action: action.to_string(),
        payload,
        schedule,
    }
}

fn once(time: &str) -> Schedule {
    Schedule::Once {
        time: time.to_string(),
    }
}

#[tokio::test]
async fn fully_valid_request_yields_typed_payload() {
    let validator = Validator::new(MockDirectory::with_ids(&["m1", "m2"]));
    let req = request(
        &["m1", "m2"],
        "FirmwareUpdate",
        serde_json::json!({ "image_uri": "https://repo/fw.bin", "component": "BMC" }),
        once("03:00:00"),
    );

    let (result, payload) = validator.validate(&req).await;
    assert!(result.is_valid());
    assert!(result.schedule.valid);
    assert!(result.action.valid);
    assert!(result.payload.valid);
    assert_eq!(result.machines.len(), 2);
    assert!(result.machines.iter().all(|m| m.valid));
    assert_eq!(payload.unwrap().kind(), Action::FirmwareUpdate);
}

/// Every category is evaluated even when earlier ones fail, so one round
/// trip reports the complete failure set.
#[tokio::test]
async fn all_failure_categories_are_reported_together() {
    let validator = Validator::new(MockDirectory::with_ids(&["m1"]));
    let req = request(
        &["ghost"],
        "Teleport",
        serde_json::json!({ "whatever": true }),
        once("not-a-time"),
    );

    let (result, payload) = validator.validate(&req).await;
    assert!(!result.is_valid());
    assert!(payload.is_none());

    assert!(!result.schedule.valid);
    assert!(result.schedule.error.is_some());
    assert!(!result.action.valid);
    assert!(!result.payload.valid);
    assert_eq!(result.machines.len(), 1);
    assert!(!result.machines[0].valid);
    assert_eq!(result.machines[0].machine_id, "ghost");
}

#[tokio::test]
async fn payload_must_match_action_shape() {
    let validator = Validator::new(MockDirectory::with_ids(&["m1"]));
    let req = request(
        &["m1"],
        "FirmwareUpdate",
        serde_json::json!({ "operation": "On" }),
        once("03:00:00"),
    );

    let (result, payload) = validator.validate(&req).await;
    assert!(!result.is_valid());
    assert!(payload.is_none());
    assert!(result.action.valid);
    assert!(!result.payload.valid);
    // The other categories are still all green.
    assert!(result.schedule.valid);
    assert!(result.machines[0].valid);
}

#[tokio::test]
async fn machine_capability_is_checked_per_machine() {
    let directory = MockDirectory::new(vec![
        machine("full"),
        machine_with_actions("led-only", vec![Action::LedControl]),
    ]);
    let validator = Validator::new(directory);
    let req = request(
        &["full", "led-only"],
        "PowerControl",
        serde_json::json!({ "operation": "Off" }),
        once("03:00:00"),
    );

    let (result, _) = validator.validate(&req).await;
    assert!(!result.is_valid());
    assert!(result.machines[0].valid);
    assert!(!result.machines[1].valid);
    assert!(result.machines[1]
        .error
        .as_deref()
        .unwrap()
        .contains("does not support"));
}

#[tokio::test]
async fn empty_machine_list_is_invalid() {
    let validator = Validator::new(MockDirectory::with_ids(&["m1"]));
    let req = request(
        &[],
        "PowerControl",
        serde_json::json!({ "operation": "On" }),
        once("03:00:00"),
    );

    let (result, payload) = validator.validate(&req).await;
    assert!(!result.is_valid());
    assert!(payload.is_none());

    // The failure is visible in the machine category, not just implied by
    // the overall verdict.
    assert!(result.schedule.valid);
    assert!(result.action.valid);
    assert!(result.payload.valid);
    assert_eq!(result.machines.len(), 1);
    assert!(!result.machines[0].valid);
    assert!(result.machines[0]
        .error
        .as_deref()
        .unwrap()
        .contains("at least one"));
}

#[tokio::test]
async fn period_day_bounds_must_be_ordered() {
    let validator = Validator::new(MockDirectory::with_ids(&["m1"]));
    let schedule = Schedule::Continuous {
        time: "03:00:00".to_string(),
        period: Some(Period {
            start_day: chrono::NaiveDate::from_ymd_opt(2026, 12, 1),
            end_day: chrono::NaiveDate::from_ymd_opt(2026, 1, 1),
            ..Default::default()
        }),
    };
    let req = request(
        &["m1"],
        "PowerControl",
        serde_json::json!({ "operation": "On" }),
        schedule,
    );

    let (result, _) = validator.validate(&req).await;
    assert!(!result.schedule.valid);
}

#[tokio::test]
async fn unknown_weekday_name_is_rejected() {
    let validator = Validator::new(MockDirectory::with_ids(&["m1"]));
    let schedule = Schedule::Continuous {
        time: "03:00:00".to_string(),
        period: Some(Period {
            days_of_week: vec!["Moonday".to_string()],
            ..Default::default()
        }),
    };
    let req = request(
        &["m1"],
        "PowerControl",
        serde_json::json!({ "operation": "On" }),
        schedule,
    );

    let (result, _) = validator.validate(&req).await;
    assert!(!result.schedule.valid);
    assert!(result
        .schedule
        .error
        .as_deref()
        .unwrap()
        .contains("Moonday"));
}
