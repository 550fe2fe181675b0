//! Validation pipeline gating job creation.
//!
//! All four categories (schedule, action, payload, machines) are checked
//! independently so one round trip reports the complete failure set.
//! Invalid input is data, never an `Err`: the caller gets a structured
//! result and decides what to do with it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionPayload};
use crate::error::FleetError;
use crate::machine::MachineDirectory;
use crate::schedule::{parse_time, Schedule, WEEKDAY_NAMES};

/// Wire shape of a job-creation request. The action arrives as a plain tag
/// and the payload as raw JSON; the validator is where they are proven to
/// agree and turned into a typed [`ActionPayload`].
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    pub name: String,
    pub machines: Vec<String>,
    pub action: String,
    pub payload: serde_json::Value,
    pub schedule: Schedule,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn fail(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MachineCheck {
    pub machine_id: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub schedule: CheckResult,
    pub action: CheckResult,
    pub payload: CheckResult,
    pub machines: Vec<MachineCheck>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.schedule.valid
            && self.action.valid
            && self.payload.valid
            && !self.machines.is_empty()
            && self.machines.iter().all(|m| m.valid)
    }
}

pub struct Validator {
    directory: Arc<dyn MachineDirectory>,
}

impl Validator {
    pub fn new(directory: Arc<dyn MachineDirectory>) -> Self {
        Self { directory }
    }

    /// Validate a creation request. Read-only; never fails outright. On a
    /// fully valid request the typed payload is returned alongside the
    /// (all-green) result.
    pub async fn validate(
        &self,
        request: &CreateJobRequest,
    ) -> (ValidationResult, Option<ActionPayload>) {
        let schedule = check_schedule(&request.schedule);
        let action = Action::parse(&request.action);
        let action_check = match action {
            Some(_) => CheckResult::ok(),
            None => CheckResult::fail(format!("unknown action: {}", request.action)),
        };

        let (payload_check, payload) = match action {
            Some(action) => match ActionPayload::from_request(action, &request.payload) {
                Ok(p) => (CheckResult::ok(), Some(p)),
                Err(e) => (CheckResult::fail(e), None),
            },
            // Without a known action there is no shape to check against,
            // but the category still reports its own failure.
            None => (CheckResult::fail("payload cannot be checked without a valid action"), None),
        };

        let machines = self.check_machines(request, action).await;

        let result = ValidationResult {
            schedule,
            action: action_check,
            payload: payload_check,
            machines,
        };
        let payload = if result.is_valid() { payload } else { None };
        (result, payload)
    }

    async fn check_machines(
        &self,
        request: &CreateJobRequest,
        action: Option<Action>,
    ) -> Vec<MachineCheck> {
        // An empty target list is itself a machine-category failure; a bare
        // empty vec would leave the caller with no failing category at all.
        if request.machines.is_empty() {
            return vec![MachineCheck {
                machine_id: String::new(),
                valid: false,
                error: Some("at least one target machine is required".to_string()),
            }];
        }

        let mut checks = Vec::with_capacity(request.machines.len());
        for machine_id in &request.machines {
            let check = match self.directory.resolve(machine_id).await {
                Ok(machine) => match action {
                    Some(action) if !machine.supports(action) => MachineCheck {
                        machine_id: machine_id.clone(),
                        valid: false,
                        error: Some(
                            FleetError::UnsupportedAction {
                                machine_id: machine_id.clone(),
                                action: action.to_string(),
                            }
                            .to_string(),
                        ),
                    },
                    _ => MachineCheck {
                        machine_id: machine_id.clone(),
                        valid: true,
                        error: None,
                    },
                },
                Err(e) => MachineCheck {
                    machine_id: machine_id.clone(),
                    valid: false,
                    error: Some(e.to_string()),
                },
            };
            checks.push(check);
        }
        checks
    }
}

fn check_schedule(schedule: &Schedule) -> CheckResult {
    let time = match schedule {
        Schedule::Once { time } => time,
        Schedule::Continuous { time, .. } => time,
    };
    if parse_time(time).is_none() {
        return CheckResult::fail(format!("invalid time of day: {time:?} (expected HH:MM:SS)"));
    }

    if let Schedule::Continuous {
        period: Some(period),
        ..
    } = schedule
    {
        if let (Some(start), Some(end)) = (period.start_day, period.end_day) {
            if start > end {
                return CheckResult::fail(format!("start day {start} is after end day {end}"));
            }
        }
        for day in &period.days_of_week {
            if !WEEKDAY_NAMES.contains(&day.as_str()) {
                return CheckResult::fail(format!("unknown weekday: {day:?}"));
            }
        }
    }

    CheckResult::ok()
}
