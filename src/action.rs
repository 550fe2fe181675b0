use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The closed set of remote-management operations the fleet supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    PowerControl,
    FirmwareUpdate,
    BiosConfig,
    LedControl,
}

impl Action {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PowerControl" => Some(Action::PowerControl),
            "FirmwareUpdate" => Some(Action::FirmwareUpdate),
            "BiosConfig" => Some(Action::BiosConfig),
            "LedControl" => Some(Action::LedControl),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::PowerControl => write!(f, "PowerControl"),
            Action::FirmwareUpdate => write!(f, "FirmwareUpdate"),
            Action::BiosConfig => write!(f, "BiosConfig"),
            Action::LedControl => write!(f, "LedControl"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerOperation {
    On,
    Off,
    Cycle,
    GracefulShutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedState {
    On,
    Off,
    Blinking,
}

/// Action-specific payload, one variant per supported action. The tag is
/// carried by the variant itself, so a job can never hold a payload that
/// disagrees with its action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionPayload {
    PowerControl {
        operation: PowerOperation,
    },
    FirmwareUpdate {
        image_uri: String,
        component: String,
    },
    BiosConfig {
        attributes: HashMap<String, String>,
    },
    LedControl {
        state: LedState,
    },
}

impl ActionPayload {
    pub fn kind(&self) -> Action {
        match self {
            ActionPayload::PowerControl { .. } => Action::PowerControl,
            ActionPayload::FirmwareUpdate { .. } => Action::FirmwareUpdate,
            ActionPayload::BiosConfig { .. } => Action::BiosConfig,
            ActionPayload::LedControl { .. } => Action::LedControl,
        }
    }

    /// Deserialize the raw payload of a creation request against a specific
    /// action tag. The payload shape must match the tag exactly.
    pub fn from_request(action: Action, raw: &serde_json::Value) -> Result<Self, String> {
        let parsed = match action {
            Action::PowerControl => {
                #[derive(Deserialize)]
                struct Power {
                    operation: PowerOperation,
                }
                serde_json::from_value::<Power>(raw.clone())
                    .map(|p| ActionPayload::PowerControl { operation: p.operation })
            }
            Action::FirmwareUpdate => {
                #[derive(Deserialize)]
                struct Fw {
                    image_uri: String,
                    component: String,
                }
                serde_json::from_value::<Fw>(raw.clone()).map(|fw| ActionPayload::FirmwareUpdate {
                    image_uri: fw.image_uri,
                    component: fw.component,
                })
            }
            Action::BiosConfig => {
                #[derive(Deserialize)]
                struct Bios {
                    attributes: HashMap<String, String>,
                }
                serde_json::from_value::<Bios>(raw.clone())
                    .map(|b| ActionPayload::BiosConfig { attributes: b.attributes })
            }
            Action::LedControl => {
                #[derive(Deserialize)]
                struct Led {
                    state: LedState,
                }
                serde_json::from_value::<Led>(raw.clone())
                    .map(|l| ActionPayload::LedControl { state: l.state })
            }
        };
        parsed.map_err(|e| format!("payload does not match action {action}: {e}"))
    }
}
