//! Collaborator seams for the fleet: resolving machine ids to handles and
//! performing the actual remote operation. The real management-protocol
//! client lives behind [`ActionDispatcher`]; the engine only sees the trait.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionPayload};
use crate::error::{FleetError, Result};

/// A resolved fleet machine: enough to reach its management controller and
/// to know which operations it supports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub address: String,
    pub supported_actions: Vec<Action>,
}

impl Machine {
    pub fn supports(&self, action: Action) -> bool {
        self.supported_actions.contains(&action)
    }
}

#[async_trait]
pub trait MachineDirectory: Send + Sync {
    /// Resolve a machine id to its handle, or `MachineNotFound`.
    async fn resolve(&self, machine_id: &str) -> Result<Machine>;
}

#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    /// Perform the payload's operation against the machine. Returns a short
    /// human-readable message on success. Any timeout policy belongs to the
    /// implementation; the engine imposes none.
    async fn dispatch(&self, machine: &Machine, payload: &ActionPayload) -> Result<String>;
}

/// Directory backed by a fixed inventory, loaded once at startup.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    machines: HashMap<String, Machine>,
}

impl StaticDirectory {
    pub fn new(machines: Vec<Machine>) -> Self {
        Self {
            machines: machines.into_iter().map(|m| (m.id.clone(), m)).collect(),
        }
    }

    /// Load an inventory file: a JSON array of machines.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| FleetError::Inventory(format!("{}: {e}", path.display())))?;
        let machines: Vec<Machine> = serde_json::from_str(&raw)
            .map_err(|e| FleetError::Inventory(format!("{}: {e}", path.display())))?;
        Ok(Self::new(machines))
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}

#[async_trait]
impl MachineDirectory for StaticDirectory {
    async fn resolve(&self, machine_id: &str) -> Result<Machine> {
        self.machines
            .get(machine_id)
            .cloned()
            .ok_or_else(|| FleetError::MachineNotFound(machine_id.to_string()))
    }
}

/// Dispatcher that logs the operation and reports success without touching
/// any hardware. Wired by the binary so the daemon runs end-to-end; deploys
/// swap in a real protocol client behind the same trait.
#[derive(Debug, Default)]
pub struct DryRunDispatcher;

#[async_trait]
impl ActionDispatcher for DryRunDispatcher {
    async fn dispatch(&self, machine: &Machine, payload: &ActionPayload) -> Result<String> {
        tracing::info!(
            machine_id = %machine.id,
            address = %machine.address,
            action = %payload.kind(),
            "Dry-run dispatch"
        );
        Ok(format!("{} acknowledged (dry run)", payload.kind()))
    }
}
