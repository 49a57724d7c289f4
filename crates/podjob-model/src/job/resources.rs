use serde::{Deserialize, Serialize};

use crate::{ModelError, ModelResult, domain::is_valid_quantity};

/// Resource requests applied to the target container.
///
/// Both values use the orchestrator's quantity syntax and are validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequests {
    cpu: String,
    memory: String,
}

impl ResourceRequests {
    /// Build resource requests, rejecting malformed quantities.
    pub fn new(cpu: impl Into<String>, memory: impl Into<String>) -> ModelResult<Self> {
        let cpu = cpu.into();
        let memory = memory.into();

        if !is_valid_quantity(&cpu) {
            return Err(ModelError::InvalidQuantity {
                resource: "cpu",
                value: cpu,
            });
        }
        if !is_valid_quantity(&memory) {
            return Err(ModelError::InvalidQuantity {
                resource: "memory",
                value: memory,
            });
        }
        Ok(Self { cpu, memory })
    }

    pub fn cpu(&self) -> &str {
        &self.cpu
    }

    pub fn memory(&self) -> &str {
        &self.memory
    }
}
