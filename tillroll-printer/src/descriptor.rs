//! Printer descriptors produced by discovery

use serde::{Deserialize, Serialize};

/// Reported printer state at discovery time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterStatus {
    /// Printer reports ready
    Idle,
    /// State could not be determined
    Unknown,
    /// Printer reports offline or disabled
    Offline,
}

/// A printer as seen by one discovery call
///
/// Descriptors are produced fresh on every discovery call and never cached:
/// physical printer state can change between prints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterDescriptor {
    /// Printer name, unique within one discovery session
    pub name: String,
    pub status: PrinterStatus,
    pub is_default: bool,
    pub description: Option<String>,
}

impl PrinterDescriptor {
    /// Create a descriptor with unknown status
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: PrinterStatus::Unknown,
            is_default: false,
            description: None,
        }
    }

    pub fn with_status(mut self, status: PrinterStatus) -> Self {
        self.status = status;
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
