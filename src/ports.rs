// ports.rs
//!
//! Physical serial device enumeration and the virtual port mapping read back
//! from a config's `[serial]` section.

use std::fmt;

use crate::error::SwitchResult;
use crate::mapper::{self, DISABLED, PASSTHROUGH_PREFIX};
use crate::parser::Sections;

// ============================================================================
// ENUMERATION
// ============================================================================

/// Source of the host's currently available serial device names.
pub trait PortEnumerator {
    fn available_ports(&self) -> SwitchResult<Vec<String>>;
}

/// Host enumeration through the `serialport` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPorts;

impl PortEnumerator for SystemPorts {
    fn available_ports(&self) -> SwitchResult<Vec<String>> {
        let mut names: Vec<String> = serialport::available_ports()?
            .into_iter()
            .map(|p| p.port_name)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

/// A fixed device list.
#[derive(Debug, Default, Clone)]
pub struct FixedPorts(pub Vec<String>);

impl PortEnumerator for FixedPorts {
    fn available_ports(&self) -> SwitchResult<Vec<String>> {
        Ok(self.0.clone())
    }
}

// ============================================================================
// PORT TARGET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortTarget {
    Disabled,
    Passthrough { device: String },
    /// dummy, modem, nullmodem or a raw device spec.
    Other(String),
}

impl PortTarget {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value == DISABLED {
            return PortTarget::Disabled;
        }
        match value.strip_prefix(PASSTHROUGH_PREFIX) {
            // Trailing options such as `rxdelay:5` follow the device name.
            Some(rest) => PortTarget::Passthrough {
                device: rest.split_whitespace().next().unwrap_or("").to_string(),
            },
            None => PortTarget::Other(value.to_string()),
        }
    }

    pub fn device(&self) -> Option<&str> {
        match self {
            PortTarget::Passthrough { device } => Some(device.as_str()),
            _ => None,
        }
    }

    /// The value as it appears after `serialN=`.
    pub fn to_value(&self) -> String {
        match self {
            PortTarget::Disabled => DISABLED.to_string(),
            PortTarget::Passthrough { device } => mapper::passthrough_value(device),
            PortTarget::Other(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for PortTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

// ============================================================================
// PORT MAPPING
// ============================================================================

/// Virtual port name to its current target, in config order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortMapping {
    ports: Vec<(String, PortTarget)>,
}

impl PortMapping {
    pub fn from_sections(sections: &Sections) -> Self {
        let ports: Vec<(String, PortTarget)> = sections
            .serial()
            .map(|serial| {
                serial
                    .iter()
                    .filter(|(key, _)| key.starts_with(mapper::SERIAL_PREFIX))
                    .map(|(key, value)| (key.to_string(), PortTarget::parse(value)))
                    .collect()
            })
            .unwrap_or_default();
        Self { ports }
    }

    pub fn get(&self, virtual_port: &str) -> Option<&PortTarget> {
        self.ports
            .iter()
            .find(|(port, _)| port == virtual_port)
            .map(|(_, target)| target)
    }

    pub fn virtual_ports(&self) -> impl Iterator<Item = &str> {
        self.ports.iter().map(|(port, _)| port.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PortTarget)> {
        self.ports.iter().map(|(port, target)| (port.as_str(), target))
    }

    /// The virtual port currently passing `device` through, if any.
    pub fn bound_port(&self, device: &str) -> Option<&str> {
        self.iter()
            .find(|(_, target)| target.device() == Some(device))
            .map(|(port, _)| port)
    }

    /// First passthrough binding in config order.
    pub fn current_passthrough(&self) -> Option<(&str, &str)> {
        self.iter()
            .find_map(|(port, target)| target.device().map(|device| (port, device)))
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
