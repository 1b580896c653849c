use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::error::{SwitchError, SwitchResult};

#[derive(Parser, Debug, Clone)]
#[command(name = "dosbox-serial-switch")]
#[command(version)]
#[command(about = "Map a DOSBox virtual serial port to a real serial device", long_about = None)]
pub struct CliConfig {
    /// Increase verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the sections and serial port mapping of a config
    Read {
        /// Path to the DOSBox config (dosbox-*.conf)
        path: PathBuf,
    },

    /// Pass a virtual serial port through to a physical device
    Apply {
        /// Path to the DOSBox config (dosbox-*.conf)
        path: PathBuf,

        /// DOSBox port key, e.g. serial1
        virtual_port: String,

        /// Host device name, e.g. COM3 or /dev/ttyUSB0
        physical_device: String,
    },

    /// List the serial devices available on this host
    ListPorts,
}

impl CliConfig {
    /// Validate arguments that clap cannot check on its own
    pub fn validate(&self) -> SwitchResult<()> {
        if let Command::Apply {
            virtual_port,
            physical_device,
            ..
        } = &self.command
        {
            if virtual_port.trim().is_empty() {
                return Err(SwitchError::EmptyVirtualPort);
            }
            if physical_device.trim().is_empty() {
                return Err(SwitchError::EmptyPhysicalDevice);
            }
        }

        Ok(())
    }

    /// Get tracing log level based on verbosity
    pub fn log_level(&self) -> &str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
