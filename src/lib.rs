//! Point a DOSBox virtual serial port at a real host serial device by
//! rewriting the `[serial]` section of a DOSBox config file.

pub mod config;
pub mod document;
pub mod error;
pub mod mapper;
pub mod parser;
pub mod ports;
pub mod session;

pub use document::ConfigDocument;
pub use error::{ErrorKind, SwitchError, SwitchResult};
pub use mapper::{apply_mapping, rewrite_lines, MappingOutcome};
pub use parser::{parse, Properties, Section, Sections};
pub use ports::{FixedPorts, PortEnumerator, PortMapping, PortTarget, SystemPorts};
pub use session::{ApplyReport, ConfigSession};
