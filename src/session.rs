// session.rs
//!
//! One editing session over one config file: load, inspect, apply a mapping
//! and persist it. The in-memory state only changes after a successful write.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::document::ConfigDocument;
use crate::error::{SwitchError, SwitchResult};
use crate::mapper;
use crate::parser::{Section, Sections};
use crate::ports::{PortEnumerator, PortMapping};

/// Result of a persisted apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub virtual_port: String,
    pub physical_device: String,
    /// Serial keys that released the device before it was rebound.
    pub released: Vec<String>,
    /// False when no line for the virtual port exists.
    pub bound: bool,
}

#[derive(Debug)]
pub struct ConfigSession {
    path: PathBuf,
    document: ConfigDocument,
    sections: Sections,
    mapping: PortMapping,
}

impl ConfigSession {
    pub fn open(path: impl Into<PathBuf>) -> SwitchResult<Self> {
        let path = path.into();
        let document = ConfigDocument::read(&path)?;
        Ok(Self::with_document(path, document))
    }

    fn with_document(path: PathBuf, document: ConfigDocument) -> Self {
        let sections = document.sections();
        let mapping = PortMapping::from_sections(&sections);
        Self {
            path,
            document,
            sections,
            mapping,
        }
    }

    /// Re-reads the file, dropping the current state.
    pub fn reload(&mut self) -> SwitchResult<()> {
        let document = ConfigDocument::read(&self.path)?;
        *self = Self::with_document(self.path.clone(), document);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    pub fn sections(&self) -> &Sections {
        &self.sections
    }

    pub fn mapping(&self) -> &PortMapping {
        &self.mapping
    }

    /// Keys of the `[serial]` section in file order.
    pub fn virtual_ports(&self) -> Vec<&str> {
        self.mapping.virtual_ports().collect()
    }

    /// Printable listing of every parsed section. In `[serial]` the port
    /// mapping comes first, passthrough devices missing from `available`
    /// are marked, then the remaining keys and unparsed lines follow.
    pub fn summary(&self, available: &[String]) -> Vec<String> {
        let mut out = Vec::new();

        for (name, section) in self.sections.iter() {
            out.push(format!("[{}]", name));
            let props = match section {
                Section::Lines(lines) => {
                    out.extend(lines.iter().cloned());
                    continue;
                }
                Section::Properties(props) => props,
            };

            let is_serial = name == "serial";
            if is_serial {
                for (port, target) in self.mapping.iter() {
                    let marker = match target.device() {
                        Some(device) if !available.iter().any(|p| p == device) => "  (not present)",
                        _ => "",
                    };
                    out.push(format!("{}={}{}", port, target, marker));
                }
            }
            for (key, value) in props.iter() {
                if !(is_serial && key.starts_with(mapper::SERIAL_PREFIX)) {
                    out.push(format!("{}={}", key, value));
                }
            }
            out.extend(props.unparsed().iter().cloned());
        }
        out
    }

    /// Rebinds `virtual_port` to `physical_device` and overwrites the file.
    pub fn apply(&mut self, virtual_port: &str, physical_device: &str) -> SwitchResult<ApplyReport> {
        let virtual_port = virtual_port.trim();
        let physical_device = physical_device.trim();
        if virtual_port.is_empty() {
            return Err(SwitchError::EmptyVirtualPort);
        }
        if physical_device.is_empty() {
            return Err(SwitchError::EmptyPhysicalDevice);
        }

        let outcome = mapper::apply_mapping(self.document.lines(), virtual_port, physical_device);
        if !outcome.bound {
            warn!(
                port = virtual_port,
                path = %self.path.display(),
                "no serial line for virtual port"
            );
        }

        let rewritten = ConfigDocument::from_lines(outcome.lines);
        rewritten.write(&self.path)?;
        info!(
            port = virtual_port,
            device = physical_device,
            released = ?outcome.disabled,
            "config updated"
        );

        *self = Self::with_document(self.path.clone(), rewritten);

        Ok(ApplyReport {
            virtual_port: virtual_port.to_string(),
            physical_device: physical_device.to_string(),
            released: outcome.disabled,
            bound: outcome.bound,
        })
    }

    /// Like [`apply`](Self::apply), warning when the device is not on the host.
    /// A failing enumeration is logged and treated as an empty device list.
    pub fn apply_checked(
        &mut self,
        virtual_port: &str,
        physical_device: &str,
        ports: &dyn PortEnumerator,
    ) -> SwitchResult<ApplyReport> {
        let available = ports.available_ports().unwrap_or_else(|err| {
            warn!(error = %err, "could not list serial devices");
            Vec::new()
        });
        if !available.iter().any(|p| p == physical_device.trim()) {
            warn!(
                device = physical_device,
                available = ?available,
                "physical device not currently available"
            );
        }
        self.apply(virtual_port, physical_device)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedPorts, PortTarget};
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = "# This is the configuration file for DOSBox 0.74.\r\n\
        [serial]\r\n\
        # serial1-4 -- set type of device connected to com port.\r\n\
        serial1=directserial realport:COM3\r\n\
        serial2=dummy\r\n\
        serial3=disabled\r\n\
        serial4=disabled\r\n\
        \r\n\
        [autoexec]\r\n\
        # Lines in this section will be run at startup.\r\n";

    fn write_config(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("dosbox-0.74.conf");
        fs::write(&path, CONFIG).unwrap();
        path
    }

    #[test]
    fn test_open_builds_mapping() {
        let dir = TempDir::new().unwrap();
        let session = ConfigSession::open(write_config(&dir)).unwrap();

        assert_eq!(
            session.virtual_ports(),
            ["serial1", "serial2", "serial3", "serial4"]
        );
        assert_eq!(
            session.mapping().current_passthrough(),
            Some(("serial1", "COM3"))
        );
        assert!(session.sections().get("autoexec").is_some());
    }

    #[test]
    fn test_apply_persists_and_refreshes() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir);
        let mut session = ConfigSession::open(&path).unwrap();

        let report = session.apply("serial2", "COM3").unwrap();
        assert_eq!(report.released, ["serial1"]);
        assert!(report.bound);

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("serial1=disabled\r\n"));
        assert!(written.contains("serial2=directserial realport:COM3\r\n"));
        assert!(written.contains("# serial1-4 -- set type of device connected to com port.\r\n"));
        assert!(written.ends_with("# Lines in this section will be run at startup.\r\n"));

        assert_eq!(session.mapping().get("serial1"), Some(&PortTarget::Disabled));
        assert_eq!(session.mapping().bound_port("COM3"), Some("serial2"));
    }

    #[test]
    fn test_apply_rejects_empty_selection() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir);
        let mut session = ConfigSession::open(&path).unwrap();

        assert!(matches!(
            session.apply("", "COM1"),
            Err(SwitchError::EmptyVirtualPort)
        ));
        assert!(matches!(
            session.apply("serial1", "  "),
            Err(SwitchError::EmptyPhysicalDevice)
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG);
    }

    #[test]
    fn test_failed_write_keeps_state() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir);
        let mut session = ConfigSession::open(&path).unwrap();
        let before = session.document().clone();

        // A directory in place of the file makes the write fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let err = session.apply("serial2", "COM3").unwrap_err();
        assert!(matches!(err, SwitchError::Write { .. }));
        assert_eq!(session.document(), &before);
        assert_eq!(session.mapping().bound_port("COM3"), Some("serial1"));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ConfigSession::open(dir.path().join("dosbox-none.conf")).unwrap_err();
        assert!(matches!(err, SwitchError::ConfigNotFound(_)));
    }

    #[test]
    fn test_reload_picks_up_external_edit() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir);
        let mut session = ConfigSession::open(&path).unwrap();

        fs::write(&path, "[serial]\nserial1=disabled\n").unwrap();
        session.reload().unwrap();
        assert_eq!(session.virtual_ports(), ["serial1"]);
    }

    #[test]
    fn test_apply_checked_with_unavailable_device() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir);
        let mut session = ConfigSession::open(&path).unwrap();
        let ports = FixedPorts(vec!["COM1".into()]);

        let report = session.apply_checked("serial3", "COM7", &ports).unwrap();
        assert!(report.released.is_empty());
        assert_eq!(session.mapping().bound_port("COM7"), Some("serial3"));
    }

    struct NoSysfs;

    impl PortEnumerator for NoSysfs {
        fn available_ports(&self) -> SwitchResult<Vec<String>> {
            Err(SwitchError::PortEnumeration("no sysfs".to_string()))
        }
    }

    #[test]
    fn test_apply_checked_survives_enumeration_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dosbox-0.74.conf");
        fs::write(&path, "[serial]\nserial1=disabled\n").unwrap();
        let mut session = ConfigSession::open(&path).unwrap();

        let report = session.apply_checked("serial1", "COM3", &NoSysfs).unwrap();
        assert!(report.bound);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[serial]\nserial1=directserial realport:COM3\n"
        );
    }

    #[test]
    fn test_reapplying_current_mapping_releases_nothing() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir);
        let mut session = ConfigSession::open(&path).unwrap();

        let report = session.apply("serial1", "COM3").unwrap();
        assert!(report.released.is_empty());
        assert!(report.bound);
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG);
    }

    #[test]
    fn test_summary_keeps_extra_serial_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dosbox-0.74.conf");
        fs::write(
            &path,
            "[serial]\nserial1=directserial realport:COM3\nserial2=dummy\nphonebookfile=phonebook.txt\nstray line\n[autoexec]\nc:\n",
        )
        .unwrap();
        let session = ConfigSession::open(&path).unwrap();

        assert_eq!(
            session.summary(&[]),
            [
                "[serial]",
                "serial1=directserial realport:COM3  (not present)",
                "serial2=dummy",
                "phonebookfile=phonebook.txt",
                "stray line",
                "[autoexec]",
                "c:",
            ]
        );
        assert_eq!(
            session.summary(&["COM3".to_string()])[1],
            "serial1=directserial realport:COM3"
        );
    }
}
