// mapper.rs
//!
//! Serial line rewriting.
//!
//! Works on the raw, unfiltered line sequence of a config so comments, blank
//! lines and line endings survive. For every line starting with `serial`:
//! a line whose value references the physical device is disabled, and the
//! line whose key is the virtual port is pointed at the device through
//! `directserial realport:`. Both checks run on every line; the second
//! rewrite wins when a line matches both.

use tracing::debug;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const SERIAL_PREFIX: &str = "serial";
pub const DISABLED: &str = "disabled";
pub const PASSTHROUGH_PREFIX: &str = "directserial realport:";

// ============================================================================
// SERIAL LINE
// ============================================================================

/// A borrowed view of one `serialN=...` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialLine<'a> {
    pub key: &'a str,
    /// Text after the first `=`, empty when there is none.
    pub value: &'a str,
    pub carriage_return: bool,
}

impl<'a> SerialLine<'a> {
    /// Returns `None` for lines not starting with the literal `serial`.
    pub fn parse(line: &'a str) -> Option<Self> {
        if !line.starts_with(SERIAL_PREFIX) {
            return None;
        }

        let (body, carriage_return) = match line.strip_suffix('\r') {
            Some(body) => (body, true),
            None => (line, false),
        };
        let (key, value) = body.split_once('=').unwrap_or((body, ""));

        Some(Self {
            key: key.trim(),
            value,
            carriage_return,
        })
    }

    fn render(&self, key: &str, value: &str) -> String {
        let eol = if self.carriage_return { "\r" } else { "" };
        format!("{}={}{}", key, value, eol)
    }

    pub fn disabled(&self) -> String {
        self.render(self.key, DISABLED)
    }

    pub fn bound_to(&self, physical_device: &str) -> String {
        self.render(self.key, &passthrough_value(physical_device))
    }
}

pub fn passthrough_value(physical_device: &str) -> String {
    format!("{}{}", PASSTHROUGH_PREFIX, physical_device)
}

// ============================================================================
// MAPPING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingOutcome {
    pub lines: Vec<String>,
    /// Keys of lines that released the physical device. The rebound line is
    /// never listed, even when it already held the device.
    pub disabled: Vec<String>,
    /// Whether a line for the virtual port was found and rebound.
    pub bound: bool,
}

impl MappingOutcome {
    /// True when no serial line matched either condition.
    pub fn is_noop(&self) -> bool {
        self.disabled.is_empty() && !self.bound
    }
}

/// Rewrites `lines` so that `virtual_port` passes through to `physical_device`.
///
/// Inputs are not validated: empty arguments or an unknown port simply leave
/// the lines as they are.
pub fn apply_mapping(lines: &[String], virtual_port: &str, physical_device: &str) -> MappingOutcome {
    let mut outcome = MappingOutcome {
        lines: Vec::with_capacity(lines.len()),
        disabled: Vec::new(),
        bound: false,
    };

    for line in lines {
        let Some(serial) = SerialLine::parse(line) else {
            outcome.lines.push(line.clone());
            continue;
        };

        let mut rewritten = None;
        let rebinding = serial.key == virtual_port;

        if serial.value.contains(physical_device) {
            debug!(key = serial.key, device = physical_device, "releasing device");
            // A line that is rebound below never gave the device up.
            if !rebinding {
                outcome.disabled.push(serial.key.to_string());
            }
            rewritten = Some(serial.disabled());
        }

        if rebinding {
            debug!(key = serial.key, device = physical_device, "binding port");
            outcome.bound = true;
            rewritten = Some(serial.bound_to(physical_device));
        }

        outcome.lines.push(rewritten.unwrap_or_else(|| line.clone()));
    }

    outcome
}

/// Line-only form of [`apply_mapping`].
pub fn rewrite_lines(lines: &[String], virtual_port: &str, physical_device: &str) -> Vec<String> {
    apply_mapping(lines, virtual_port, physical_device).lines
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_bind_disabled_port() {
        let out = rewrite_lines(&lines(&["serial1=disabled"]), "serial1", "COM3");
        assert_eq!(out, ["serial1=directserial realport:COM3"]);
    }

    #[test]
    fn test_old_binding_released() {
        let input = lines(&["serial1=directserial realport:COM3", "serial2=disabled"]);
        let outcome = apply_mapping(&input, "serial2", "COM3");

        assert_eq!(
            outcome.lines,
            ["serial1=disabled", "serial2=directserial realport:COM3"]
        );
        assert_eq!(outcome.disabled, ["serial1"]);
        assert!(outcome.bound);
    }

    #[test]
    fn test_raw_device_spec_released() {
        let out = rewrite_lines(&lines(&["serial3=COM5\r"]), "serial1", "COM5");
        assert_eq!(out, ["serial3=disabled\r"]);
    }

    #[test]
    fn test_carriage_return_kept_on_bind() {
        let out = rewrite_lines(&lines(&["serial1=dummy\r"]), "serial1", "COM2");
        assert_eq!(out, ["serial1=directserial realport:COM2\r"]);
    }

    #[test]
    fn test_same_line_rebinding_wins() {
        let input = lines(&["serial1=directserial realport:COM3"]);
        let outcome = apply_mapping(&input, "serial1", "COM3");
        assert_eq!(outcome.lines, ["serial1=directserial realport:COM3"]);
        assert!(outcome.disabled.is_empty());
        assert!(outcome.bound);
    }

    #[test]
    fn test_rebinding_reports_only_other_lines() {
        let input = lines(&[
            "serial1=directserial realport:COM3\r",
            "serial2=COM3\r",
            "serial3=disabled\r",
        ]);
        let outcome = apply_mapping(&input, "serial1", "COM3");
        assert_eq!(
            outcome.lines,
            [
                "serial1=directserial realport:COM3\r",
                "serial2=disabled\r",
                "serial3=disabled\r"
            ]
        );
        assert_eq!(outcome.disabled, ["serial2"]);
    }

    #[test]
    fn test_key_match_is_exact() {
        let input = lines(&["serial1=disabled", "serial10=disabled"]);
        let out = rewrite_lines(&input, "serial1", "COM4");
        assert_eq!(out, ["serial1=directserial realport:COM4", "serial10=disabled"]);
    }

    #[test]
    fn test_non_serial_lines_untouched() {
        let input = lines(&[
            "# serial1=directserial realport:COM3",
            "",
            "[serial]\r",
            "  serial1=COM3",
            "comport=COM3",
            "serial2=disabled",
        ]);
        let out = rewrite_lines(&input, "serial2", "COM3");
        assert_eq!(&out[..5], &input[..5]);
        assert_eq!(out[5], "serial2=directserial realport:COM3");
    }

    #[test]
    fn test_idempotent() {
        let input = lines(&[
            "[serial]",
            "serial1=directserial realport:COM1",
            "serial2=dummy",
            "",
        ]);
        let once = rewrite_lines(&input, "serial2", "COM1");
        let twice = rewrite_lines(&once, "serial2", "COM1");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unknown_port_is_noop() {
        let input = lines(&["serial1=dummy", "serial2=disabled"]);
        let outcome = apply_mapping(&input, "serial9", "COM7");
        assert!(outcome.is_noop());
        assert_eq!(outcome.lines, input);
    }

    #[test]
    fn test_serial_line_parse() {
        let line = SerialLine::parse("serial2=directserial realport:COM1\r").unwrap();
        assert_eq!(line.key, "serial2");
        assert_eq!(line.value, "directserial realport:COM1");
        assert!(line.carriage_return);

        let bare = SerialLine::parse("serial4").unwrap();
        assert_eq!(bare.value, "");
        assert!(SerialLine::parse("[serial]").is_none());
    }
}
