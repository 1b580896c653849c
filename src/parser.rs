// parser.rs
//!
//! INI-style section parser for DOSBox configuration text.
//!
//! Comments (`#`) and blank lines are dropped, every other line is trimmed and
//! assigned to the section opened by the most recent `[name]` header. Nothing
//! here fails: lines that do not fit the grammar are kept verbatim.

use tracing::trace;

// ============================================================================
// SECTION TYPES
// ============================================================================

/// Key/value entries of a section, in first-seen key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
    /// Lines without `=` found in a key/value section.
    unparsed: Vec<String>,
}

impl Properties {
    /// Inserts or overwrites `key`. A repeated key keeps its original position.
    pub fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unparsed(&self) -> &[String] {
        &self.unparsed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// Plain ordered lines, e.g. `[autoexec]`.
    Lines(Vec<String>),
    Properties(Properties),
}

impl Section {
    fn from_lines(lines: Vec<String>) -> Self {
        if !lines.iter().any(|l| l.contains('=')) {
            return Section::Lines(lines);
        }

        let mut props = Properties::default();
        for line in lines {
            match line.split_once('=') {
                Some((key, value)) => props.insert(key.trim(), value.trim()),
                None => props.unparsed.push(line),
            }
        }
        Section::Properties(props)
    }

    pub fn properties(&self) -> Option<&Properties> {
        match self {
            Section::Properties(props) => Some(props),
            Section::Lines(_) => None,
        }
    }

    pub fn lines(&self) -> Option<&[String]> {
        match self {
            Section::Lines(lines) => Some(lines.as_slice()),
            Section::Properties(_) => None,
        }
    }

    /// Looks up `key` in a key/value section.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.properties().and_then(|p| p.get(key))
    }
}

/// Parsed sections in first-seen order. A repeated header replaces the
/// earlier body but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    sections: Vec<(String, Section)>,
}

impl Sections {
    fn insert(&mut self, name: String, section: Section) {
        match self.sections.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = section,
            None => self.sections.push((name, section)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    /// The `[serial]` section, when it holds key/value entries.
    pub fn serial(&self) -> Option<&Properties> {
        self.get("serial").and_then(Section::properties)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

// ============================================================================
// PARSER
// ============================================================================

enum ScanState {
    OutsideSection,
    InsideSection { name: String, lines: Vec<String> },
}

fn section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

fn is_ignored(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

/// Parses config text with any line-ending style into its sections.
pub fn parse(text: &str) -> Sections {
    let mut sections = Sections::default();
    let mut state = ScanState::OutsideSection;

    for raw in text.lines() {
        let line = raw.trim();
        if is_ignored(line) {
            continue;
        }

        if let Some(name) = section_header(line) {
            if let ScanState::InsideSection { name: open, lines } = state {
                sections.insert(open, Section::from_lines(lines));
            }
            state = ScanState::InsideSection {
                name: name.to_string(),
                lines: Vec::new(),
            };
            continue;
        }

        match &mut state {
            ScanState::InsideSection { lines, .. } => lines.push(line.to_string()),
            ScanState::OutsideSection => trace!(line, "ignoring line outside any section"),
        }
    }

    if let ScanState::InsideSection { name, lines } = state {
        sections.insert(name, Section::from_lines(lines));
    }

    sections
}

// ============================================================================
// TESTS
// ============================================================================
