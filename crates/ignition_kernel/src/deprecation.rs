//! Deduplicated deprecation logging for debug-mode assembly.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use ignition_container::DeprecationNotice;

/// One deduplicated deprecation, as written to `{Class}Deprecations.log`.
#[derive(Debug, Clone, Serialize)]
pub struct DeprecationEntry {
    /// The warning text.
    pub message: String,
    /// Source file of the first call site that emitted it.
    pub file: String,
    /// Line of that call site.
    pub line: u32,
    /// How many times the message was emitted during assembly.
    pub count: u32,
}

/// Aggregates deprecation notices, deduplicating by message text.
///
/// The first occurrence's call site is kept as the representative; later
/// occurrences only bump the count. Collection never alters control flow.
#[derive(Debug, Default)]
pub struct DeprecationCollector {
    entries: Vec<DeprecationEntry>,
    index: HashMap<String, usize>,
}

impl DeprecationCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collector from raw notices in emission order.
    pub fn collect(notices: &[DeprecationNotice]) -> Self {
        let mut collector = Self::new();
        for notice in notices {
            collector.record(notice);
        }
        collector
    }

    /// Records one notice.
    pub fn record(&mut self, notice: &DeprecationNotice) {
        if let Some(&i) = self.index.get(&notice.message) {
            self.entries[i].count += 1;
            return;
        }
        self.index.insert(notice.message.clone(), self.entries.len());
        self.entries.push(DeprecationEntry {
            message: notice.message.clone(),
            file: notice.file.clone(),
            line: notice.line,
            count: 1,
        });
    }

    /// The deduplicated entries in first-seen order.
    pub fn entries(&self) -> &[DeprecationEntry] {
        &self.entries
    }

    /// Writes the entries as JSON lines.
    pub fn write_log(&self, path: &Path) -> std::io::Result<()> {
        let mut out = String::new();
        for entry in &self.entries {
            // Serializing these plain string/number fields cannot fail.
            if let Ok(line) = serde_json::to_string(entry) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        std::fs::write(path, out)
    }
}
