//! `logship --list` handler

use std::io::Write;

use serde::Serialize;

use logship_pipeline::{PatternInfo, PatternRegistry};

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Print the built-in pattern registry.
pub fn execute(writer: &OutputWriter) -> Result<(), CliError> {
    let report = PatternListReport::from_registry(&PatternRegistry::builtin());
    writer.render(&report)
}

/// Listing of every built-in pattern.
#[derive(Debug, Serialize)]
pub struct PatternListReport {
    pub total: usize,
    pub patterns: Vec<PatternInfo>,
}

impl PatternListReport {
    pub fn from_registry(registry: &PatternRegistry) -> Self {
        let patterns = registry.list().to_vec();
        Self {
            total: patterns.len(),
            patterns,
        }
    }
}

impl Render for PatternListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Built-in patterns ({}):", self.total)?;
        for info in &self.patterns {
            writeln!(w)?;
            writeln!(w, "{:<14} {}", info.id, info.description)?;
            writeln!(w, "{:<14} {}", "", info.pattern)?;
        }
        Ok(())
    }
}
