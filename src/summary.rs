// 📊 Import summary
// Counts per collection and per source, rendered as terminal tables.

use crate::db::Collection;
use crate::parser::SourceType;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::path::PathBuf;

/// One input file as read by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSummary {
    pub source: SourceType,
    pub path: PathBuf,
    /// SHA-256 of the file, hex
    pub fingerprint: String,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportSummary {
    /// Sink description, None for a dry run
    pub sink: Option<String>,
    pub reset: bool,
    pub sources: Vec<SourceSummary>,
    /// Records inserted per collection (parsed, for a dry run), in insert order
    pub counts: Vec<(Collection, usize)>,
    /// Prescription lines stored without a parsed dose
    pub unparsed_medications: Vec<String>,
}

impl ImportSummary {
    pub fn is_dry_run(&self) -> bool {
        self.sink.is_none()
    }

    pub fn count(&self, collection: Collection) -> usize {
        self.counts
            .iter()
            .find(|(c, _)| *c == collection)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn dropped(&self, source: SourceType) -> usize {
        self.sources
            .iter()
            .filter(|s| s.source == source)
            .map(|s| s.rows_dropped)
            .sum()
    }

    pub fn collection_table(&self) -> Table {
        let mut table = Table::new();
        let count_header = if self.is_dry_run() { "Parsed" } else { "Inserted" };
        table.set_header(vec![header_cell("Collection"), header_cell(count_header)]);
        apply_table_style(&mut table);
        align_right(&mut table, 1);

        for (collection, count) in &self.counts {
            table.add_row(vec![Cell::new(collection.name()), Cell::new(count)]);
        }
        table.add_row(vec![
            Cell::new("TOTAL").fg(Color::Cyan).add_attribute(Attribute::Bold),
            Cell::new(self.total()).add_attribute(Attribute::Bold),
        ]);
        table
    }

    pub fn source_table(&self) -> Table {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Source"),
            header_cell("File"),
            header_cell("Rows"),
            header_cell("Dropped"),
            header_cell("SHA-256"),
        ]);
        apply_table_style(&mut table);
        align_right(&mut table, 2);
        align_right(&mut table, 3);

        for source in &self.sources {
            let dropped = if source.rows_dropped > 0 {
                Cell::new(source.rows_dropped).fg(Color::Yellow)
            } else {
                Cell::new(source.rows_dropped)
            };
            table.add_row(vec![
                Cell::new(source.source.code()),
                Cell::new(source.path.display()),
                Cell::new(source.rows_read),
                dropped,
                Cell::new(short_digest(&source.fingerprint)),
            ]);
        }
        table
    }

    /// Full plain-text report
    pub fn render(&self) -> String {
        let mut out = String::new();
        match &self.sink {
            Some(sink) => {
                out.push_str(&format!("Sink: {}\n", sink));
                if self.reset {
                    out.push_str("Reset: all collections cleared before import\n");
                }
            }
            None => out.push_str("Dry run: nothing was written\n"),
        }
        out.push_str(&format!("{}\n", self.source_table()));
        out.push_str(&format!("{}\n", self.collection_table()));

        if !self.unparsed_medications.is_empty() {
            out.push_str(&format!(
                "Medication lines without a parsed dose ({}):\n",
                self.unparsed_medications.len()
            ));
            for line in &self.unparsed_medications {
                out.push_str(&format!("- {}\n", line));
            }
        }
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}

fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_right(table: &mut Table, index: usize) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(CellAlignment::Right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ImportSummary {
        ImportSummary {
            sink: Some("memory".to_string()),
            reset: true,
            sources: vec![
                SourceSummary {
                    source: SourceType::Diet,
                    path: PathBuf::from("data/diet.csv"),
                    fingerprint: "ab".repeat(32),
                    rows_read: 10,
                    rows_dropped: 2,
                },
                SourceSummary {
                    source: SourceType::Visits,
                    path: PathBuf::from("data/visits.csv"),
                    fingerprint: "cd".repeat(32),
                    rows_read: 3,
                    rows_dropped: 0,
                },
            ],
            counts: Collection::ALL.iter().map(|c| (*c, 2)).collect(),
            unparsed_medications: vec!["Aspirin x2".to_string()],
        }
    }

    #[test]
    fn test_counts() {
        let summary = sample();
        assert_eq!(summary.count(Collection::Weights), 2);
        assert_eq!(summary.total(), 10);
        assert_eq!(summary.dropped(SourceType::Diet), 2);
        assert_eq!(summary.dropped(SourceType::Tests), 0);
        assert!(!summary.is_dry_run());
    }

    #[test]
    fn test_render_lists_collections_and_unparsed_lines() {
        let text = sample().render();
        for collection in Collection::ALL {
            assert!(text.contains(collection.name()), "missing {}", collection);
        }
        assert!(text.contains("Inserted"));
        assert!(text.contains("Reset"));
        assert!(text.contains("- Aspirin x2"));
        assert!(text.contains(&"ab".repeat(6)), "short fingerprint shown");
    }

    #[test]
    fn test_dry_run_render() {
        let summary = ImportSummary {
            sink: None,
            ..sample()
        };
        let text = summary.render();
        assert!(text.starts_with("Dry run"));
        assert!(text.contains("Parsed"));
    }
}
