//! Console reporting: progress lines, skip notices and sheet previews.

use std::io;

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use crate::{execution::ExecutionOutcome, workbook::Table};

const PREVIEW_CELL_WIDTH: usize = 24;

pub struct TextPrinter {
    pub color: bool,
}

impl TextPrinter {
    /// Colour only when asked for and stdout is a terminal.
    pub fn new(color: bool) -> Self {
        Self { color: color && io::stdout().is_terminal() }
    }

    pub fn print(&self, text: &str, color: Option<&'static str>) {
        match color.filter(|_| self.color) {
            Some("green") => println!("{}", text.green()),
            Some("cyan") => println!("{}", text.cyan()),
            Some("magenta") => println!("{}", text.magenta()),
            Some("yellow") => println!("{}", text.yellow()),
            Some("red") => println!("{}", text.red()),
            _ => println!("{}", text),
        }
    }

    pub fn sheet(&self, name: &str, rows: usize) {
        self.print(&format!("== sheet '{}' ({} rows)", name, rows), Some("cyan"));
    }

    pub fn preview(&self, table: &Table, limit: usize) {
        if limit == 0 {
            return;
        }
        for line in preview_lines(table, limit) {
            println!("{}", line);
        }
    }

    pub fn skip(&self, row: usize, reason: &str) {
        self.print(&format!("Skipping row {} with {}.", row, reason), Some("yellow"));
    }

    pub fn running(&self, id: &str) {
        self.print(&format!("-> {}", id), Some("magenta"));
    }

    pub fn outcome(&self, id: &str, outcome: &ExecutionOutcome) {
        match outcome {
            ExecutionOutcome::Succeeded { output, diagnostics } => {
                if !diagnostics.trim().is_empty() {
                    eprint!("{}", diagnostics);
                }
                self.print(&format!("   {} ok ({} bytes of output)", id, output.len()), Some("green"));
            }
            ExecutionOutcome::Failed(c) => {
                self.print(&format!("   {} failed: {}", id, c), Some("red"));
            }
        }
    }
}

/// Header plus the first `limit` rows, each cell clipped to a fixed width.
pub fn preview_lines(table: &Table, limit: usize) -> Vec<String> {
    let render = |cells: &[String]| {
        cells
            .iter()
            .map(|c| clip(c))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    std::iter::once(render(table.header.as_slice()))
        .chain(table.cells.iter().take(limit).map(|r| render(r.as_slice())))
        .collect()
}

fn clip(cell: &str) -> String {
    let flat = cell.replace(['\n', '\r'], " ");
    if flat.chars().count() <= PREVIEW_CELL_WIDTH {
        return flat;
    }
    let mut s: String = flat.chars().take(PREVIEW_CELL_WIDTH - 3).collect();
    s.push_str("...");
    s
}
