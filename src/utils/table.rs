//! Table rendering utilities for CLI outputs.
//! Column widths are computed from the visible (ANSI-stripped) cell content.

use regex::Regex;
use std::sync::OnceLock;

fn ansi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1B\[[0-9;]*[mK]").expect("static ANSI regex"))
}

/// Printable width of a cell, ignoring color escapes.
pub fn visible_len(s: &str) -> usize {
    ansi_re().replace_all(s, "").chars().count()
}

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| visible_len(c))
                    .chain(std::iter::once(visible_len(h)))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();

        // Header
        for (h, w) in self.headers.iter().zip(&widths) {
            push_cell(&mut out, h, *w);
        }
        out.push('\n');

        for w in &widths {
            out.push_str(&"-".repeat(*w));
            out.push(' ');
        }
        out.push('\n');

        // Rows
        for row in &self.rows {
            for (i, w) in widths.iter().enumerate() {
                push_cell(&mut out, row.get(i).map(String::as_str).unwrap_or(""), *w);
            }
            out.push('\n');
        }

        out
    }
}

fn push_cell(out: &mut String, cell: &str, width: usize) {
    out.push_str(cell);
    let pad = width.saturating_sub(visible_len(cell));
    out.push_str(&" ".repeat(pad + 1));
}
