//! Terminal tables for listings such as `burger tools`.
//!
//! Columns are sized to their content and shrunk, widest first, until the
//! table fits the terminal.
//!
//! ```rust
//! use burger::ui::Table;
//!
//! let mut table = Table::new(&["Tool", "Location"]);
//! table.add_row(vec!["git".to_string(), "/usr/bin/git".to_string()]);
//! assert!(table.render(80).contains("/usr/bin/git"));
//! ```

use colored::*;
use console::{measure_text_width, truncate_str};

/// Columns never shrink below this width
const MIN_COLUMN_WIDTH: usize = 8;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| measure_text_width(h)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(measure_text_width(&sanitize_content(cell)));
            }
        }

        // Indent, borders and cell padding
        let overhead = 3 + 3 * self.headers.len();
        let available = max_width.saturating_sub(overhead);
        let mut total: usize = widths.iter().sum();
        while total > available {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|&(_, w)| *w) else {
                break;
            };
            if widest <= MIN_COLUMN_WIDTH {
                break;
            }
            widths[idx] -= 1;
            total -= 1;
        }
        widths
    }

    /// The table as text, at most about `max_width` columns wide.
    pub fn render(&self, max_width: usize) -> String {
        if self.headers.is_empty() {
            return String::new();
        }
        let widths = self.column_widths(max_width);
        let separator = |left: &str, mid: &str, right: &str| -> String {
            let cells: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}\n", left, cells.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| -> String {
            let mut s = String::from("  │");
            for (cell, &width) in cells.iter().zip(&widths) {
                let clean = sanitize_content(cell);
                let truncated = truncate_str(&clean, width, "...");
                let padding = width.saturating_sub(measure_text_width(&truncated));
                let text = if bold {
                    truncated.bold().to_string()
                } else {
                    truncated.into_owned()
                };
                s.push_str(&format!(" {}{} │", text, " ".repeat(padding)));
            }
            s.push('\n');
            s
        };

        let mut out = separator("┌", "┬", "┐");
        out.push_str(&line(&self.headers, true));
        out.push_str(&separator("├", "┼", "┤"));
        for row in &self.rows {
            out.push_str(&line(row, false));
        }
        out.push_str(&separator("└", "┴", "┘"));
        out
    }

    /// Print sized to the current terminal.
    pub fn print(&self) {
        let (_rows, columns) = console::Term::stdout().size();
        print!("{}", self.render(columns as usize));
    }
}

fn sanitize_content(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> String {
        console::strip_ansi_codes(text).into_owned()
    }

    #[test]
    fn test_render_layout() {
        let mut table = Table::new(&["Tool", "Path"]);
        table.add_row(vec!["git".into(), "/usr/bin/git".into()]);
        table.add_row(vec!["bad row".into()]);
        let text = plain(&table.render(120));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "  ┌──────┬──────────────┐");
        assert_eq!(lines[1], "  │ Tool │ Path         │");
        assert_eq!(lines[3], "  │ git  │ /usr/bin/git │");
    }

    #[test]
    fn test_shrinks_to_width() {
        let mut table = Table::new(&["Name", "Value"]);
        table.add_row(vec!["x".into(), "y".repeat(100)]);
        let text = plain(&table.render(40));
        for line in text.lines() {
            assert!(measure_text_width(line) <= 40, "{}", line);
        }
        assert!(text.contains("..."));
    }

    #[test]
    fn test_sanitize_content() {
        assert_eq!(sanitize_content("a\tb\nc"), "a b c");
    }
}
