//! Presentation tables: materialized display cells plus column sorting.
//!
//! Sorting reorders the display rows only — the data model a table was
//! built from is never touched. Comparison is numeric when both cells parse
//! as numbers ("9.5" sorts before "11"), lexicographic otherwise.

use std::cmp::Ordering;

// ── Sort state ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn flip(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: usize,
    pub direction: Direction,
}

// ── Table ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TableView {
    title: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    sort: Option<SortState>,
}

impl TableView {
    pub fn new(title: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            title: title.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
            sort: None,
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    /// Select a column for sorting: a fresh selection sorts ascending, the
    /// same column again flips direction, and any other column's indicator
    /// is cleared (only one column carries a sort at a time).
    pub fn toggle_sort(&mut self, column: usize) {
        if column >= self.columns.len() {
            return;
        }
        let direction = match self.sort {
            Some(s) if s.column == column => s.direction.flip(),
            _ => Direction::Ascending,
        };
        self.set_sort(column, direction);
    }

    pub fn set_sort(&mut self, column: usize, direction: Direction) {
        if column >= self.columns.len() {
            return;
        }
        self.sort = Some(SortState { column, direction });
        self.apply_sort();
    }

    /// Select a column by header name (case-insensitive). Returns false for
    /// an unknown header, leaving the table untouched.
    pub fn sort_by_header(&mut self, header: &str) -> bool {
        let Some(column) = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(header.trim()))
        else {
            return false;
        };
        self.toggle_sort(column);
        true
    }

    fn apply_sort(&mut self) {
        let Some(SortState { column, direction }) = self.sort else {
            return;
        };
        // Vec::sort_by is stable: equal keys keep their relative order
        // within this call.
        self.rows.sort_by(|a, b| {
            let x = a.get(column).map(String::as_str).unwrap_or("");
            let y = b.get(column).map(String::as_str).unwrap_or("");
            let ord = compare_cells(x, y);
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Plain-text table for the terminal.
    pub fn to_text(&self) -> String {
        let headers: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| match self.sort {
                Some(s) if s.column == i && s.direction == Direction::Ascending => {
                    format!("{} ▲", c)
                }
                Some(s) if s.column == i => format!("{} ▼", c),
                _ => c.clone(),
            })
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');

        let line = |cells: &[String], widths: &[usize]| {
            let mut s = String::from(" ");
            for (i, &w) in widths.iter().enumerate() {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                s.push_str(&format!(" {:<width$} ", cell, width = w));
            }
            s.push('\n');
            s
        };

        out.push_str(&line(&headers, &widths));
        let total: usize = widths.iter().map(|w| w + 2).sum::<usize>() + 1;
        out.push_str(&"─".repeat(total));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&line(row, &widths));
        }
        out
    }

    /// Markdown export (the dashboards keep a copyable block next to each
    /// table). `limit` caps the emitted rows, e.g. top five by score.
    pub fn to_markdown(&self, limit: Option<usize>) -> String {
        let mut out = format!("### {}\n\n", self.title);
        out.push_str(&format!("| {} |\n", self.columns.join(" | ")));
        out.push_str(&format!(
            "|{}\n",
            self.columns.iter().map(|_| "---|").collect::<String>()
        ));
        let cap = limit.unwrap_or(self.rows.len());
        for row in self.rows.iter().take(cap) {
            out.push_str(&format!("| {} |\n", row.join(" | ")));
        }
        out
    }
}

// ── Cell comparison ───────────────────────────────────────────────────────────

fn compare_cells(a: &str, b: &str) -> Ordering {
    match (parse_cell_number(a), parse_cell_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// "9.67", "+1.80%", "1,234" all count as numbers for sorting purposes.
fn parse_cell_number(s: &str) -> Option<f64> {
    let cleaned = s.trim().trim_end_matches('%').replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TableView {
        let mut t = TableView::new("test", &["Ticker", "Close", "Δ%"]);
        t.push_row(vec!["MSFT".into(), "410.50".into(), "+0.20%".into()]);
        t.push_row(vec!["AMD".into(), "142.10".into(), "-1.10%".into()]);
        t.push_row(vec!["NVDA".into(), "9.75".into(), "+2.40%".into()]);
        t
    }

    fn column(t: &TableView, i: usize) -> Vec<String> {
        t.rows.iter().map(|r| r[i].clone()).collect()
    }

    #[test]
    fn first_selection_sorts_ascending_then_flips() {
        let mut t = sample();
        t.toggle_sort(0);
        assert_eq!(column(&t, 0), vec!["AMD", "MSFT", "NVDA"]);
        assert_eq!(
            t.sort_state(),
            Some(SortState { column: 0, direction: Direction::Ascending })
        );

        t.toggle_sort(0);
        assert_eq!(column(&t, 0), vec!["NVDA", "MSFT", "AMD"]);
        assert_eq!(
            t.sort_state(),
            Some(SortState { column: 0, direction: Direction::Descending })
        );
    }

    #[test]
    fn selecting_another_column_clears_the_previous_indicator() {
        let mut t = sample();
        t.toggle_sort(0);
        t.toggle_sort(0);
        // Moving to a new column starts ascending again.
        t.toggle_sort(1);
        assert_eq!(
            t.sort_state(),
            Some(SortState { column: 1, direction: Direction::Ascending })
        );
    }

    #[test]
    fn numeric_cells_compare_as_numbers_not_strings() {
        let mut t = sample();
        t.toggle_sort(1);
        // Lexicographically "9.75" > "410.50"; numerically it is smallest.
        assert_eq!(column(&t, 1), vec!["9.75", "142.10", "410.50"]);

        t.toggle_sort(2);
        // Percent suffixes and signs still parse.
        assert_eq!(column(&t, 2), vec!["-1.10%", "+0.20%", "+2.40%"]);
    }

    #[test]
    fn mixed_cells_fall_back_to_lexicographic() {
        let mut t = TableView::new("mixed", &["v"]);
        t.push_row(vec!["apple".into()]);
        t.push_row(vec!["10".into()]);
        t.push_row(vec!["Zebra".into()]);
        t.toggle_sort(0);
        // "10" vs "apple" cannot both parse → string order throughout.
        assert_eq!(column(&t, 0), vec!["10", "Zebra", "apple"]);
    }

    #[test]
    fn sorting_an_already_sorted_table_is_idempotent() {
        let mut t = sample();
        t.set_sort(1, Direction::Ascending);
        let once = t.rows.clone();
        t.set_sort(1, Direction::Ascending);
        assert_eq!(t.rows, once);
    }

    #[test]
    fn markdown_export_respects_the_row_limit() {
        let mut t = sample();
        t.set_sort(0, Direction::Ascending);
        let md = t.to_markdown(Some(2));
        assert!(md.starts_with("### test"));
        assert!(md.contains("| AMD |"));
        assert!(!md.contains("| NVDA |"));
    }

    #[test]
    fn text_render_marks_the_sorted_column() {
        let mut t = sample();
        t.toggle_sort(2);
        let text = t.to_text();
        assert!(text.contains("Δ% ▲"));
        t.toggle_sort(2);
        assert!(t.to_text().contains("Δ% ▼"));
    }
}
