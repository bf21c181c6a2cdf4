//! Grid materialization for HTML tables with merged cells.
//!
//! Every `rowspan`/`colspan` is resolved into a dense rectangular grid in
//! which each covered position repeats the originating cell's text. A rowspan
//! reaching past the last row adds rows to the grid rather than being cut off.

use scraper::{ElementRef, Node};
use thiserror::Error;

/// Upper bound on materialized cells for a single table.
pub const MAX_GRID_CELLS: usize = 250_000;

/// Elements whose boundaries separate words inside a cell.
const CELL_BREAKS: &[&str] = &[
    "br", "p", "div", "li", "ul", "ol", "dl", "dt", "dd", "table", "tr", "td", "th", "h1", "h2",
    "h3", "h4", "h5", "h6", "pre", "blockquote", "hr",
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TableError {
    #[error("table has no rows")]
    NoRows,

    #[error("table would expand to {cells} cells")]
    TooLarge { cells: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
    /// The source table marked header cells with `<th>`.
    pub has_header: bool,
}

impl Grid {
    /// Builds the dense grid for `table`, ignoring rows of nested tables.
    pub fn from_table(table: ElementRef<'_>) -> Result<Self, TableError> {
        let rows = own_rows(table);
        if rows.is_empty() {
            return Err(TableError::NoRows);
        }

        let mut has_header = false;
        let mut cells: Vec<Vec<Option<String>>> = Vec::new();

        for (r, row) in rows.iter().enumerate() {
            if cells.len() <= r {
                cells.push(Vec::new());
            }
            let mut c = 0;

            for cell in row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|e| matches!(e.value().name(), "td" | "th"))
            {
                if cell.value().name() == "th" {
                    has_header = true;
                }

                while cells[r].get(c).is_some_and(Option::is_some) {
                    c += 1;
                }

                let rowspan = span(cell, "rowspan");
                let colspan = span(cell, "colspan");
                let height = r.saturating_add(rowspan).max(cells.len());
                let width = c
                    .saturating_add(colspan)
                    .max(cells.iter().map(Vec::len).max().unwrap_or(0));
                let needed = height.saturating_mul(width);
                if needed > MAX_GRID_CELLS {
                    return Err(TableError::TooLarge { cells: needed });
                }

                let text = cell_text(cell);
                while cells.len() < r + rowspan {
                    cells.push(Vec::new());
                }
                for grid_row in cells.iter_mut().skip(r).take(rowspan) {
                    if grid_row.len() < c + colspan {
                        grid_row.resize(c + colspan, None);
                    }
                    for slot in grid_row.iter_mut().skip(c).take(colspan) {
                        *slot = Some(text.clone());
                    }
                }
                c += colspan;
            }
        }

        let width = cells.iter().map(Vec::len).max().unwrap_or(0);
        let rows = cells
            .into_iter()
            .map(|row| {
                let mut row: Vec<String> = row.into_iter().map(Option::unwrap_or_default).collect();
                row.resize(width, String::new());
                row
            })
            .collect();

        Ok(Self { rows, has_header })
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Drops empty rows and columns. `None` when nothing is left.
    ///
    /// An empty first row goes with the other empty rows, so a headerless
    /// table never promotes blank labels.
    pub fn cleaned(mut self) -> Option<Self> {
        self.rows.retain(|row| row.iter().any(|cell| !cell.is_empty()));

        let width = self.width();
        let keep: Vec<bool> = (0..width)
            .map(|col| self.rows.iter().any(|row| !row[col].is_empty()))
            .collect();
        for row in &mut self.rows {
            let mut index = 0;
            row.retain(|_| {
                let kept = keep[index];
                index += 1;
                kept
            });
        }

        if self.rows.is_empty() || self.width() == 0 {
            return None;
        }
        Some(self)
    }

    /// Renders a span-free pipe table; the first row is always the header row.
    pub fn to_markdown(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        for (index, row) in self.rows.iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|cell| escape_cell(cell)).collect();
            lines.push(format!("| {} |", cells.join(" | ")));
            if index == 0 {
                lines.push(format!("| {} |", vec!["---"; row.len()].join(" | ")));
            }
        }
        lines.join("\n")
    }
}

/// Materializes and cleans `table`; `Ok(None)` means keep the original markup.
pub fn simplify(table: ElementRef<'_>) -> Result<Option<Grid>, TableError> {
    Ok(Grid::from_table(table)?.cleaned())
}

fn own_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|e| e.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

fn span(cell: ElementRef<'_>, attribute: &str) -> usize {
    cell.value()
        .attr(attribute)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(cell, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Inline markup joins its text directly; block boundaries and line breaks
// become a space.
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) => {
                let breaks = CELL_BREAKS.contains(&e.name());
                if breaks {
                    out.push(' ');
                }
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
                if breaks {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Escapes pipes and the inline Markdown characters the generic converter escapes.
fn escape_cell(cell: &str) -> String {
    let mut escaped = String::with_capacity(cell.len());
    for ch in cell.chars() {
        if matches!(ch, '\\' | '*' | '_' | '`' | '[' | ']' | '|') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
