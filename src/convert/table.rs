//! HTML tables to grid tables
//!
//! The column count is the widest row; shorter rows are padded with empty
//! cells. Cell content goes back through the walker, so cells can hold
//! paragraphs, lists, quotes, headings and further tables.

use log::debug;

use super::ConversionSession;
use super::walker::{Cursor, Scope};
use crate::document::models::{Paragraph, Table, TableCell};
use crate::html::{NodeId, ParseTree};

const ROW_GROUPS: &[&str] = &["thead", "tbody", "tfoot"];
const CELL_TAGS: &[&str] = &["td", "th"];

/// Row and cell nodes of one `<table>`, excluding nested tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableGrid {
    pub rows: Vec<Vec<NodeId>>,
    pub columns: usize,
}

impl TableGrid {
    pub fn from_table(tree: &ParseTree, table: NodeId) -> Self {
        let mut rows = Vec::new();
        for child in tree.element_children(table) {
            if tree.is_tag(child, &["tr"]) {
                rows.push(Self::cells(tree, child));
            } else if tree.is_tag(child, ROW_GROUPS) {
                rows.extend(
                    tree.element_children(child)
                        .filter(|&row| tree.is_tag(row, &["tr"]))
                        .map(|row| Self::cells(tree, row)),
                );
            }
        }

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        TableGrid { rows, columns }
    }

    fn cells(tree: &ParseTree, row: NodeId) -> Vec<NodeId> {
        tree.element_children(row)
            .filter(|&cell| tree.is_tag(cell, CELL_TAGS))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns == 0
    }
}

impl ConversionSession<'_> {
    /// Build a table, or `None` when it has no rows or no cells
    pub(crate) fn build_table(&mut self, table: NodeId) -> Option<Table> {
        let grid = TableGrid::from_table(self.tree, table);
        if grid.is_empty() {
            debug!("skipping table without cells");
            return None;
        }

        let mut rows = Vec::with_capacity(grid.rows.len());
        for row in &grid.rows {
            let mut cells = Vec::with_capacity(grid.columns);
            for column in 0..grid.columns {
                let cell = match row.get(column) {
                    Some(&node) => self.build_cell(node),
                    None => TableCell::default(),
                };
                cells.push(cell);
            }
            rows.push(cells);
        }

        Some(Table {
            columns: grid.columns,
            rows,
        })
    }

    fn build_cell(&mut self, cell: NodeId) -> TableCell {
        let style = self.root_style(cell);
        let template = Paragraph {
            alignment: style.text_align,
            ..Paragraph::default()
        };

        let tree = self.tree;
        let mut blocks = Vec::new();
        let mut cursor = Cursor::new(Scope::Container, template);
        for &child in tree.children(cell) {
            self.inline_node(child, &mut blocks, &mut cursor, &style);
        }
        TableCell { blocks }
    }
}
