//! List emission and numbering continuation
//!
//! Continuation is decided from the list's immediate `<ol>` siblings only.
//! The decision is written out as a table ([`StartRule`], [`decide`]) so
//! each row can be checked against the behaviour it encodes.

use log::debug;

use super::ConversionSession;
use super::walker::{Cursor, Scope, is_formatting_whitespace};
use crate::document::models::{Block, NumberingId, Paragraph, ParagraphKind};
use crate::html::{NodeId, ParseTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    pub fn of(tree: &ParseTree, node: NodeId) -> Option<Self> {
        match tree.tag(node)? {
            "ol" => Some(ListKind::Ordered),
            "ul" => Some(ListKind::Unordered),
            _ => None,
        }
    }
}

/// Numbering of the last list that emitted a paragraph at its own level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListTail {
    pub numbering: NumberingId,
}

/// Everything the walker needs to emit one list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListContext {
    pub kind: ListKind,
    /// 1-based nesting level
    pub level: usize,
    pub continued: bool,
    /// Tail to continue numbering from, when `continued`
    pub previous: Option<ListTail>,
}

impl ListContext {
    pub fn fresh(kind: ListKind, level: usize) -> Self {
        Self {
            kind,
            level,
            continued: false,
            previous: None,
        }
    }

    pub fn continuing(kind: ListKind, previous: Option<ListTail>) -> Self {
        Self {
            kind,
            level: 1,
            continued: true,
            previous,
        }
    }
}

/// How `start` attributes are distributed between a list and its successor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartRule {
    OnlyNext,
    Both,
    OnlyCurrent,
    Neither,
}

/// Outcome of one row of the decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Continued,
    NotContinued,
    CompareItemValues,
}

fn decide(has_previous: bool, next: Option<(bool, StartRule)>) -> Decision {
    match (has_previous, next) {
        (false, None) => Decision::NotContinued,
        (true, None) => Decision::Continued,
        // the successor is not a list at all
        (_, Some((false, _))) => Decision::NotContinued,
        (_, Some((true, StartRule::OnlyNext))) => Decision::NotContinued,
        (_, Some((true, StartRule::Both))) => Decision::Continued,
        (_, Some((true, StartRule::OnlyCurrent))) => Decision::Continued,
        (_, Some((true, StartRule::Neither))) => Decision::CompareItemValues,
    }
}

fn start_rule(current_has_start: bool, next_has_start: bool) -> StartRule {
    match (current_has_start, next_has_start) {
        (false, true) => StartRule::OnlyNext,
        (true, true) => StartRule::Both,
        (true, false) => StartRule::OnlyCurrent,
        (false, false) => StartRule::Neither,
    }
}

fn first_item(tree: &ParseTree, list: NodeId) -> Option<NodeId> {
    tree.element_children(list)
        .find(|&child| tree.tag(child) == Some("li"))
}

fn item_value(tree: &ParseTree, item: NodeId) -> Option<i64> {
    tree.attr(item, "value")?.trim().parse().ok()
}

/// Whether the top-level ordered list `list` continues a sibling's numbering
///
/// 1. no `<ol>` sibling on either side: no
/// 2. an `<ol>` before and none after: yes
/// 3. otherwise look at the nearest following `<ol>`: a `start` only on it
///    means no; `start` on both, or only on `list`, means yes
/// 4. with no `start` on either, both first items must carry a numeric
///    `value` and the successor's must be exactly one higher
pub fn is_list_continued(tree: &ParseTree, list: NodeId) -> bool {
    let previous = tree.preceding_siblings(list, "ol");
    let following = tree.following_siblings(list, "ol");

    let next = following.first().map(|&next| {
        let is_list = ListKind::of(tree, next).is_some();
        let rule = start_rule(tree.has_attr(list, "start"), tree.has_attr(next, "start"));
        (is_list, rule)
    });

    match decide(!previous.is_empty(), next) {
        Decision::Continued => true,
        Decision::NotContinued => false,
        Decision::CompareItemValues => {
            let Some(&next) = following.first() else {
                return false;
            };
            let current_value = first_item(tree, list).and_then(|item| item_value(tree, item));
            let next_value = first_item(tree, next).and_then(|item| item_value(tree, item));
            match (current_value, next_value) {
                (Some(current), Some(next)) => next - current == 1,
                _ => false,
            }
        }
    }
}

impl ConversionSession<'_> {
    /// Emit a list rooted outside any other list
    pub(crate) fn emit_top_level_list(&mut self, list: NodeId, out: &mut Vec<Block>) {
        let Some(kind) = ListKind::of(self.tree, list) else {
            return;
        };

        let context = match kind {
            ListKind::Ordered if is_list_continued(self.tree, list) => {
                ListContext::continuing(kind, self.list_tail)
            }
            _ => ListContext::fresh(kind, 1),
        };

        let tail = self.emit_list(list, out, context);
        if kind == ListKind::Ordered {
            self.list_tail = tail;
        }
    }

    /// Emit `list` and its nested lists into `out`
    ///
    /// Returns the tail to continue from: the last paragraph this list
    /// emitted at its own level, or the incoming tail if it emitted none.
    pub(crate) fn emit_list(
        &mut self,
        list: NodeId,
        out: &mut Vec<Block>,
        context: ListContext,
    ) -> Option<ListTail> {
        let tree = self.tree;
        if context.continued && context.previous.is_none() {
            debug!("no earlier list to continue; numbering afresh");
        }
        let mut numbering = context.previous.map(|tail| tail.numbering);
        let mut tail = context.previous;

        let items: Vec<NodeId> = tree
            .element_children(list)
            .filter(|&child| tree.tag(child) == Some("li"))
            .collect();
        if items.is_empty() {
            debug!("skipping empty list");
            return tail;
        }

        for item in items {
            let numbering_id = *numbering.get_or_insert_with(|| {
                let start = tree
                    .attr(list, "start")
                    .and_then(|value| value.trim().parse().ok());
                self.allocate_numbering(context.kind, context.level - 1, start)
            });

            let template = Paragraph {
                kind: ParagraphKind::ListItem {
                    numbering: numbering_id,
                    level: context.level - 1,
                },
                indent_left: Some(self.config.list_indent_twips(context.level)),
                ..Paragraph::default()
            };
            let item_style = self.root_style(item);
            let mut cursor = Cursor::new(Scope::Container, template);
            let mut last_para: Option<usize> = None;

            for &child in tree.children(item) {
                if tree.text(child).is_some_and(is_formatting_whitespace) {
                    continue;
                }

                match tree.tag(child) {
                    Some("ul" | "ol") => {
                        cursor.close();
                        if let Some(kind) = ListKind::of(tree, child) {
                            let nested = ListContext::fresh(kind, context.level + 1);
                            self.emit_list(child, out, nested);
                        }
                    }
                    Some("table") => {
                        cursor.close();
                        if let Some(table) = self.build_table(child) {
                            // keep the table next to the item it belongs to
                            let at = last_para.map_or(out.len(), |index| index + 1);
                            out.insert(at, Block::Table(table));
                        }
                    }
                    Some("p" | "blockquote") => {
                        cursor.close();
                        let index = self.emit_block_paragraph(child, out, &mut cursor, &item_style);
                        last_para = Some(index);
                        cursor.close();
                    }
                    _ => {
                        self.inline_node(child, out, &mut cursor, &item_style);
                        if let Some(index) = cursor.para {
                            last_para = Some(index);
                        }
                    }
                }
            }

            if last_para.is_some() {
                tail = Some(ListTail {
                    numbering: numbering_id,
                });
            }
        }

        tail
    }
}
