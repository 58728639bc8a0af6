//! Document walker
//!
//! The top level dispatches body descendants by tag. A handled node owns its
//! whole subtree, so nothing below it is visited again from the top. Inline
//! content is written through a [`Cursor`] that opens paragraphs lazily.

use log::{debug, trace, warn};

use super::ConversionSession;
use super::image::load_image;
use super::list::{ListContext, ListKind};
use super::style::StyleState;
use crate::convert::anchor::resolve_link;
use crate::document::models::{Block, Inline, Paragraph, ParagraphKind, Run};
use crate::html::{NodeId, NodeKind};

/// Parents whose children are only reached through the parent's handler
const CONTAINER_ONLY_PARENTS: &[&str] = &["li", "td", "th", "blockquote"];

/// Parents under which a blockquote is handled at the top level
const SECTION_PARENTS: &[&str] = &["body", "div", "section", "article", "main"];

/// Parents under which a link is part of some other handler's output
const LINK_OWNING_PARENTS: &[&str] = &["p", "li", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Elements whose content never renders
const SKIPPED_TAGS: &[&str] = &["script", "style", "head", "title", "template", "noscript"];

/// How a nested `<p>` behaves inside the content being written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// Writing into one paragraph; a nested `<p>` merges into it
    Paragraph,
    /// Writing into a cell, quote or list item; a nested `<p>` starts a new paragraph
    Container,
}

/// Write position for inline content
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    pub scope: Scope,
    /// Index of the open paragraph in the output, if any
    pub para: Option<usize>,
    template: Paragraph,
}

impl Cursor {
    pub fn new(scope: Scope, template: Paragraph) -> Self {
        Self {
            scope,
            para: None,
            template,
        }
    }

    /// Following inline content goes into a fresh paragraph
    pub fn close(&mut self) {
        self.para = None;
    }

    /// Start a new paragraph from the template and make it current
    pub fn open(&mut self, out: &mut Vec<Block>) -> usize {
        out.push(Block::Paragraph(self.template.clone()));
        let index = out.len() - 1;
        self.para = Some(index);
        index
    }

    pub fn push(&mut self, out: &mut Vec<Block>, inline: Inline) {
        if let Some(Block::Paragraph(para)) = self.para.and_then(|index| out.get_mut(index)) {
            para.inlines.push(inline);
            return;
        }
        let index = self.open(out);
        push_at(out, index, inline);
    }

    /// Whether the open paragraph already holds visible content
    fn has_content(&self, out: &[Block]) -> bool {
        match self.para.and_then(|index| out.get(index)) {
            Some(Block::Paragraph(para)) => para.inlines.iter().any(|inline| {
                !matches!(inline, Inline::BookmarkStart { .. } | Inline::BookmarkEnd { .. })
            }),
            _ => false,
        }
    }
}

/// Append to the paragraph at `index`, if it is one
fn push_at(out: &mut [Block], index: usize, inline: Inline) {
    if let Some(Block::Paragraph(para)) = out.get_mut(index) {
        para.inlines.push(inline);
    }
}

/// Bare newline/carriage-return tokens between tags
pub(crate) fn is_formatting_whitespace(text: &str) -> bool {
    text.trim().is_empty() && text.contains(['\n', '\r'])
}

/// Collapse runs of ASCII whitespace into single spaces
pub(crate) fn collapse_whitespace(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                collapsed.push(' ');
            }
            in_space = true;
        } else {
            collapsed.push(c);
            in_space = false;
        }
    }
    collapsed
}

fn heading_level(tag: &str) -> Option<u8> {
    tag.strip_prefix('h')?
        .parse::<u8>()
        .ok()
        .filter(|level| (1..=6).contains(level))
}

/// Kinds of node the top level handles itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TopLevel {
    Heading(u8),
    Paragraph,
    List,
    Table,
    Blockquote,
    Note,
    Link,
    Image,
}

impl ConversionSession<'_> {
    fn classify(&self, node: NodeId) -> Option<TopLevel> {
        let tree = self.tree;
        let tag = tree.tag(node)?;
        let parent = tree.parent_tag(node).unwrap_or_default();

        if let Some(level) = heading_level(tag) {
            return Some(TopLevel::Heading(level));
        }
        match tag {
            "p" => Some(TopLevel::Paragraph),
            "ul" | "ol" => Some(TopLevel::List),
            "table" => Some(TopLevel::Table),
            "blockquote" if SECTION_PARENTS.contains(&parent) => Some(TopLevel::Blockquote),
            "div" if tree.has_class(node, "note") => Some(TopLevel::Note),
            "a" if !LINK_OWNING_PARENTS.contains(&parent) => Some(TopLevel::Link),
            "img" => Some(TopLevel::Image),
            _ => None,
        }
    }

    /// Walk the children of `body`, emitting blocks into `out`
    pub(crate) fn walk_body(&mut self, body: NodeId, out: &mut Vec<Block>) {
        let tree = self.tree;
        for &child in tree.children(body) {
            self.walk_node(child, out);
        }
    }

    fn walk_node(&mut self, node: NodeId, out: &mut Vec<Block>) {
        let tree = self.tree;
        if tree
            .parent_tag(node)
            .is_some_and(|parent| CONTAINER_ONLY_PARENTS.contains(&parent))
        {
            return;
        }
        if tree.is_tag(node, SKIPPED_TAGS) {
            return;
        }

        let Some(kind) = self.classify(node) else {
            for &child in tree.children(node) {
                self.walk_node(child, out);
            }
            return;
        };

        trace!("top-level {kind:?}");
        match kind {
            TopLevel::Heading(_) => {
                self.emit_heading(node, out);
            }
            TopLevel::Paragraph => {
                let mut cursor = Cursor::new(Scope::Paragraph, Paragraph::default());
                self.emit_block_paragraph(node, out, &mut cursor, &StyleState::default());
            }
            TopLevel::List => self.emit_top_level_list(node, out),
            TopLevel::Table => {
                if let Some(table) = self.build_table(node) {
                    out.push(Block::Table(table));
                }
            }
            TopLevel::Blockquote => self.emit_blockquote(node, out),
            TopLevel::Note => {
                let style = self.root_style(node);
                let mut cursor = Cursor::new(Scope::Paragraph, Paragraph::default());
                cursor.open(out);
                for &child in tree.children(node) {
                    self.inline_node(child, out, &mut cursor, &style);
                }
            }
            TopLevel::Link => {
                let mut cursor = Cursor::new(Scope::Paragraph, Paragraph::default());
                self.inline_link(node, out, &mut cursor, &StyleState::default());
            }
            TopLevel::Image => {
                let mut cursor = Cursor::new(Scope::Paragraph, Paragraph::default());
                self.inline_image(node, out, &mut cursor);
            }
        }
    }

    /// Heading paragraph wrapped in a bookmark when the heading has an id
    pub(crate) fn emit_heading(&mut self, node: NodeId, out: &mut Vec<Block>) -> Option<usize> {
        let level = self.tree.tag(node).and_then(heading_level)?;
        let style = self.root_style(node);
        let mut template = Paragraph::new(ParagraphKind::Heading(level));
        template.alignment = style.text_align;

        let mut cursor = Cursor::new(Scope::Paragraph, template);
        let index = cursor.open(out);
        self.write_wrapped(node, out, &mut cursor, index, &style);
        Some(index)
    }

    /// A paragraph-like element (`p`, or `blockquote` inside a list item)
    /// written into a new paragraph built from the cursor's template
    ///
    /// Returns the index of the paragraph.
    pub(crate) fn emit_block_paragraph(
        &mut self,
        node: NodeId,
        out: &mut Vec<Block>,
        cursor: &mut Cursor,
        inherited: &StyleState,
    ) -> usize {
        let style = inherited.layer_block(&self.declarations(node));
        let index = cursor.open(out);
        if let (Some(align), Some(Block::Paragraph(para))) = (style.text_align, out.get_mut(index)) {
            para.alignment = Some(align);
        }
        self.write_wrapped(node, out, cursor, index, &style);
        index
    }

    /// Write the children of `node`, bracketed by its id bookmark
    ///
    /// The bookmark end lands in the paragraph at `index` even when the
    /// children moved the cursor on.
    fn write_wrapped(
        &mut self,
        node: NodeId,
        out: &mut Vec<Block>,
        cursor: &mut Cursor,
        index: usize,
        style: &StyleState,
    ) {
        let tree = self.tree;
        let bookmark = self.bookmark_for(node);
        if let Some(bookmark) = &bookmark {
            push_at(out, index, bookmark.start());
        }
        for &child in tree.children(node) {
            self.inline_node(child, out, cursor, style);
        }
        if let Some(bookmark) = bookmark {
            push_at(out, index, bookmark.end());
        }
    }

    /// Each child of a quote becomes its own paragraph
    pub(crate) fn emit_blockquote(&mut self, node: NodeId, out: &mut Vec<Block>) {
        let style = self.root_style(node);
        let tree = self.tree;
        let mut cursor = Cursor::new(Scope::Container, Paragraph::default());
        for &child in tree.children(node) {
            if tree.text(child).is_some_and(is_formatting_whitespace) {
                continue;
            }
            self.inline_node(child, out, &mut cursor, &style);
            if tree.tag(child).is_some() {
                cursor.close();
            }
        }
    }

    /// Write one node (and its subtree) at the cursor
    pub(crate) fn inline_node(
        &mut self,
        node: NodeId,
        out: &mut Vec<Block>,
        cursor: &mut Cursor,
        style: &StyleState,
    ) {
        let tree = self.tree;
        let tag = match &tree.node(node).kind {
            NodeKind::Text(text) => return self.inline_text(node, text, out, cursor, style),
            NodeKind::Document => return,
            NodeKind::Element { tag, .. } => tag.as_str(),
        };

        if heading_level(tag).is_some() {
            cursor.close();
            self.emit_heading(node, out);
            cursor.close();
            return;
        }

        match tag {
            "br" => cursor.push(out, Inline::Break),
            "p" => self.inline_paragraph(node, out, cursor, style),
            "span" => self.inline_span(node, out, cursor, style),
            "a" => self.inline_link(node, out, cursor, style),
            "img" => self.inline_image(node, out, cursor),
            "ul" | "ol" => {
                cursor.close();
                if let Some(kind) = ListKind::of(tree, node) {
                    self.emit_list(node, out, ListContext::fresh(kind, 1));
                }
                cursor.close();
            }
            "table" => {
                cursor.close();
                if let Some(table) = self.build_table(node) {
                    out.push(Block::Table(table));
                }
            }
            "blockquote" => {
                cursor.close();
                self.emit_blockquote(node, out);
            }
            _ if SKIPPED_TAGS.contains(&tag) => {}
            _ => {
                let next = style.enter(tag);
                self.inline_children(node, out, cursor, &next);
            }
        }
    }

    fn inline_text(
        &mut self,
        node: NodeId,
        text: &str,
        out: &mut Vec<Block>,
        cursor: &mut Cursor,
        style: &StyleState,
    ) {
        if is_formatting_whitespace(text) {
            return;
        }
        let mut text = collapse_whitespace(text);
        if !cursor.has_content(out) {
            text = text.trim_start().to_string();
        }
        if text.is_empty() {
            return;
        }

        let ancestors = self.tree.ancestors(node).filter_map(|id| self.tree.tag(id));
        let formatting = style.revalidate(ancestors).run_formatting();
        cursor.push(out, Inline::Run(Run::new(text, formatting)));
    }

    fn inline_paragraph(
        &mut self,
        node: NodeId,
        out: &mut Vec<Block>,
        cursor: &mut Cursor,
        style: &StyleState,
    ) {
        match cursor.scope {
            Scope::Container => {
                cursor.close();
                self.emit_block_paragraph(node, out, cursor, style);
                cursor.close();
            }
            Scope::Paragraph => {
                let style = style.layer_block(&self.declarations(node));
                self.inline_children(node, out, cursor, &style);
            }
        }
    }

    fn inline_span(
        &mut self,
        node: NodeId,
        out: &mut Vec<Block>,
        cursor: &mut Cursor,
        style: &StyleState,
    ) {
        let tree = self.tree;
        let style = style.enter("span").layer(&self.declarations(node));

        if tree.has_class(node, "bookmark") {
            let name = tree.attr(node, "name").or_else(|| tree.attr(node, "id"));
            let bookmark = name.and_then(|name| self.bookmarks.register(name));
            if let Some(bookmark) = &bookmark {
                cursor.push(out, bookmark.start());
            }
            for &child in tree.children(node) {
                self.inline_node(child, out, cursor, &style);
            }
            if let Some(bookmark) = bookmark {
                cursor.push(out, bookmark.end());
            }
            return;
        }

        if tree.has_class(node, "anchor") {
            if let Some(bookmark) = self.bookmark_for(node) {
                cursor.push(out, bookmark.start());
                cursor.push(out, bookmark.end());
            }
            for &child in tree.children(node) {
                self.inline_node(child, out, cursor, &style);
            }
            return;
        }

        self.inline_children(node, out, cursor, &style);
    }

    /// Write the children of an inline element, inside a bookmark named
    /// by its `id` when it has one
    fn inline_children(
        &mut self,
        node: NodeId,
        out: &mut Vec<Block>,
        cursor: &mut Cursor,
        style: &StyleState,
    ) {
        let tree = self.tree;
        let bookmark = self.bookmark_for(node);
        if let Some(bookmark) = &bookmark {
            cursor.push(out, bookmark.start());
        }
        for &child in tree.children(node) {
            self.inline_node(child, out, cursor, style);
        }
        if let Some(bookmark) = bookmark {
            cursor.push(out, bookmark.end());
        }
    }

    fn inline_link(
        &mut self,
        node: NodeId,
        out: &mut Vec<Block>,
        cursor: &mut Cursor,
        style: &StyleState,
    ) {
        let text = collapse_whitespace(&self.tree.text_content(node));
        let text = text.trim();

        let bookmark = self.bookmark_for(node);
        if let Some(bookmark) = &bookmark {
            cursor.push(out, bookmark.start());
        }
        match resolve_link(self.tree, node, &self.bookmarks) {
            Some(target) => {
                let runs = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Run::new(text, self.hyperlink_formatting())]
                };
                cursor.push(out, Inline::Hyperlink { target, runs });
            }
            None if !text.is_empty() => {
                debug!("link {text:?} has no target; writing plain text");
                cursor.push(out, Inline::Run(Run::new(text, style.run_formatting())));
            }
            None => {}
        }
        if let Some(bookmark) = bookmark {
            cursor.push(out, bookmark.end());
        }
    }

    fn inline_image(&mut self, node: NodeId, out: &mut Vec<Block>, cursor: &mut Cursor) {
        if !self.config.embed_images {
            debug!("image embedding disabled; skipping <img>");
            return;
        }

        let src = self.tree.attr(node, "src").unwrap_or_default();
        let inline = match load_image(
            src,
            self.fetcher,
            self.config.image_max_width,
            self.config.image_max_height,
        ) {
            Ok(image) => Inline::Image(image),
            Err(err) => {
                warn!("skipping image: {err}");
                Inline::ImageError(err)
            }
        };
        cursor.push(out, inline);
    }
}
