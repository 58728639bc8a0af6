//! HTML to document conversion
//!
//! [`Converter`] runs the anchor pre-passes over the parsed tree, then walks
//! the body once with a [`ConversionSession`] that owns every piece of
//! per-document state (bookmark ids, numbering instances, the list tail).
//! Nothing is shared between conversions.

pub mod anchor;
pub mod image;
pub mod list;
pub mod style;
pub mod table;
pub mod walker;

use log::{debug, info};

use crate::config::ConverterConfig;
use crate::document::models::{
    Block, Document, Inline, NumberingId, NumberingInstance, Paragraph, ParagraphKind, Run,
    RunFormatting,
};
use crate::document::numbering::FIRST_NUMBERING_ID;
use crate::document::writer::DocxWriter;
use crate::error::{ConvertError, Result};
use crate::html::{NodeId, ParseTree, rewrite_jump_links, truncate_long_anchor_ids};
use anchor::{Bookmark, BookmarkRegistry};
use image::{ImageFetcher, OfflineFetcher};
use list::{ListKind, ListTail};
use style::{StyleDeclarations, StyleState, parse_styles};

/// Converts HTML strings into documents and `.docx` bytes
pub struct Converter {
    config: ConverterConfig,
    fetcher: Box<dyn ImageFetcher>,
}

impl Converter {
    /// Converter with no network access for images
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            fetcher: Box::new(OfflineFetcher),
        }
    }

    pub fn with_fetcher(mut self, fetcher: impl ImageFetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Convert `html` into the document model
    pub fn convert(&self, html: &str) -> Result<Document> {
        let mut tree = ParseTree::parse(html)?;

        let rewritten = rewrite_jump_links(&mut tree);
        let truncated = truncate_long_anchor_ids(&mut tree, self.config.max_bookmark_len);
        debug!("pre-pass rewrote {rewritten} jump links and {truncated} long anchors");

        let body = tree.body().ok_or(ConvertError::MissingBody)?;
        let title = tree
            .title()
            .unwrap_or_else(|| self.config.default_title.clone());

        let mut session = ConversionSession::new(&tree, &self.config, self.fetcher.as_ref());
        let mut blocks = vec![Block::Paragraph(Paragraph {
            kind: ParagraphKind::Title,
            inlines: vec![Inline::Run(Run::new(title.clone(), RunFormatting::default()))],
            ..Paragraph::default()
        })];
        session.walk_body(body, &mut blocks);

        info!(
            "converted {title:?}: {} blocks, {} bookmarks, {} lists",
            blocks.len(),
            session.bookmarks.count(),
            session.numberings.len()
        );

        Ok(Document {
            title,
            blocks,
            numberings: session.numberings,
        })
    }

    /// Convert `html` straight to `.docx` bytes
    pub fn to_docx(&self, html: &str) -> Result<Vec<u8>> {
        let document = self.convert(html)?;
        DocxWriter::new(&self.config).write(&document)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}

/// State for one conversion
pub(crate) struct ConversionSession<'a> {
    pub(crate) tree: &'a ParseTree,
    pub(crate) config: &'a ConverterConfig,
    pub(crate) fetcher: &'a dyn ImageFetcher,
    pub(crate) bookmarks: BookmarkRegistry,
    pub(crate) numberings: Vec<NumberingInstance>,
    /// Tail of the last top-level ordered list
    pub(crate) list_tail: Option<ListTail>,
}

impl<'a> ConversionSession<'a> {
    pub(crate) fn new(
        tree: &'a ParseTree,
        config: &'a ConverterConfig,
        fetcher: &'a dyn ImageFetcher,
    ) -> Self {
        Self {
            tree,
            config,
            fetcher,
            bookmarks: BookmarkRegistry::new(config.max_bookmark_len),
            numberings: Vec::new(),
            list_tail: None,
        }
    }

    pub(crate) fn declarations(&self, node: NodeId) -> StyleDeclarations {
        parse_styles(self.tree.attr(node, "style"))
    }

    /// Style state seeded from the node's own `style` attribute
    pub(crate) fn root_style(&self, node: NodeId) -> StyleState {
        StyleState::from_declarations(&self.declarations(node))
    }

    /// Claim a bookmark for the node's `id`, if it has one
    pub(crate) fn bookmark_for(&mut self, node: NodeId) -> Option<Bookmark> {
        let id = self.tree.attr(node, "id")?;
        self.bookmarks.register(id)
    }

    pub(crate) fn hyperlink_formatting(&self) -> RunFormatting {
        RunFormatting {
            underline: true,
            color: Some(self.config.hyperlink_hex()),
            ..RunFormatting::default()
        }
    }

    /// New numbering instance; fresh ordered lists restart at `start` or 1
    pub(crate) fn allocate_numbering(
        &mut self,
        kind: ListKind,
        level: usize,
        start: Option<u32>,
    ) -> NumberingId {
        let id = NumberingId(FIRST_NUMBERING_ID + self.numberings.len());
        let ordered = kind == ListKind::Ordered;
        self.numberings.push(NumberingInstance {
            id,
            ordered,
            level,
            start: ordered.then(|| start.unwrap_or(1)),
        });
        id
    }
}
