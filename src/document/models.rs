//! Core data structures for the converted document
//!
//! The converter emits this model; the docx writer turns it into
//! WordprocessingML. Keeping the two apart lets the conversion be tested
//! without unpacking archives.

use serde::Serialize;

use crate::convert::image::{FittedImage, ImageError};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    pub title: String,
    pub blocks: Vec<Block>,
    /// Numbering instances referenced by list paragraphs
    pub numberings: Vec<NumberingInstance>,
}

#[derive(Debug, Clone, Serialize)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub enum ParagraphKind {
    #[default]
    Normal,
    /// Level-0 document title
    Title,
    Heading(u8),
    ListItem {
        numbering: NumberingId,
        level: usize,
    },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum TextAlignment {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Paragraph {
    pub kind: ParagraphKind,
    pub alignment: Option<TextAlignment>,
    /// Left indent in twips
    pub indent_left: Option<i32>,
    pub inlines: Vec<Inline>,
}

#[derive(Debug, Clone, Serialize)]
pub enum Inline {
    Run(Run),
    Break,
    BookmarkStart { id: usize, name: String },
    BookmarkEnd { id: usize },
    Hyperlink { target: LinkTarget, runs: Vec<Run> },
    Image(FittedImage),
    ImageError(ImageError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LinkTarget {
    /// Bookmark name inside this document
    Internal(String),
    External(String),
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RunFormatting {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub highlight: bool,
    /// Six uppercase hex digits, no `#`
    pub color: Option<String>,
    pub background: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub formatting: RunFormatting,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct NumberingId(pub usize);

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NumberingInstance {
    pub id: NumberingId,
    pub ordered: bool,
    /// Level the list was opened at (0-based)
    pub level: usize,
    /// Restart value for a fresh ordered list
    pub start: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub columns: usize,
    pub rows: Vec<Vec<TableCell>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TableCell {
    pub blocks: Vec<Block>,
}

impl Run {
    pub fn new(text: impl Into<String>, formatting: RunFormatting) -> Self {
        Self {
            text: text.into(),
            formatting,
        }
    }

    /// Consolidate adjacent runs with identical formatting into single runs
    pub fn consolidate_runs(runs: Vec<Run>) -> Vec<Run> {
        let mut consolidated: Vec<Run> = Vec::with_capacity(runs.len());

        for run in runs {
            match consolidated.last_mut() {
                Some(last) if last.formatting == run.formatting => last.text.push_str(&run.text),
                _ => consolidated.push(run),
            }
        }

        consolidated
    }
}

impl Paragraph {
    pub fn new(kind: ParagraphKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Runs in order, ignoring everything that is not plain text
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.inlines.iter().filter_map(|inline| match inline {
            Inline::Run(run) => Some(run),
            _ => None,
        })
    }

    pub fn text(&self) -> String {
        self.inlines
            .iter()
            .map(|inline| match inline {
                Inline::Run(run) => run.text.clone(),
                Inline::Hyperlink { runs, .. } => runs.iter().map(|r| r.text.as_str()).collect(),
                Inline::Break => "\n".to_string(),
                Inline::ImageError(err) => err.message(),
                _ => String::new(),
            })
            .collect()
    }

    pub fn bookmark_names(&self) -> Vec<&str> {
        self.inlines
            .iter()
            .filter_map(|inline| match inline {
                Inline::BookmarkStart { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn hyperlinks(&self) -> Vec<(&LinkTarget, String)> {
        self.inlines
            .iter()
            .filter_map(|inline| match inline {
                Inline::Hyperlink { target, runs } => {
                    Some((target, runs.iter().map(|r| r.text.as_str()).collect()))
                }
                _ => None,
            })
            .collect()
    }
}

impl Document {
    /// Top-level paragraphs in order, skipping tables
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(para) => Some(para),
            Block::Table(_) => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(table) => Some(table),
            Block::Paragraph(_) => None,
        })
    }

    pub fn numbering(&self, id: NumberingId) -> Option<&NumberingInstance> {
        self.numberings.iter().find(|instance| instance.id == id)
    }
}
