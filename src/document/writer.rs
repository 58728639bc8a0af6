//! `.docx` output
//!
//! Maps the document model onto `docx-rs` builders, packs the archive and
//! then stamps the document title into `docProps/core.xml`, which `docx-rs`
//! leaves empty.

use docx_rs::{
    AlignmentType, BreakType, Docx, Hyperlink, HyperlinkType, IndentLevel, PageMargin, Pic,
    Shading, SpecialIndentType, TableRow, WidthType,
};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::models::{
    Block, Document, Inline, LinkTarget, Paragraph, ParagraphKind, Run, Table, TableCell,
    TextAlignment,
};
use super::numbering::{HANGING_INDENT, add_numberings};
use super::styles::{HYPERLINK_STYLE, initialize_styles, paragraph_style_id};
use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};

/// Archive entry holding the core document properties
pub const CORE_PROPS_PATH: &str = "docProps/core.xml";

/// US Letter page width in twips
const PAGE_WIDTH: i32 = 12240;

/// English Metric Units per pixel at 96 dpi
const EMU_PER_PIXEL: u32 = 9525;

static TITLE_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<dc:title\s*/>|<dc:title>.*?</dc:title>").unwrap());

/// Serialises a [`Document`] into `.docx` bytes
pub struct DocxWriter<'a> {
    config: &'a ConverterConfig,
}

impl<'a> DocxWriter<'a> {
    pub fn new(config: &'a ConverterConfig) -> Self {
        Self { config }
    }

    pub fn write(&self, document: &Document) -> Result<Vec<u8>> {
        let margin = self.config.margin_twips();
        let mut docx = Docx::new().page_margin(
            PageMargin::new()
                .top(margin)
                .bottom(margin)
                .left(margin)
                .right(margin),
        );
        docx = initialize_styles(docx, &self.config.hyperlink_hex());
        docx = add_numberings(
            docx,
            &document.numberings,
            self.config.list_indent_twips(1),
        );

        for block in &document.blocks {
            docx = match block {
                Block::Paragraph(para) => docx.add_paragraph(self.build_paragraph(para)),
                Block::Table(table) => docx.add_table(self.build_table(table, self.text_width())),
            };
        }

        let mut packed = Vec::new();
        docx.build()
            .pack(&mut Cursor::new(&mut packed))
            .map_err(|e| ConvertError::Package(e.to_string()))?;
        debug!("packed {} bytes", packed.len());

        set_core_title(&packed, &document.title)
    }

    fn text_width(&self) -> usize {
        (PAGE_WIDTH - 2 * self.config.margin_twips()).max(0) as usize
    }

    fn build_paragraph(&self, para: &Paragraph) -> docx_rs::Paragraph {
        let mut paragraph = docx_rs::Paragraph::new();

        if let Some(style) = paragraph_style_id(&para.kind) {
            paragraph = paragraph.style(&style);
        }
        if let ParagraphKind::ListItem { numbering, level } = para.kind {
            paragraph = paragraph.numbering(
                docx_rs::NumberingId::new(numbering.0),
                IndentLevel::new(level),
            );
        }
        if let Some(left) = para.indent_left {
            let hanging = matches!(para.kind, ParagraphKind::ListItem { .. })
                .then_some(SpecialIndentType::Hanging(HANGING_INDENT));
            paragraph = paragraph.indent(Some(left), hanging, None, None);
        }
        if let Some(alignment) = para.alignment {
            paragraph = paragraph.align(map_alignment(alignment));
        }

        let mut pending: Vec<Run> = Vec::new();
        for inline in &para.inlines {
            if let Inline::Run(run) = inline {
                pending.push(run.clone());
                continue;
            }
            for run in Run::consolidate_runs(std::mem::take(&mut pending)) {
                paragraph = paragraph.add_run(build_run(&run));
            }

            paragraph = match inline {
                Inline::Run(_) => paragraph,
                Inline::Break => {
                    paragraph.add_run(docx_rs::Run::new().add_break(BreakType::TextWrapping))
                }
                Inline::BookmarkStart { id, name } => paragraph.add_bookmark_start(*id, name),
                Inline::BookmarkEnd { id } => paragraph.add_bookmark_end(*id),
                Inline::Hyperlink { target, runs } => {
                    let mut link = match target {
                        LinkTarget::Internal(name) => Hyperlink::new(name, HyperlinkType::Anchor),
                        LinkTarget::External(url) => Hyperlink::new(url, HyperlinkType::External),
                    };
                    for run in runs {
                        link = link.add_run(build_run(run).style(HYPERLINK_STYLE));
                    }
                    paragraph.add_hyperlink(link)
                }
                Inline::Image(image) => {
                    let pic = Pic::new(&image.bytes)
                        .size(image.width * EMU_PER_PIXEL, image.height * EMU_PER_PIXEL);
                    paragraph.add_run(docx_rs::Run::new().add_image(pic))
                }
                Inline::ImageError(err) => paragraph.add_run(
                    docx_rs::Run::new()
                        .add_text(err.message())
                        .bold()
                        .italic(),
                ),
            };
        }
        for run in Run::consolidate_runs(pending) {
            paragraph = paragraph.add_run(build_run(&run));
        }

        paragraph
    }

    fn build_table(&self, table: &Table, width: usize) -> docx_rs::Table {
        let columns = table.columns.max(1);
        let column_width = width / columns;

        let rows = table
            .rows
            .iter()
            .map(|cells| {
                let cells = cells
                    .iter()
                    .map(|cell| self.build_cell(cell, column_width))
                    .collect();
                TableRow::new(cells)
            })
            .collect();

        docx_rs::Table::new(rows).set_grid(vec![column_width; columns])
    }

    fn build_cell(&self, cell: &TableCell, width: usize) -> docx_rs::TableCell {
        let mut table_cell = docx_rs::TableCell::new().width(width, WidthType::Dxa);
        for block in &cell.blocks {
            table_cell = match block {
                Block::Paragraph(para) => table_cell.add_paragraph(self.build_paragraph(para)),
                Block::Table(nested) => table_cell.add_table(self.build_table(nested, width)),
            };
        }

        // a cell must end with a paragraph
        if !matches!(cell.blocks.last(), Some(Block::Paragraph(_))) {
            table_cell = table_cell.add_paragraph(docx_rs::Paragraph::new());
        }
        table_cell
    }
}

fn map_alignment(alignment: TextAlignment) -> AlignmentType {
    match alignment {
        TextAlignment::Left => AlignmentType::Left,
        TextAlignment::Center => AlignmentType::Center,
        TextAlignment::Right => AlignmentType::Right,
        TextAlignment::Justify => AlignmentType::Both,
    }
}

fn build_run(run: &Run) -> docx_rs::Run {
    let formatting = &run.formatting;
    let mut docx_run = docx_rs::Run::new().add_text(&run.text);

    if formatting.bold {
        docx_run = docx_run.bold();
    }
    if formatting.italic {
        docx_run = docx_run.italic();
    }
    if formatting.underline {
        docx_run = docx_run.underline("single");
    }
    if formatting.highlight {
        docx_run = docx_run.highlight("yellow");
    }
    if let Some(color) = &formatting.color {
        docx_run = docx_run.color(color);
    }
    if let Some(fill) = &formatting.background {
        docx_run = docx_run.shading(Shading::new().fill(fill));
    }
    docx_run
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// `core.xml` with its `dc:title` set to `title`
pub(crate) fn with_title(core_xml: &str, title: &str) -> String {
    let element = format!("<dc:title>{}</dc:title>", escape_xml(title));
    if TITLE_ELEMENT.is_match(core_xml) {
        return TITLE_ELEMENT
            .replace(core_xml, regex::NoExpand(&element))
            .into_owned();
    }
    match core_xml.rfind("</cp:coreProperties>") {
        Some(at) => format!("{}{element}{}", &core_xml[..at], &core_xml[at..]),
        None => {
            warn!("core properties have no root element; title not set");
            core_xml.to_string()
        }
    }
}

/// Rewrite a packed archive with the title stamped into its core properties
///
/// Entries are copied in their original order.
pub fn set_core_title(packed: &[u8], title: &str) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(packed))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        if entry.is_dir() {
            writer.add_directory(name, options)?;
            continue;
        }

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        if name == CORE_PROPS_PATH {
            contents = with_title(&String::from_utf8_lossy(&contents), title).into_bytes();
        }

        writer.start_file(name, options)?;
        writer.write_all(&contents)?;
    }

    Ok(writer.finish()?.into_inner())
}
