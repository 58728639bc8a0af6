//! Paragraph and character styles referenced by the writer

use docx_rs::{Docx, Style, StyleType};

use super::models::ParagraphKind;

pub const TITLE_STYLE: &str = "Title";
pub const HYPERLINK_STYLE: &str = "Hyperlink";
pub const LIST_STYLE: &str = "ListParagraph";

/// Heading font sizes in half-points, h1 first
const HEADING_SIZES: [usize; 6] = [32, 26, 24, 22, 20, 20];

/// Style id for a heading level, `Heading1` to `Heading6`
pub fn heading_style_id(level: u8) -> String {
    format!("Heading{}", level.clamp(1, 6))
}

/// Paragraph style for a paragraph kind, if it uses one
pub fn paragraph_style_id(kind: &ParagraphKind) -> Option<String> {
    match kind {
        ParagraphKind::Normal => None,
        ParagraphKind::Title => Some(TITLE_STYLE.to_string()),
        ParagraphKind::Heading(level) => Some(heading_style_id(*level)),
        ParagraphKind::ListItem { .. } => Some(LIST_STYLE.to_string()),
    }
}

/// Register the styles every converted document uses
pub fn initialize_styles(mut docx: Docx, hyperlink_color: &str) -> Docx {
    docx = docx.add_style(
        Style::new(TITLE_STYLE, StyleType::Paragraph)
            .name("Title")
            .size(56),
    );

    for (index, size) in HEADING_SIZES.iter().enumerate() {
        let level = index as u8 + 1;
        let id = heading_style_id(level);
        docx = docx.add_style(
            Style::new(&id, StyleType::Paragraph)
                .name(format!("Heading {level}"))
                .size(*size)
                .bold(),
        );
    }

    docx.add_style(Style::new(LIST_STYLE, StyleType::Paragraph).name("List Paragraph"))
        .add_style(
            Style::new(HYPERLINK_STYLE, StyleType::Character)
                .name("Hyperlink")
                .color(hyperlink_color)
                .underline("single"),
        )
}
