//! Numbering definitions for list paragraphs
//!
//! Every [`NumberingInstance`] gets its own abstract numbering, so a fresh
//! list restarts on its own while a continued list, which shares the
//! instance of the list it continues, keeps counting.

use docx_rs::{
    AbstractNumbering, Docx, Level, LevelJc, LevelText, NumberFormat, Numbering, SpecialIndentType,
    Start,
};

use super::models::NumberingInstance;

/// Levels Word allows in one numbering definition
pub const MAX_LEVELS: usize = 9;

/// Hanging indent for the number or bullet, in twips
pub const HANGING_INDENT: i32 = 360;

/// First id handed to a list; docx-rs always writes its own decimal
/// definition under abstract and numbering id 1
pub const FIRST_NUMBERING_ID: usize = 2;

/// Different numbering formats supported by Word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumberingFormat {
    Decimal,     // 1. 2. 3.
    LowerLetter, // a. b. c.
    LowerRoman,  // i. ii. iii.
    Bullet,
}

impl NumberingFormat {
    /// Format used by an ordered list nested `level` deep (0-based)
    pub(crate) fn ordered(level: usize) -> Self {
        match level % 3 {
            0 => NumberingFormat::Decimal,
            1 => NumberingFormat::LowerLetter,
            _ => NumberingFormat::LowerRoman,
        }
    }

    pub(crate) fn word_name(self) -> &'static str {
        match self {
            NumberingFormat::Decimal => "decimal",
            NumberingFormat::LowerLetter => "lowerLetter",
            NumberingFormat::LowerRoman => "lowerRoman",
            NumberingFormat::Bullet => "bullet",
        }
    }

    pub(crate) fn level_text(self, level: usize) -> String {
        match self {
            NumberingFormat::Bullet => match level % 3 {
                0 => "•",
                1 => "○",
                _ => "▪",
            }
            .to_string(),
            _ => format!("%{}.", level + 1),
        }
    }
}

/// Level definition with the list indent the paragraphs also carry
fn create_list_level(level: usize, format: NumberingFormat, start: u32, indent_step: i32) -> Level {
    let indent = indent_step * (level as i32 + 1);
    Level::new(
        level,
        Start::new(start as usize),
        NumberFormat::new(format.word_name()),
        LevelText::new(format.level_text(level)),
        LevelJc::new("left"),
    )
    .indent(
        Some(indent),
        Some(SpecialIndentType::Hanging(HANGING_INDENT)),
        None,
        None,
    )
}

/// Abstract numbering for one list instance
///
/// The instance's own level starts at its `start` value; the other levels
/// start at 1.
pub(crate) fn abstract_numbering(instance: &NumberingInstance, indent_step: i32) -> AbstractNumbering {
    let mut numbering = AbstractNumbering::new(instance.id.0);
    for level in 0..MAX_LEVELS {
        let format = if instance.ordered {
            NumberingFormat::ordered(level)
        } else {
            NumberingFormat::Bullet
        };
        let start = if level == instance.level {
            instance.start.unwrap_or(1)
        } else {
            1
        };
        numbering = numbering.add_level(create_list_level(level, format, start, indent_step));
    }
    numbering
}

/// Register every instance of `instances` with the document
pub(crate) fn add_numberings(mut docx: Docx, instances: &[NumberingInstance], indent_step: i32) -> Docx {
    for instance in instances {
        docx = docx
            .add_abstract_numbering(abstract_numbering(instance, indent_step))
            .add_numbering(Numbering::new(instance.id.0, instance.id.0));
    }
    docx
}
