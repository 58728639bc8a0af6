//! Document model and `.docx` emission
//!
//! The converter builds a [`Document`]; [`writer::DocxWriter`] turns it
//! into a WordprocessingML package.

pub mod models;
pub(crate) mod numbering;
pub mod styles;
pub mod writer;

pub use models::*;
pub use writer::{DocxWriter, set_core_title};
