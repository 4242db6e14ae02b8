//! DOCX reading and writing.

mod document;
mod model;
mod package;
mod xml;

pub use document::{Document, MAIN_PART};
pub use model::{Cell, Paragraph, Row, Run, Table};

/// The view of a document the fillers work against.
pub trait DocumentAdapter {
    /// Top-level body paragraphs, excluding those inside tables.
    fn paragraphs(&mut self) -> Vec<Paragraph<'_>>;

    /// Top-level body tables.
    fn tables(&mut self) -> Vec<Table<'_>>;
}
