//! Turning a pipeline result into something a doctor can keep.

mod docx;
mod download;
mod normalize;

pub use docx::{DOCUMENT_HEADING, DocxError, generate_docx};
pub use download::{DOCX_FILENAME, DOCX_MIME, download_link};
pub use normalize::normalize;

#[cfg(test)]
pub(crate) use docx::read_paragraphs;
