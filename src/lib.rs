//! Epub assembler library
//!
//! A Rust library for assembling EPUB 3 eBook packages.
//!
//! This library collects content sections (HTML fragments), assets (CSS,
//! images) and book metadata, synthesizes the structural documents an EPUB
//! requires (the container pointer, the navigation document and the package
//! manifest/spine), and serializes everything into a single ZIP archive
//! with the member layout the format mandates.
//!
//! ## Features
//!
//! - Ordered section and asset registration with fail-fast duplicate detection.
//! - Automatic cover page and table-of-contents synthesis.
//! - Specification-mandated archive layout: an uncompressed `mimetype`
//!   entry first, then content under a fixed content root.
//!
//! ## Quick Start
//!
//! ```rust, no_run
//! # use epub_assembler::{EpubDocument, Section};
//! # fn main() -> Result<(), epub_assembler::error::EpubError> {
//! let mut document = EpubDocument::new("my-book", "Jane Doe", "urn:isbn:1234567890", "books");
//!
//! document.add_section(Section::new(
//!     "chapter1",
//!     "Chapter 1",
//!     "<h1>Chapter 1</h1><p>This is the content of Chapter 1.</p>",
//! ))?;
//!
//! // Write my-book.epub and get its path back
//! let epub_path = document.generate()?;
//! # Ok(())
//! # }
//! ```
//!
//! Validation against the EPUB specification is out of scope; run the
//! generated file through an external checker such as epubcheck when
//! conformance matters.

pub(crate) mod utils;

pub mod document;
pub mod error;
pub mod types;

pub use document::EpubDocument;
pub use types::{Asset, Section};
