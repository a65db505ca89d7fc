//! *審題: reading an exam paper before the kids do.*
//!
//! This crate turns a review report, as written by a text generation model, into two things:
//! a structured [`Document`] that can be exported as a `.docx` file, and a list of display [`Card`]s.
//! Reports are markdown-ish. Headings, pipe tables, bullets and `**bold**` are all there is,
//! so that's all this crate understands.
//!
//! # Ideology
//! Generated text is never trusted to be well-formed. Every line maps to *something*: a heading,
//! a table row or a paragraph. A table that cannot be built turns into a visible placeholder
//! instead of an error, and an unmatched bold marker is just text. Assembly and segmentation have
//! no failure mode at all.
//!
//! Same as everywhere else around here, parsing is zero-copy: blocks and cards borrow from the
//! report text, and are turned owned with [`ToStaticExt`] only when they need to outlive it.
//!
//! Output is written through the [`OutputGenerator`] trait, one block at a time, into anything
//! implementing [`std::fmt::Write`].

mod assemble;
/// This module defines types that are used to represent parsed data
mod data;
mod gen;
mod lexer;
mod meta;
mod prompt;
mod review;
mod segment;
mod table;

pub use assemble::{Assembler, AssemblerConfig};
pub use data::{Block, Card, Document, LineKind, PageSetup, Run, TableBlock, ToStaticExt};
pub use gen::{to_docx, ExportError, OutputGenerator, RenderError, WordXml};
pub use lexer::{classify, resolve_emphasis};
pub use meta::{MetadataDefaults, ReportMetadata, NOT_DETECTED};
pub use prompt::{build_prompt, ReviewParams, Strictness, UnknownStrictness};
pub use review::{AlreadyStored, Generate, GenerationError, Review, ReviewCache, Reviewer};
pub use segment::{Segmenter, SegmenterConfig, SegmenterError};
pub use table::{MalformedTable, TableAccumulator, MAX_COLUMNS};

/// Assembles a document with the default title and page setup
pub fn assemble<'source>(text: &'source str, metadata: &ReportMetadata) -> Document<'source> {
    Assembler::default().assemble(text, metadata)
}

/// Segments a report on the default `Step N` / action-plan markers
pub fn segment(text: &str) -> Vec<Card<'_>> {
    Segmenter::default().segment(text)
}

/// This module houses "utility-like" structs and functions.
mod util;
