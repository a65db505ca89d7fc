mod docx;

pub use docx::{to_docx, ExportError, WordXml};

use std::fmt::Write;

use itertools::Itertools;

use crate::{data::Block, table::MalformedTable};

#[derive(Debug, derive_more::From, thiserror::Error)]
pub enum RenderError {
    #[error("{}", .0)]
    Fmt(std::fmt::Error),
    #[error("{}", .0)]
    Table(MalformedTable),
}

pub type Res = Result<(), RenderError>;

pub trait OutputGenerator<'source> {
    fn write_to<'block, W: Write + ?Sized>(&self, output: &mut W, block: &'block Block<'source>) -> Res
    where
        'source: 'block;

    fn write_blocks_to<'block, W: Write + ?Sized>(
        &self,
        output: &mut W,
        blocks: impl IntoIterator<Item = &'block Block<'source>>,
    ) -> Res
    where
        'source: 'block,
    {
        blocks
            .into_iter()
            .map(|block| self.write_to(output, block))
            .try_collect()
    }
}
