use std::borrow::Cow;

use log::{debug, warn};
use smart_default::SmartDefault;

use crate::{
    data::{Block, Document, LineKind, PageSetup, TableBlock, Tx},
    lexer::classify,
    meta::ReportMetadata,
    table::TableAccumulator,
    util::contains_warning_glyph,
};

/// Fixed parts of every generated document
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
pub struct AssemblerConfig {
    #[default("國小試卷審題報告".to_owned())]
    pub title: String,
    #[default("試卷資訊".to_owned())]
    pub exam_label: String,
    #[default("命題教師".to_owned())]
    pub setter_label: String,
    #[default("審題教師".to_owned())]
    pub reviewer_label: String,
    #[default("產出日期".to_owned())]
    pub date_label: String,
    #[default("分析模型".to_owned())]
    pub model_label: String,
    /// Model the report was generated with
    #[default("Gemini 1.5 Flash".to_owned())]
    pub model: String,
    pub page: PageSetup,
}

/// Builds structured documents out of raw report text
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    config: AssemblerConfig,
}

impl Assembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    /// Title and identification table every document opens with
    fn header<'source>(&self, metadata: &ReportMetadata) -> [Block<'source>; 2] {
        let config = &self.config;
        let row = |label: &str, value: &str| -> Vec<Tx<'source>> {
            vec![Cow::Owned(label.to_owned()), Cow::Owned(value.to_owned())]
        };
        [
            Block::Title {
                text: Cow::Owned(config.title.clone()),
            },
            Block::Table(TableBlock {
                columns: 2,
                rows: vec![
                    row(&config.exam_label, &metadata.display),
                    // left blank for handwritten signatures
                    row(&config.setter_label, ""),
                    row(&config.reviewer_label, ""),
                    row(&config.date_label, metadata.generated_date()),
                    row(&config.model_label, &config.model),
                ],
                header_row: false,
            }),
        ]
    }

    /// Converts report text into a document, one line at a time
    ///
    /// Never fails: a table that cannot be built turns into a placeholder block, and the rest of
    /// the report is still assembled.
    pub fn assemble<'source>(
        &self,
        text: &'source str,
        metadata: &ReportMetadata,
    ) -> Document<'source> {
        let mut blocks = Vec::from(self.header(metadata));
        let mut table = TableAccumulator::new();

        for line in text.lines().map(str::trim) {
            if line.is_empty() {
                continue;
            }
            match classify(line) {
                LineKind::TableRow(cells) => table.feed(cells),
                // alignment row, table stays open
                LineKind::TableSeparator => {}
                LineKind::Heading { level, text } => {
                    flush_table(&mut table, &mut blocks);
                    blocks.push(Block::Heading { level, text });
                }
                LineKind::Paragraph { runs, bullet } => {
                    flush_table(&mut table, &mut blocks);
                    blocks.push(Block::Paragraph {
                        runs,
                        alert: contains_warning_glyph(line),
                        bullet,
                    });
                }
            }
        }
        flush_table(&mut table, &mut blocks);

        debug!("Assembled document with {} blocks", blocks.len());
        Document {
            page: self.config.page.clone(),
            blocks,
        }
    }
}

fn flush_table<'source>(table: &mut TableAccumulator<'source>, blocks: &mut Vec<Block<'source>>) {
    match table.flush() {
        None => {}
        Some(Ok(table)) => blocks.push(Block::Table(table)),
        Some(Err(err)) => {
            warn!("Replacing table with a placeholder: {err}");
            blocks.push(Block::Placeholder {
                message: err.placeholder(),
            });
        }
    }
}
