use std::borrow::Cow;

use smart_default::SmartDefault;

pub(crate) type Tx<'source> = Cow<'source, str>;

/// A single piece of paragraph text, either plain or bold.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Run<'source> {
    pub text: Tx<'source>,
    pub bold: bool,
}

impl<'source> Run<'source> {
    pub fn plain(text: impl Into<Tx<'source>>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<Tx<'source>>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// Classification of one trimmed report line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'source> {
    Heading {
        // 1..=6
        level: u8,
        text: Tx<'source>,
    },
    TableRow(Vec<Tx<'source>>),
    /// `|---|:---:|` style row, never part of the table body
    TableSeparator,
    Paragraph {
        runs: Vec<Run<'source>>,
        bullet: bool,
    },
}

/// A table with a fixed column count.
///
/// Every row holds exactly `columns` cells; the accumulator pads or truncates them on the way in.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableBlock<'source> {
    pub columns: usize,
    pub rows: Vec<Vec<Tx<'source>>>,
    /// first row is rendered bold
    pub header_row: bool,
}

impl<'source> TableBlock<'source> {
    pub fn header(&self) -> Option<&[Tx<'source>]> {
        self.header_row
            .then(|| self.rows.first().map(Vec::as_slice))
            .flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Block<'source> {
    /// Centered document title
    Title { text: Tx<'source> },
    Heading { level: u8, text: Tx<'source> },
    Table(TableBlock<'source>),
    Paragraph {
        runs: Vec<Run<'source>>,
        /// paragraph contained a warning glyph, rendered in the alert color
        alert: bool,
        bullet: bool,
    },
    /// Visible stand-in for a block that could not be built or rendered
    Placeholder { message: String },
}

/// Page geometry, in twentieths of a point (the unit WordprocessingML uses)
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PageSetup {
    // A4
    #[default = 11906]
    pub width: u32,
    #[default = 16838]
    pub height: u32,
    // 2 cm
    #[default = 1134]
    pub margin: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Document<'source> {
    pub page: PageSetup,
    pub blocks: Vec<Block<'source>>,
}

/// One on-screen section of a report
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Card<'source> {
    pub text: Tx<'source>,
    pub is_alert: bool,
}

pub trait ToStaticExt {
    type AsStatic;
    fn to_static(&self) -> Self::AsStatic;
}

impl ToStaticExt for Cow<'_, str> {
    type AsStatic = Cow<'static, str>;

    fn to_static(&self) -> Self::AsStatic {
        Cow::Owned(self.to_string())
    }
}

impl ToStaticExt for Run<'_> {
    type AsStatic = Run<'static>;

    fn to_static(&self) -> Self::AsStatic {
        Run {
            text: self.text.to_static(),
            bold: self.bold,
        }
    }
}

impl ToStaticExt for TableBlock<'_> {
    type AsStatic = TableBlock<'static>;

    fn to_static(&self) -> Self::AsStatic {
        TableBlock {
            columns: self.columns,
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(ToStaticExt::to_static).collect())
                .collect(),
            header_row: self.header_row,
        }
    }
}

impl ToStaticExt for Block<'_> {
    type AsStatic = Block<'static>;

    fn to_static(&self) -> Self::AsStatic {
        match self {
            Block::Title { text } => Block::Title {
                text: text.to_static(),
            },
            Block::Heading { level, text } => Block::Heading {
                level: *level,
                text: text.to_static(),
            },
            Block::Table(table) => Block::Table(table.to_static()),
            Block::Paragraph {
                runs,
                alert,
                bullet,
            } => Block::Paragraph {
                runs: runs.iter().map(ToStaticExt::to_static).collect(),
                alert: *alert,
                bullet: *bullet,
            },
            Block::Placeholder { message } => Block::Placeholder {
                message: message.clone(),
            },
        }
    }
}

impl ToStaticExt for Document<'_> {
    type AsStatic = Document<'static>;

    fn to_static(&self) -> Self::AsStatic {
        Document {
            page: self.page.clone(),
            blocks: self.blocks.iter().map(ToStaticExt::to_static).collect(),
        }
    }
}

impl ToStaticExt for Card<'_> {
    type AsStatic = Card<'static>;

    fn to_static(&self) -> Self::AsStatic {
        Card {
            text: self.text.to_static(),
            is_alert: self.is_alert,
        }
    }
}
