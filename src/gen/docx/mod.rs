mod package;

pub use package::{to_docx, ExportError};

use std::{borrow::Cow, fmt::Write, ops::Deref};

use log::warn;
use quick_xml::escape::escape;
use smart_default::SmartDefault;

use crate::{
    data::{Block, Document, Run, TableBlock},
    table::MalformedTable,
};

use super::{OutputGenerator, RenderError, Res};

const NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// WordprocessingML body generator
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
pub struct WordXml {
    /// Hex RGB of alert paragraphs and placeholders
    #[default("C00000".to_owned())]
    pub alert_color: String,
    /// Left indent of bullet paragraphs, in twentieths of a point
    #[default = 360]
    pub bullet_indent: u32,
}

/// `Char` production of XML 1.0
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{d7ff}' | '\u{e000}'..='\u{fffd}' | '\u{10000}'..)
}

/// Drops characters no XML document may contain, borrowing when there are none
fn xml_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        warn!("Dropping characters XML cannot hold from {text:?}");
        Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct RunStyle<'a> {
    bold: bool,
    italic: bool,
    color: Option<&'a str>,
}

impl WordXml {
    fn write_run<W: Write + ?Sized>(&self, output: &mut W, text: &str, style: RunStyle) -> Res {
        output.write_str("<w:r>")?;
        if style.bold || style.italic || style.color.is_some() {
            output.write_str("<w:rPr>")?;
            if style.bold {
                output.write_str("<w:b/>")?;
            }
            if style.italic {
                output.write_str("<w:i/>")?;
            }
            if let Some(color) = style.color {
                write!(output, "<w:color w:val=\"{color}\"/>")?;
            }
            output.write_str("</w:rPr>")?;
        }
        write!(
            output,
            "<w:t xml:space=\"preserve\">{}</w:t></w:r>",
            escape(&*xml_chars(text))
        )?;
        Ok(())
    }

    fn write_styled_paragraph<W: Write + ?Sized>(
        &self,
        output: &mut W,
        style: &str,
        centered: bool,
        text: &str,
    ) -> Res {
        write!(output, "<w:p><w:pPr><w:pStyle w:val=\"{style}\"/>")?;
        if centered {
            output.write_str("<w:jc w:val=\"center\"/>")?;
        }
        output.write_str("</w:pPr>")?;
        self.write_run(output, text, RunStyle::default())?;
        output.write_str("</w:p>\n")?;
        Ok(())
    }

    fn write_paragraph<W: Write + ?Sized>(
        &self,
        output: &mut W,
        runs: &[Run],
        alert: bool,
        bullet: bool,
    ) -> Res {
        output.write_str("<w:p>")?;
        let color = alert.then_some(self.alert_color.as_str());
        if bullet {
            write!(
                output,
                "<w:pPr><w:ind w:left=\"{}\"/></w:pPr>",
                self.bullet_indent
            )?;
            self.write_run(
                output,
                "• ",
                RunStyle {
                    color,
                    ..Default::default()
                },
            )?;
        }
        for run in runs {
            self.write_run(
                output,
                &run.text,
                RunStyle {
                    bold: run.bold,
                    color,
                    ..Default::default()
                },
            )?;
        }
        output.write_str("</w:p>\n")?;
        Ok(())
    }

    fn write_placeholder<W: Write + ?Sized>(&self, output: &mut W, message: &str) -> Res {
        output.write_str("<w:p>")?;
        self.write_run(
            output,
            message,
            RunStyle {
                italic: true,
                color: Some(self.alert_color.as_str()),
                ..Default::default()
            },
        )?;
        output.write_str("</w:p>\n")?;
        Ok(())
    }

    /// Nothing is written when the table is rejected
    fn write_table<W: Write + ?Sized>(&self, output: &mut W, table: &TableBlock) -> Res {
        MalformedTable::check(table.columns)?;

        output.write_str("<w:tbl><w:tblPr><w:tblStyle w:val=\"TableGrid\"/>")?;
        output.write_str("<w:tblW w:w=\"0\" w:type=\"auto\"/></w:tblPr><w:tblGrid>")?;
        for _ in 0..table.columns {
            output.write_str("<w:gridCol/>")?;
        }
        output.write_str("</w:tblGrid>\n")?;
        for (ind, row) in table.rows.iter().enumerate() {
            let style = RunStyle {
                bold: table.header_row && ind == 0,
                ..Default::default()
            };
            output.write_str("<w:tr>")?;
            // rows built by hand may still be ragged
            let cells = row
                .iter()
                .map(Deref::deref)
                .chain(std::iter::repeat(""))
                .take(table.columns);
            for cell in cells {
                output.write_str("<w:tc><w:p>")?;
                if !cell.is_empty() {
                    self.write_run(output, cell, style)?;
                }
                output.write_str("</w:p></w:tc>")?;
            }
            output.write_str("</w:tr>\n")?;
        }
        output.write_str("</w:tbl>\n")?;
        Ok(())
    }

    /// Writes the complete `word/document.xml` part
    pub fn write_document<W: Write + ?Sized>(&self, output: &mut W, document: &Document) -> Res {
        write!(
            output,
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <w:document xmlns:w=\"{NAMESPACE}\"><w:body>\n"
        )?;
        self.write_blocks_to(output, &document.blocks)?;
        let page = &document.page;
        write!(
            output,
            "<w:sectPr><w:pgSz w:w=\"{}\" w:h=\"{}\"/>\
             <w:pgMar w:top=\"{margin}\" w:right=\"{margin}\" w:bottom=\"{margin}\" w:left=\"{margin}\" \
             w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/></w:sectPr>\n\
             </w:body></w:document>\n",
            page.width,
            page.height,
            margin = page.margin
        )?;
        Ok(())
    }

    /// Renders the whole document into a string
    pub fn document_xml(&self, document: &Document) -> Result<String, RenderError> {
        let mut buf = String::new();
        self.write_document(&mut buf, document)?;
        Ok(buf)
    }
}

impl<'source> OutputGenerator<'source> for WordXml {
    fn write_to<'block, W: Write + ?Sized>(&self, output: &mut W, block: &'block Block<'source>) -> Res
    where
        'source: 'block,
    {
        match block {
            Block::Title { text } => self.write_styled_paragraph(output, "Title", true, text)?,
            Block::Heading { level, text } => {
                let level = (*level).clamp(1, 6);
                self.write_styled_paragraph(output, &format!("Heading{level}"), false, text)?;
            }
            Block::Paragraph {
                runs,
                alert,
                bullet,
            } => self.write_paragraph(output, runs, *alert, *bullet)?,
            Block::Table(table) => match self.write_table(output, table) {
                Err(RenderError::Table(err)) => {
                    warn!("Table could not be rendered: {err}");
                    self.write_placeholder(output, &err.placeholder())?;
                }
                other => other?,
            },
            Block::Placeholder { message } => self.write_placeholder(output, message)?,
        }
        Ok(())
    }
}
