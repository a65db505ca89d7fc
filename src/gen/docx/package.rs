use std::{
    fmt::Write as _,
    io::{Cursor, Write},
};

use log::debug;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{data::Document, gen::RenderError};

use super::{WordXml, NAMESPACE};

#[derive(Debug, derive_more::From, thiserror::Error)]
pub enum ExportError {
    #[error("{}", .0)]
    Render(RenderError),
    #[error("{}", .0)]
    Io(std::io::Error),
    #[error("{}", .0)]
    Zip(zip::result::ZipError),
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>
"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>
"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>
"#;

/// Font sizes of `Heading1..6`, in half-points
const HEADING_SIZES: [u8; 6] = [36, 32, 28, 26, 24, 24];

impl WordXml {
    /// `word/styles.xml`: body font, title, headings and the table grid
    fn styles_xml(&self) -> Result<String, RenderError> {
        let mut buf = String::new();
        write!(
            buf,
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <w:styles xmlns:w=\"{NAMESPACE}\">\n\
             <w:docDefaults><w:rPrDefault><w:rPr>\
             <w:rFonts w:ascii=\"Calibri\" w:hAnsi=\"Calibri\" w:eastAsia=\"Microsoft JhengHei\"/>\
             <w:sz w:val=\"24\"/></w:rPr></w:rPrDefault></w:docDefaults>\n\
             <w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/></w:style>\n\
             <w:style w:type=\"paragraph\" w:styleId=\"Title\"><w:name w:val=\"Title\"/>\
             <w:basedOn w:val=\"Normal\"/><w:rPr><w:b/><w:sz w:val=\"40\"/></w:rPr></w:style>\n"
        )?;
        for (ind, size) in HEADING_SIZES.iter().enumerate() {
            let level = ind + 1;
            write!(
                buf,
                "<w:style w:type=\"paragraph\" w:styleId=\"Heading{level}\">\
                 <w:name w:val=\"heading {level}\"/><w:basedOn w:val=\"Normal\"/>\
                 <w:pPr><w:keepNext/><w:outlineLvl w:val=\"{ind}\"/></w:pPr>\
                 <w:rPr><w:b/><w:sz w:val=\"{size}\"/></w:rPr></w:style>\n"
            )?;
        }
        buf.write_str(
            "<w:style w:type=\"table\" w:styleId=\"TableGrid\"><w:name w:val=\"Table Grid\"/><w:tblPr><w:tblBorders>\
             <w:top w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>\
             <w:left w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>\
             <w:bottom w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>\
             <w:right w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>\
             <w:insideH w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>\
             <w:insideV w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>\
             </w:tblBorders></w:tblPr></w:style>\n</w:styles>\n",
        )?;
        Ok(buf)
    }

    /// Packages the document as a `.docx` archive, in memory
    pub fn to_docx(&self, document: &Document) -> Result<Vec<u8>, ExportError> {
        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES.to_owned()),
            ("_rels/.rels", PACKAGE_RELS.to_owned()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_owned()),
            ("word/styles.xml", self.styles_xml()?),
            ("word/document.xml", self.document_xml(document)?),
        ];

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            zip.start_file(name, options)?;
            zip.write_all(content.as_bytes())?;
        }
        let bytes = zip.finish()?.into_inner();
        debug!(
            "Packaged {} blocks into {} bytes",
            document.blocks.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

/// Packages the document with the default styling
pub fn to_docx(document: &Document) -> Result<Vec<u8>, ExportError> {
    WordXml::default().to_docx(document)
}
