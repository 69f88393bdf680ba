//! DOCX parser over `zip` and `roxmltree`.
//!
//! Supports: Microsoft Word (.docx)
//!
//! Walks the main document part in reading order. Paragraphs become `p`
//! (or `h1`..`h6` for heading styles), tables become `table`/`tr`/`td`, and
//! content controls are unwrapped. Files under `word/embeddings/` are
//! dispatched as embedded documents.

use super::embedded::parse_embedded;
use super::office_metadata::{self, Package};
use crate::content::{ContentHandler, XhtmlEmitter};
use crate::core::io::DocumentStream;
use crate::metadata::Metadata;
use crate::plugins::{ContentParser, ParseContext, Plugin};
use crate::{DoctextError, Result};
use roxmltree::Node;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const DEFAULT_MAIN_PART: &str = "word/document.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

/// Elements inside a paragraph whose text is not part of the document body.
const SKIPPED_RUN_CONTENT: &[&str] = &[
    "pPr",
    "rPr",
    "instrText",
    "delText",
    "txbxContent",
    "Fallback",
    "footnoteReference",
    "endnoteReference",
];

/// DOCX parser.
pub struct DocxParser;

impl DocxParser {
    /// Create a new DOCX parser.
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for DocxParser {
    fn name(&self) -> &str {
        "docx-parser"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        "Extracts text and core properties from Word (DOCX) documents"
    }
}

impl ContentParser for DocxParser {
    fn supported_mime_types(&self) -> &[&str] {
        &[
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/vnd.ms-word.document.macroenabled.12",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.template",
        ]
    }

    fn parse(
        &self,
        input: &mut DocumentStream<'_>,
        handler: &mut dyn ContentHandler,
        metadata: &mut Metadata,
        context: &ParseContext,
    ) -> Result<()> {
        let bytes = input.read_remaining()?;
        let mut archive = office_metadata::open_package(&bytes)?;

        let main_part = main_document_part(&mut archive)?;
        let Some(xml) = office_metadata::read_entry_string(&mut archive, &main_part)? else {
            return Err(DoctextError::malformed_input(format!(
                "DOCX package is missing its main document part {}",
                main_part
            )));
        };
        let doc = roxmltree::Document::parse(&xml)?;

        office_metadata::read_core_properties(&mut archive, metadata)?;
        office_metadata::read_app_properties(&mut archive, metadata)?;

        let mut xhtml = XhtmlEmitter::new(handler);
        xhtml.start_document()?;

        if let Some(body) = doc.root_element().children().find(|n| n.has_tag_name((W_NS, "body"))) {
            emit_blocks(body, &mut xhtml)?;
        }

        for entry in office_metadata::entries_under(&archive, "word/embeddings/") {
            let data = office_metadata::read_entry_bytes(&mut archive, &entry)?;
            let name = entry.rsplit('/').next().unwrap_or(&entry);
            parse_embedded(&data, name, &mut xhtml, metadata, context)?;
        }

        xhtml.end_document()
    }
}

/// Locate the main document part through the package relationships.
fn main_document_part(archive: &mut Package<'_>) -> Result<String> {
    let Some(rels) = office_metadata::read_entry_string(archive, "_rels/.rels")? else {
        return Ok(DEFAULT_MAIN_PART.to_string());
    };
    let doc = roxmltree::Document::parse(&rels)?;
    let target = doc
        .descendants()
        .filter(|n| n.has_tag_name("Relationship"))
        .find(|n| n.attribute("Type").is_some_and(|t| t.ends_with(OFFICE_DOCUMENT_REL)))
        .and_then(|n| n.attribute("Target"))
        .map(|t| t.trim_start_matches('/').to_string());
    Ok(target.unwrap_or_else(|| DEFAULT_MAIN_PART.to_string()))
}

/// Emit block-level children of `node` in document order.
fn emit_blocks(node: Node<'_, '_>, xhtml: &mut XhtmlEmitter<'_>) -> Result<()> {
    for child in node.children().filter(Node::is_element) {
        if child.tag_name().namespace() != Some(W_NS) {
            continue;
        }
        match child.tag_name().name() {
            "p" => emit_paragraph(child, xhtml)?,
            "tbl" => emit_table(child, xhtml)?,
            "sdt" => {
                if let Some(content) = child.children().find(|n| n.has_tag_name((W_NS, "sdtContent"))) {
                    emit_blocks(content, xhtml)?;
                }
            }
            "customXml" | "ins" | "smartTag" => emit_blocks(child, xhtml)?,
            _ => {}
        }
    }
    Ok(())
}

fn emit_table(table: Node<'_, '_>, xhtml: &mut XhtmlEmitter<'_>) -> Result<()> {
    xhtml.start_element("table")?;
    for row in table.children().filter(|n| n.has_tag_name((W_NS, "tr"))) {
        xhtml.start_element("tr")?;
        for cell in row.children().filter(|n| n.has_tag_name((W_NS, "tc"))) {
            xhtml.start_element("td")?;
            emit_blocks(cell, xhtml)?;
            xhtml.end_element("td")?;
        }
        xhtml.end_element("tr")?;
    }
    xhtml.end_element("table")
}

fn emit_paragraph(paragraph: Node<'_, '_>, xhtml: &mut XhtmlEmitter<'_>) -> Result<()> {
    let mut text = String::new();
    collect_run_text(paragraph, &mut text);
    xhtml.element(paragraph_element(paragraph), &text)
}

/// `h1`..`h6` for heading and title styles, `p` otherwise.
fn paragraph_element(paragraph: Node<'_, '_>) -> &'static str {
    const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

    let style = paragraph
        .children()
        .find(|n| n.has_tag_name((W_NS, "pPr")))
        .and_then(|ppr| ppr.children().find(|n| n.has_tag_name((W_NS, "pStyle"))))
        .and_then(|style| style.attribute((W_NS, "val")));

    match style {
        Some("Title") => "h1",
        Some(style) => style
            .strip_prefix("Heading")
            .and_then(|level| level.parse::<usize>().ok())
            .and_then(|level| HEADINGS.get(level.wrapping_sub(1)))
            .copied()
            .unwrap_or("p"),
        None => "p",
    }
}

fn collect_run_text(node: Node<'_, '_>, text: &mut String) {
    for child in node.children().filter(Node::is_element) {
        let name = child.tag_name().name();
        if SKIPPED_RUN_CONTENT.contains(&name) {
            continue;
        }
        match name {
            "t" => text.push_str(child.text().unwrap_or_default()),
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            "noBreakHyphen" => text.push('-'),
            _ => collect_run_text(child, text),
        }
    }
}
