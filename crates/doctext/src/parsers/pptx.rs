//! PPTX parser over `zip` and `roxmltree`.
//!
//! Supports: Microsoft PowerPoint (.pptx)

use super::embedded::parse_embedded;
use super::office_metadata::{self, Package};
use crate::content::{ContentHandler, XhtmlEmitter};
use crate::core::io::DocumentStream;
use crate::metadata::{Metadata, keys};
use crate::plugins::{ContentParser, ParseContext, Plugin};
use crate::Result;
use roxmltree::Node;
use std::collections::HashMap;

const P_NAMESPACE: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const A_NAMESPACE: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const R_NAMESPACE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_REL: &str = "/slide";
const NOTES_SLIDE_REL: &str = "/notesSlide";

/// PPTX parser.
///
/// Slides are emitted in presentation order, each as a `div
/// class="slide-content"` followed by its speaker notes in a `div
/// class="slide-notes"` when present. Shape text, tables and grouped shapes
/// are visited in shape-tree order.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PptxParser {
    fn name(&self) -> &str {
        "pptx-parser"
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
        "Extracts slide text, notes and core properties from PowerPoint (PPTX) presentations"
    }
}

impl ContentParser for PptxParser {
    fn supported_mime_types(&self) -> &[&str] {
        &[
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "application/vnd.ms-powerpoint.presentation.macroenabled.12",
            "application/vnd.openxmlformats-officedocument.presentationml.slideshow",
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

        let slide_paths = find_slide_paths(&mut archive)?;
        metadata.set(keys::SLIDE_COUNT, slide_paths.len().to_string());
        office_metadata::read_core_properties(&mut archive, metadata)?;
        office_metadata::read_app_properties(&mut archive, metadata)?;

        let mut xhtml = XhtmlEmitter::new(handler);
        xhtml.start_document()?;

        for slide_path in &slide_paths {
            let Some(xml) = office_metadata::read_entry_string(&mut archive, slide_path)? else {
                tracing::warn!(slide = %slide_path, "slide referenced by presentation is missing");
                continue;
            };
            let doc = roxmltree::Document::parse(&xml)?;
            xhtml.start_element_with("div", &[("class", "slide-content")])?;
            if let Some(tree) = doc.descendants().find(|n| n.has_tag_name((P_NAMESPACE, "spTree"))) {
                emit_shapes(tree, &mut xhtml)?;
            }
            xhtml.end_element("div")?;

            if let Some(notes_path) = notes_path(&mut archive, slide_path)? {
                emit_notes(&mut archive, &notes_path, &mut xhtml)?;
            }
        }

        for entry in office_metadata::entries_under(&archive, "ppt/embeddings/") {
            let data = office_metadata::read_entry_bytes(&mut archive, &entry)?;
            let name = entry.rsplit('/').next().unwrap_or(&entry);
            parse_embedded(&data, name, &mut xhtml, metadata, context)?;
        }

        xhtml.end_document()
    }
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Relationship id to target path, in document order, for relationships whose
/// type ends with `rel_suffix`.
fn read_relationships(
    archive: &mut Package<'_>,
    rels_path: &str,
    base_dir: &str,
    rel_suffix: &str,
) -> Result<Vec<(String, String)>> {
    let Some(xml) = office_metadata::read_entry_string(archive, rels_path)? else {
        return Ok(Vec::new());
    };
    let doc = roxmltree::Document::parse(&xml)?;
    Ok(doc
        .descendants()
        .filter(|n| n.has_tag_name("Relationship"))
        .filter(|n| n.attribute("Type").is_some_and(|t| t.ends_with(rel_suffix)))
        .filter_map(|n| Some((n.attribute("Id")?.to_string(), resolve_target(base_dir, n.attribute("Target")?))))
        .collect())
}

/// Slide part paths in presentation order.
///
/// The order comes from `sldIdLst` in `ppt/presentation.xml`, falling back to
/// relationship order, and finally to the numeric order of `ppt/slides/slideN.xml`.
fn find_slide_paths(archive: &mut Package<'_>) -> Result<Vec<String>> {
    let relationships = read_relationships(archive, PRESENTATION_RELS, "ppt", SLIDE_REL)?;

    if !relationships.is_empty() {
        if let Some(xml) = office_metadata::read_entry_string(archive, PRESENTATION_PART)? {
            let doc = roxmltree::Document::parse(&xml)?;
            let targets: HashMap<&str, &str> = relationships.iter().map(|(id, t)| (id.as_str(), t.as_str())).collect();
            let ordered: Vec<String> = doc
                .descendants()
                .filter(|n| n.has_tag_name((P_NAMESPACE, "sldId")))
                .filter_map(|n| n.attribute((R_NAMESPACE, "id")))
                .filter_map(|id| targets.get(id).map(|t| t.to_string()))
                .collect();
            if !ordered.is_empty() {
                return Ok(ordered);
            }
        }
        return Ok(relationships.into_iter().map(|(_, target)| target).collect());
    }

    let mut numbered: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name.strip_prefix("ppt/slides/slide")?.strip_suffix(".xml")?.parse().ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    numbered.sort();
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

fn notes_path(archive: &mut Package<'_>, slide_path: &str) -> Result<Option<String>> {
    let (dir, file) = slide_path.rsplit_once('/').unwrap_or(("", slide_path));
    let rels_path = format!("{}/_rels/{}.rels", dir, file);
    let notes = read_relationships(archive, &rels_path, dir, NOTES_SLIDE_REL)?;
    Ok(notes.into_iter().next().map(|(_, target)| target))
}

fn emit_notes(archive: &mut Package<'_>, notes_path: &str, xhtml: &mut XhtmlEmitter<'_>) -> Result<()> {
    let Some(xml) = office_metadata::read_entry_string(archive, notes_path)? else {
        return Ok(());
    };
    let doc = roxmltree::Document::parse(&xml)?;

    // Only the body placeholder carries the notes; the rest is the slide image.
    let body_shapes = doc.descendants().filter(|n| n.has_tag_name((P_NAMESPACE, "sp"))).filter(|sp| {
        sp.descendants()
            .find(|n| n.has_tag_name((P_NAMESPACE, "ph")))
            .is_some_and(|ph| ph.attribute("type") == Some("body"))
    });

    let mut started = false;
    for shape in body_shapes {
        if !started {
            xhtml.start_element_with("div", &[("class", "slide-notes")])?;
            started = true;
        }
        emit_text_body(shape, xhtml)?;
    }
    if started {
        xhtml.end_element("div")?;
    }
    Ok(())
}

/// Visit the shape tree in order.
fn emit_shapes(tree: Node<'_, '_>, xhtml: &mut XhtmlEmitter<'_>) -> Result<()> {
    for shape in tree.children().filter(Node::is_element) {
        if shape.tag_name().namespace() != Some(P_NAMESPACE) {
            continue;
        }
        match shape.tag_name().name() {
            "sp" => emit_text_body(shape, xhtml)?,
            "grpSp" => emit_shapes(shape, xhtml)?,
            "graphicFrame" => {
                if let Some(table) = shape.descendants().find(|n| n.has_tag_name((A_NAMESPACE, "tbl"))) {
                    emit_table(table, xhtml)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn emit_text_body(shape: Node<'_, '_>, xhtml: &mut XhtmlEmitter<'_>) -> Result<()> {
    let Some(body) = shape.children().find(|n| n.has_tag_name((P_NAMESPACE, "txBody"))) else {
        return Ok(());
    };
    emit_paragraphs(body, xhtml)
}

fn emit_paragraphs(body: Node<'_, '_>, xhtml: &mut XhtmlEmitter<'_>) -> Result<()> {
    for paragraph in body.children().filter(|n| n.has_tag_name((A_NAMESPACE, "p"))) {
        let mut text = String::new();
        for node in paragraph.descendants().filter(Node::is_element) {
            match node.tag_name().name() {
                "t" => text.push_str(node.text().unwrap_or_default()),
                "br" => text.push('\n'),
                _ => {}
            }
        }
        if !text.is_empty() {
            xhtml.element("p", &text)?;
        }
    }
    Ok(())
}

fn emit_table(table: Node<'_, '_>, xhtml: &mut XhtmlEmitter<'_>) -> Result<()> {
    xhtml.start_element("table")?;
    for row in table.children().filter(|n| n.has_tag_name((A_NAMESPACE, "tr"))) {
        xhtml.start_element("tr")?;
        for cell in row.children().filter(|n| n.has_tag_name((A_NAMESPACE, "tc"))) {
            xhtml.start_element("td")?;
            if let Some(body) = cell.children().find(|n| n.has_tag_name((A_NAMESPACE, "txBody"))) {
                emit_paragraphs(body, xhtml)?;
            }
            xhtml.end_element("td")?;
        }
        xhtml.end_element("tr")?;
    }
    xhtml.end_element("table")
}
