//! Shared helpers for Office Open XML packages.
//!
//! Reads package entries and maps `docProps/core.xml` (Dublin Core) and
//! `docProps/app.xml` (application statistics) into [`Metadata`].

use crate::metadata::{Metadata, keys};
use crate::{DoctextError, Result};
use roxmltree::Node;
use std::io::{Cursor, Read};
use zip::ZipArchive;

pub(crate) type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Open an OOXML package held in memory.
pub(crate) fn open_package(bytes: &[u8]) -> Result<Package<'_>> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

/// Read a package entry as UTF-8 text. `None` if the entry does not exist.
pub(crate) fn read_entry_string(archive: &mut Package<'_>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| DoctextError::malformed_input_with_source(format!("Failed to read {}", name), e))?;
    Ok(Some(content))
}

/// Read a package entry as raw bytes.
pub(crate) fn read_entry_bytes(archive: &mut Package<'_>, name: &str) -> Result<Vec<u8>> {
    let mut file = archive.by_name(name)?;
    let mut content = Vec::new();
    file.read_to_end(&mut content)
        .map_err(|e| DoctextError::malformed_input_with_source(format!("Failed to read {}", name), e))?;
    Ok(content)
}

/// Names of the file entries under `prefix`, in archive order.
pub(crate) fn entries_under(archive: &Package<'_>, prefix: &str) -> Vec<String> {
    archive
        .file_names()
        .filter(|name| name.starts_with(prefix) && !name.ends_with('/'))
        .map(String::from)
        .collect()
}

/// Text of the first descendant element with local name `name`.
pub(crate) fn parse_xml_text(node: Node, name: &str) -> Option<String> {
    node.descendants()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Map `docProps/core.xml` into `metadata`.
///
/// The part is optional; a missing part leaves `metadata` unchanged.
///
/// # Errors
///
/// Returns `MalformedInput` if the part exists but is not well-formed XML.
pub(crate) fn read_core_properties(archive: &mut Package<'_>, metadata: &mut Metadata) -> Result<()> {
    let Some(xml) = read_entry_string(archive, "docProps/core.xml")? else {
        return Ok(());
    };
    let doc = roxmltree::Document::parse(&xml)?;
    let root = doc.root_element();

    let fields = [
        ("title", keys::TITLE),
        ("subject", keys::SUBJECT),
        ("creator", keys::CREATOR),
        ("description", keys::DESCRIPTION),
        ("keywords", keys::KEYWORDS),
        ("lastModifiedBy", keys::LAST_AUTHOR),
        ("created", keys::CREATED),
        ("modified", keys::MODIFIED),
        ("language", "dc:language"),
        ("category", "cp:category"),
        ("revision", "cp:revision"),
    ];
    for (tag, key) in fields {
        if let Some(value) = parse_xml_text(root, tag) {
            metadata.set(key, value);
        }
    }
    Ok(())
}

/// Map the application name and company from `docProps/app.xml`.
///
/// A malformed `app.xml` is only logged; it never fails the document.
pub(crate) fn read_app_properties(archive: &mut Package<'_>, metadata: &mut Metadata) -> Result<()> {
    let Some(xml) = read_entry_string(archive, "docProps/app.xml")? else {
        return Ok(());
    };
    let doc = match roxmltree::Document::parse(&xml) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring malformed docProps/app.xml");
            return Ok(());
        }
    };
    let root = doc.root_element();

    if let Some(application) = parse_xml_text(root, "Application") {
        metadata.set("extended-properties:Application", application);
    }
    if let Some(company) = parse_xml_text(root, "Company") {
        metadata.set("extended-properties:Company", company);
    }
    Ok(())
}
