//! OPC package plumbing: ZIP parts, relationships and content types.

use crate::xml::{self, XmlElement, XmlNode};
use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};
use stepdeck_core::{Error, Result};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Part holding the content type table.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Package-level relationships part.
pub const ROOT_RELS_PART: &str = "_rels/.rels";

/// Relationship type suffixes (matched with `ends_with` so both the
/// transitional and strict namespaces work).
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str = "/officeDocument";
    pub const SLIDE: &str = "/slide";
    pub const NOTES_SLIDE: &str = "/notesSlide";
    pub const IMAGE: &str = "/image";

    /// Full transitional image relationship type.
    pub const IMAGE_URI: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
}

/// Content type of a slide part.
pub const SLIDE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// All parts of a package, keyed by part name (no leading slash).
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    /// Read every file entry of a ZIP archive.
    pub fn read<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            parts.insert(name, data);
        }

        Ok(Self { parts })
    }

    /// Write all parts as a deflated ZIP, content types first.
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let ordered = self
            .parts
            .get_key_value(CONTENT_TYPES_PART)
            .into_iter()
            .chain(self.parts.iter().filter(|(name, _)| *name != CONTENT_TYPES_PART));

        for (name, data) in ordered {
            zip.start_file(name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(data)?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// Read a part that must exist as UTF-8 text.
    pub fn part_str(&self, name: &str) -> Result<String> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::PackageError(format!("Part '{}' not found", name)))?;
        String::from_utf8(data.to_vec())
            .map_err(|e| Error::PackageError(format!("Part '{}' is not UTF-8: {}", name, e)))
    }

    /// Parse a part that must exist as XML.
    pub fn part_xml(&self, name: &str) -> Result<XmlElement> {
        xml::parse(&self.part_str(name)?)
    }

    pub fn set_part(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.parts.insert(name.into(), data);
    }

    /// Serialize an XML tree into a part.
    pub fn set_part_xml(&mut self, name: impl Into<String>, root: &XmlElement) -> Result<()> {
        self.set_part(name, xml::serialize(root)?.into_bytes());
        Ok(())
    }

    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        self.parts.remove(name)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }
}

/// Relationships part name for a part: `ppt/slides/slide1.xml` →
/// `ppt/slides/_rels/slide1.xml.rels`.
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Part owning a relationships part: `ppt/slides/_rels/slide1.xml.rels` →
/// `ppt/slides/slide1.xml`. The package-level `_rels/.rels` maps to `""`.
pub fn source_part_for(rels_part: &str) -> String {
    let (dir, file) = rels_part.rsplit_once('/').unwrap_or(("", rels_part));
    let dir = dir.strip_suffix("_rels").unwrap_or(dir).trim_end_matches('/');
    let file = file.strip_suffix(".rels").unwrap_or(file);
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

fn directory_of(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against the part that owns it.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None if directory_of(source_part).is_empty() => target.to_string(),
        None => format!("{}/{}", directory_of(source_part), target),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Relative target from `source_part` to `target_part`.
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let from: Vec<&str> = directory_of(source_part)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let to: Vec<&str> = target_part.split('/').collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count()
        .min(to.len().saturating_sub(1));

    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend(&to[common..]);
    parts.join("/")
}

/// One relationship entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Whether the type ends with the given suffix (see [`rel_types`]).
    pub fn is_type(&self, suffix: &str) -> bool {
        self.rel_type.ends_with(suffix)
    }
}

/// The relationships of one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` document.
    pub fn parse(xml_text: &str) -> Result<Self> {
        let root = xml::parse(xml_text)?;
        let items = root
            .elements()
            .filter(|e| e.local_name() == "Relationship")
            .map(|e| Relationship {
                id: e.attr("Id").unwrap_or_default().to_string(),
                rel_type: e.attr("Type").unwrap_or_default().to_string(),
                target: e.attr("Target").unwrap_or_default().to_string(),
                external: e.attr("TargetMode") == Some("External"),
            })
            .collect();
        Ok(Self { items })
    }

    /// Load the relationships of a part; a missing `.rels` part means none.
    pub fn load(package: &Package, part: &str) -> Result<Self> {
        let rels_part = rels_part_for(part);
        if package.contains(&rels_part) {
            Self::parse(&package.part_str(&rels_part)?)
        } else {
            Ok(Self::new())
        }
    }

    /// Build the `.rels` document.
    pub fn to_xml(&self) -> XmlElement {
        let mut root = XmlElement::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS);
        for rel in &self.items {
            let mut el = XmlElement::new("Relationship")
                .with_attr("Id", &rel.id)
                .with_attr("Type", &rel.rel_type)
                .with_attr("Target", &rel.target);
            if rel.external {
                el.set_attr("TargetMode", "External");
            }
            root.children.push(XmlNode::Element(el));
        }
        root
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Relationship> {
        self.items.iter_mut()
    }

    /// First relationship of the given type suffix.
    pub fn find_type(&self, suffix: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.is_type(suffix))
    }

    /// Add an internal relationship with a fresh `rIdN` id and return the id.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let next = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{}", next);
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        });
        id
    }

    /// Remove a relationship by id.
    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let pos = self.items.iter().position(|r| r.id == id)?;
        Some(self.items.remove(pos))
    }

    pub fn retain(&mut self, keep: impl FnMut(&Relationship) -> bool) {
        self.items.retain(keep);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The `[Content_Types].xml` table.
#[derive(Debug, Clone)]
pub struct ContentTypes {
    root: XmlElement,
}

impl ContentTypes {
    pub fn load(package: &Package) -> Result<Self> {
        Ok(Self {
            root: package.part_xml(CONTENT_TYPES_PART)?,
        })
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Content type override for a part name (without leading slash).
    pub fn override_for(&self, part: &str) -> Option<&str> {
        let part_name = format!("/{}", part);
        self.root
            .elements()
            .find(|e| {
                e.local_name() == "Override" && e.attr("PartName") == Some(part_name.as_str())
            })
            .and_then(|e| e.attr("ContentType"))
    }

    pub fn add_override(&mut self, part: &str, content_type: &str) {
        self.remove_override(part);
        let el = XmlElement::new("Override")
            .with_attr("PartName", &format!("/{}", part))
            .with_attr("ContentType", content_type);
        self.root.children.push(XmlNode::Element(el));
    }

    pub fn remove_override(&mut self, part: &str) {
        let part_name = format!("/{}", part);
        self.root.children.retain(|c| match c {
            XmlNode::Element(e) => {
                !(e.local_name() == "Override" && e.attr("PartName") == Some(part_name.as_str()))
            }
            XmlNode::Text(_) => true,
        });
    }

    /// Register a default content type for an extension unless one exists.
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        let exists = self.root.elements().any(|e| {
            e.local_name() == "Default"
                && e.attr("Extension")
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        });
        if !exists {
            let el = XmlElement::new("Default")
                .with_attr("Extension", extension)
                .with_attr("ContentType", content_type);
            self.root.children.insert(0, XmlNode::Element(el));
        }
    }
}

/// Content type for an image file extension.
pub fn image_content_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "application/octet-stream",
    }
}
