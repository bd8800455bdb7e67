//! PPTX template deck implementing [`DeckEngine`].

use crate::package::{
    image_content_type, rel_types, relative_target, rels_part_for, resolve_target,
    source_part_for, ContentTypes, Package, Relationships, CONTENT_TYPES_PART, ROOT_RELS_PART,
    SLIDE_CONTENT_TYPE,
};
use crate::xml::{XmlElement, XmlNode};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use stepdeck_core::{
    DeckEngine, Error, Geometry, ImageData, PlaceholderKind, Result, ShapeId, ShapeInfo,
    ShapeKind, SlideId,
};

/// Fallback location of the main presentation part.
const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Lowest valid `p:sldId/@id`.
const MIN_SLIDE_ID: u32 = 256;

/// A slide held in memory as an XML tree plus its relationships.
#[derive(Debug, Clone)]
struct SlideEntry {
    /// Part name, e.g. `ppt/slides/slide3.xml`.
    part: String,
    /// Relationship id from the presentation part.
    rel_id: String,
    doc: XmlElement,
    rels: Relationships,
}

/// An editable PPTX deck.
///
/// Slides, the presentation part, its relationships and the content types
/// are kept as trees while editing and written back on save.
#[derive(Debug)]
pub struct PptxDeck {
    package: Package,
    content_types: ContentTypes,
    presentation_part: String,
    presentation: XmlElement,
    presentation_rels: Relationships,
    slides: BTreeMap<usize, SlideEntry>,
    order: Vec<usize>,
    next_handle: usize,
    /// Embedded replacement images: bytes and media part name.
    media: Vec<(Vec<u8>, String)>,
}

impl PptxDeck {
    /// Open a template deck from disk.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingResource {
                kind: "PowerPoint template",
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a deck from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let package = Package::read(reader)?;
        let content_types = ContentTypes::load(&package)?;
        let presentation_part = find_presentation_part(&package)?;
        let presentation = package.part_xml(&presentation_part)?;
        let presentation_rels = Relationships::load(&package, &presentation_part)?;

        let mut entries = Vec::new();
        for rel_id in slide_rel_ids(&presentation) {
            let rel = presentation_rels.get(&rel_id).ok_or_else(|| {
                Error::PackageError(format!("Slide relationship '{}' not found", rel_id))
            })?;
            let part = resolve_target(&presentation_part, &rel.target);
            let doc = package.part_xml(&part)?;
            let rels = Relationships::load(&package, &part)?;
            entries.push(SlideEntry {
                part,
                rel_id,
                doc,
                rels,
            });
        }

        let mut deck = Self {
            package,
            content_types,
            presentation_part,
            presentation,
            presentation_rels,
            slides: BTreeMap::new(),
            order: Vec::new(),
            next_handle: 0,
            media: Vec::new(),
        };
        for entry in entries {
            deck.insert_slide(entry);
        }

        log::debug!("Loaded deck with {} slides", deck.order.len());
        Ok(deck)
    }

    /// Part name of a slide.
    pub fn slide_part(&self, slide: SlideId) -> Result<&str> {
        Ok(&self.entry(slide)?.part)
    }

    /// Text of every run on a slide, in document order.
    pub fn slide_texts(&self, slide: SlideId) -> Result<Vec<String>> {
        let tree = shape_tree(&self.entry(slide)?.doc)?;
        let texts = tree
            .elements()
            .filter(|e| e.local_name() == "sp")
            .filter_map(|sp| sp.child("txBody"))
            .flat_map(|body| body.elements().filter(|e| e.local_name() == "p"))
            .flat_map(|p| p.elements().filter(|e| e.local_name() == "r"))
            .filter_map(|r| r.child("t"))
            .map(XmlElement::text)
            .collect();
        Ok(texts)
    }

    /// Serialize the deck into PPTX bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.sync_parts()?;
        let mut cursor = Cursor::new(Vec::new());
        self.package.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write the deck to disk. Nothing is written if serialization fails.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        log::info!("Saved {} slides to {}", self.order.len(), path.display());
        Ok(())
    }

    fn insert_slide(&mut self, entry: SlideEntry) -> SlideId {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.slides.insert(handle, entry);
        self.order.push(handle);
        SlideId(handle)
    }

    fn entry(&self, slide: SlideId) -> Result<&SlideEntry> {
        self.slides.get(&slide.0).ok_or(Error::UnknownSlide(slide.0))
    }

    fn entry_mut(&mut self, slide: SlideId) -> Result<&mut SlideEntry> {
        self.slides
            .get_mut(&slide.0)
            .ok_or(Error::UnknownSlide(slide.0))
    }

    /// Next free number for a `ppt/slides/slideN.xml` part.
    fn next_slide_number(&self) -> usize {
        self.package
            .part_names()
            .chain(self.slides.values().map(|s| s.part.as_str()))
            .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
            .filter_map(extract_slide_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Add a `p:sldId` for `rel_id`, modelled on the prototype's entry.
    fn append_slide_id(&mut self, source_rel_id: &str, rel_id: &str) -> Result<()> {
        let list = self
            .presentation
            .child_mut("sldIdLst")
            .ok_or_else(|| Error::PackageError("Presentation has no slide list".to_string()))?;

        let next_id = list
            .elements()
            .filter_map(|e| e.attr("id"))
            .filter_map(|v| v.parse::<u32>().ok())
            .max()
            .map_or(MIN_SLIDE_ID, |max| (max + 1).max(MIN_SLIDE_ID));

        let mut slide_id = list
            .elements()
            .find(|e| e.prefixed_attr("id") == Some(source_rel_id))
            .cloned()
            .ok_or_else(|| {
                Error::PackageError(format!("No slide list entry for '{}'", source_rel_id))
            })?;
        slide_id.set_attr("id", &next_id.to_string());
        slide_id.set_prefixed_attr("id", "r:id", rel_id);
        list.children.push(XmlNode::Element(slide_id));
        Ok(())
    }

    /// Whether any relationship still held by the deck points at `part`.
    ///
    /// Slides are checked in memory; every other `.rels` part is read from
    /// the package.
    fn part_in_use(&self, part: &str) -> Result<bool> {
        let targets = |source: &str, rels: &Relationships| {
            rels.iter()
                .any(|r| !r.external && resolve_target(source, &r.target) == part)
        };

        if self.slides.values().any(|s| targets(&s.part, &s.rels)) {
            return Ok(true);
        }

        let slide_rels: Vec<String> = self
            .slides
            .values()
            .map(|s| rels_part_for(&s.part))
            .collect();
        for rels_part in self
            .package
            .part_names()
            .filter(|name| name.ends_with(".rels") && !slide_rels.iter().any(|s| s == *name))
        {
            let rels = Relationships::parse(&self.package.part_str(rels_part)?)?;
            if targets(&source_part_for(rels_part), &rels) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Drop a part, its relationships part and its content type override.
    fn drop_part(&mut self, part: &str) {
        self.package.remove_part(part);
        self.package.remove_part(&rels_part_for(part));
        self.content_types.remove_override(part);
    }

    /// Media part holding `image`, embedding it on first use.
    fn media_part(&mut self, image: &ImageData) -> String {
        if let Some((_, part)) = self.media.iter().find(|(bytes, _)| *bytes == image.bytes) {
            return part.clone();
        }

        let ext = image.extension().unwrap_or_else(|| "png".to_string());
        self.content_types
            .ensure_default(&ext, image_content_type(&ext));

        let mut n = 1;
        let part = loop {
            let candidate = format!("ppt/media/image{}.{}", n, ext);
            if !self.package.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };

        log::debug!("Embedding '{}' as {}", image.file_name, part);
        self.package.set_part(part.clone(), image.bytes.clone());
        self.media.push((image.bytes.clone(), part.clone()));
        part
    }

    /// Write every tree held in memory back into the package.
    fn sync_parts(&mut self) -> Result<()> {
        for entry in self.slides.values() {
            self.package.set_part_xml(entry.part.clone(), &entry.doc)?;
            let rels_part = rels_part_for(&entry.part);
            if entry.rels.is_empty() {
                self.package.remove_part(&rels_part);
            } else {
                self.package.set_part_xml(rels_part, &entry.rels.to_xml())?;
            }
        }

        self.package
            .set_part_xml(self.presentation_part.clone(), &self.presentation)?;
        self.package.set_part_xml(
            rels_part_for(&self.presentation_part),
            &self.presentation_rels.to_xml(),
        )?;
        self.package
            .set_part_xml(CONTENT_TYPES_PART, self.content_types.root())?;
        Ok(())
    }
}

impl DeckEngine for PptxDeck {
    fn slides(&self) -> Vec<SlideId> {
        self.order.iter().copied().map(SlideId).collect()
    }

    fn duplicate_slide(&mut self, prototype: SlideId) -> Result<SlideId> {
        let source = self.entry(prototype)?;
        let part = format!("ppt/slides/slide{}.xml", self.next_slide_number());

        let mut rels = source.rels.clone();
        rels.retain(|r| !r.is_type(rel_types::NOTES_SLIDE));
        for rel in rels.iter_mut().filter(|r| !r.external) {
            rel.target = relative_target(&part, &resolve_target(&source.part, &rel.target));
        }
        let doc = source.doc.clone();
        let source_part = source.part.clone();
        let source_rel_id = source.rel_id.clone();

        let rel_type = self
            .presentation_rels
            .get(&source_rel_id)
            .map(|r| r.rel_type.clone())
            .ok_or_else(|| {
                Error::PackageError(format!("Slide relationship '{}' not found", source_rel_id))
            })?;
        let content_type = self
            .content_types
            .override_for(&source_part)
            .unwrap_or(SLIDE_CONTENT_TYPE)
            .to_string();

        self.content_types.add_override(&part, &content_type);
        let target = relative_target(&self.presentation_part, &part);
        let rel_id = self.presentation_rels.add(&rel_type, &target);
        self.append_slide_id(&source_rel_id, &rel_id)?;

        log::debug!("Duplicated {} as {}", source_part, part);
        Ok(self.insert_slide(SlideEntry {
            part,
            rel_id,
            doc,
            rels,
        }))
    }

    fn remove_slide(&mut self, slide: SlideId) -> Result<()> {
        let entry = self
            .slides
            .remove(&slide.0)
            .ok_or(Error::UnknownSlide(slide.0))?;
        self.order.retain(|&handle| handle != slide.0);

        self.presentation_rels.remove(&entry.rel_id);
        if let Some(list) = self.presentation.child_mut("sldIdLst") {
            list.children.retain(|c| match c {
                XmlNode::Element(e) => e.prefixed_attr("id") != Some(entry.rel_id.as_str()),
                XmlNode::Text(_) => true,
            });
        }

        self.drop_part(&entry.part);
        for rel in entry
            .rels
            .iter()
            .filter(|r| r.is_type(rel_types::NOTES_SLIDE) && !r.external)
        {
            self.drop_part(&resolve_target(&entry.part, &rel.target));
        }

        let images: Vec<String> = entry
            .rels
            .iter()
            .filter(|r| r.is_type(rel_types::IMAGE) && !r.external)
            .map(|r| resolve_target(&entry.part, &r.target))
            .collect();
        for image in images {
            if self.package.contains(&image) && !self.part_in_use(&image)? {
                log::debug!("Dropping unreferenced media {}", image);
                self.drop_part(&image);
                self.media.retain(|(_, part)| *part != image);
            }
        }

        log::debug!("Removed slide {}", entry.part);
        Ok(())
    }

    fn shapes(&self, slide: SlideId) -> Result<Vec<ShapeInfo>> {
        let tree = shape_tree(&self.entry(slide)?.doc)?;
        Ok(tree.elements().filter_map(shape_info).collect())
    }

    fn remove_shape(&mut self, slide: SlideId, shape: ShapeId) -> Result<()> {
        let tree = shape_tree_mut(&mut self.entry_mut(slide)?.doc)?;
        let pos = tree
            .children
            .iter()
            .position(|c| match c {
                XmlNode::Element(e) => shape_info(e).is_some_and(|info| info.id == shape),
                XmlNode::Text(_) => false,
            })
            .ok_or(Error::UnknownShape {
                slide: slide.0,
                shape: shape.0,
            })?;
        tree.children.remove(pos);
        Ok(())
    }

    fn rewrite_text_runs(
        &mut self,
        slide: SlideId,
        rewrite: &mut dyn FnMut(&str) -> Option<String>,
    ) -> Result<usize> {
        let tree = shape_tree_mut(&mut self.entry_mut(slide)?.doc)?;
        let mut count = 0;

        for sp in tree.elements_mut().filter(|e| e.local_name() == "sp") {
            let Some(body) = sp.child_mut("txBody") else {
                continue;
            };
            for paragraph in body.elements_mut().filter(|e| e.local_name() == "p") {
                for run in paragraph.elements_mut().filter(|e| e.local_name() == "r") {
                    let Some(t) = run.child_mut("t") else {
                        continue;
                    };
                    if let Some(new_text) = rewrite(t.text().as_str()) {
                        t.set_text(new_text);
                        count += 1;
                    }
                }
            }
        }

        Ok(count)
    }

    fn replace_picture(
        &mut self,
        slide: SlideId,
        shape: ShapeId,
        image: &ImageData,
    ) -> Result<()> {
        self.entry(slide)?;
        let media_part = self.media_part(image);
        let entry = self.entry_mut(slide)?;
        let target = relative_target(&entry.part, &media_part);

        let tree = shape_tree_mut(&mut entry.doc)?;
        let pic = tree
            .elements_mut()
            .find(|e| {
                e.local_name() == "pic" && shape_info(e).is_some_and(|info| info.id == shape)
            })
            .ok_or(Error::UnknownShape {
                slide: slide.0,
                shape: shape.0,
            })?;

        if let Some(c_nv_pr) = pic.find_mut(&["nvPicPr", "cNvPr"]) {
            c_nv_pr.attributes.retain(|(k, _)| k != "descr");
        }

        let blip_fill = pic
            .child_mut("blipFill")
            .ok_or_else(|| Error::PackageError("Picture has no blipFill".to_string()))?;
        blip_fill.remove_children("srcRect");
        let blip = blip_fill
            .child_mut("blip")
            .ok_or_else(|| Error::PackageError("Picture has no blip".to_string()))?;

        let previous = blip.prefixed_attr("embed").map(str::to_string);
        let rel_id = entry.rels.add(rel_types::IMAGE_URI, &target);
        blip.set_prefixed_attr("embed", "r:embed", &rel_id);
        blip.remove_prefixed_attr("link");
        blip.children.clear();

        if let Some(previous) = previous {
            if !references_rel(&entry.doc, &previous) {
                entry.rels.remove(&previous);
            }
        }

        Ok(())
    }
}

/// Locate the main presentation part through the package relationships.
fn find_presentation_part(package: &Package) -> Result<String> {
    if !package.contains(ROOT_RELS_PART) {
        return Ok(DEFAULT_PRESENTATION_PART.to_string());
    }
    let rels = Relationships::parse(&package.part_str(ROOT_RELS_PART)?)?;
    Ok(rels
        .find_type(rel_types::OFFICE_DOCUMENT)
        .map(|r| resolve_target("", &r.target))
        .unwrap_or_else(|| DEFAULT_PRESENTATION_PART.to_string()))
}

/// Relationship ids of the slides, in `p:sldIdLst` order.
fn slide_rel_ids(presentation: &XmlElement) -> Vec<String> {
    presentation
        .child("sldIdLst")
        .map(|list| {
            list.elements()
                .filter(|e| e.local_name() == "sldId")
                .filter_map(|e| e.prefixed_attr("id"))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Whether any element below `element` refers to relationship `rel_id`
/// through a prefixed attribute (`r:embed`, `r:link`, `r:id`).
fn references_rel(element: &XmlElement, rel_id: &str) -> bool {
    element
        .attributes
        .iter()
        .any(|(k, v)| k.contains(':') && !k.starts_with("xmlns") && v == rel_id)
        || element.elements().any(|e| references_rel(e, rel_id))
}

fn shape_tree(doc: &XmlElement) -> Result<&XmlElement> {
    doc.find(&["cSld", "spTree"])
        .ok_or_else(|| Error::PackageError("Slide has no shape tree".to_string()))
}

fn shape_tree_mut(doc: &mut XmlElement) -> Result<&mut XmlElement> {
    doc.find_mut(&["cSld", "spTree"])
        .ok_or_else(|| Error::PackageError("Slide has no shape tree".to_string()))
}

/// Describe a shape-tree child; `None` for non-shape elements.
fn shape_info(element: &XmlElement) -> Option<ShapeInfo> {
    let kind = match element.local_name() {
        "sp" => ShapeKind::TextFrame,
        "pic" => ShapeKind::Picture,
        "grpSp" => ShapeKind::Group,
        "graphicFrame" | "cxnSp" | "contentPart" => ShapeKind::Other,
        _ => return None,
    };

    let non_visual = element
        .elements()
        .find(|e| e.local_name().starts_with("nv"))?;
    let c_nv_pr = non_visual.child("cNvPr")?;
    let id = c_nv_pr.attr("id")?.parse().ok()?;

    Some(ShapeInfo {
        id: ShapeId(id),
        name: c_nv_pr.attr("name").unwrap_or_default().to_string(),
        kind,
        placeholder: non_visual
            .find(&["nvPr", "ph"])
            .map(|ph| placeholder_kind(ph.attr("type"))),
        has_text: element.child("txBody").is_some(),
        geometry: shape_geometry(element),
    })
}

fn placeholder_kind(ph_type: Option<&str>) -> PlaceholderKind {
    match ph_type {
        None | Some("obj") => PlaceholderKind::Object,
        Some("title") => PlaceholderKind::Title,
        Some("body") => PlaceholderKind::Body,
        Some("ctrTitle") => PlaceholderKind::CenterTitle,
        Some("subTitle") => PlaceholderKind::Subtitle,
        Some(other) => PlaceholderKind::Other(other.to_string()),
    }
}

fn shape_geometry(element: &XmlElement) -> Option<Geometry> {
    let xfrm = element
        .find(&["spPr", "xfrm"])
        .or_else(|| element.find(&["grpSpPr", "xfrm"]))
        .or_else(|| element.child("xfrm"))?;
    let off = xfrm.child("off")?;
    let ext = xfrm.child("ext")?;
    Some(Geometry {
        x: emu(off, "x")?,
        y: emu(off, "y")?,
        cx: emu(ext, "cx")?,
        cy: emu(ext, "cy")?,
    })
}

fn emu(element: &XmlElement, name: &str) -> Option<i64> {
    element.attr(name)?.parse().ok()
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
