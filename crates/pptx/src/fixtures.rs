//! Small in-memory PPTX packages for tests.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

pub const ORIGINAL_IMAGE_BYTES: &[u8] = b"\x89PNG original";
pub const LOGO_BYTES: &[u8] = b"\x89PNG replacement logo";

const NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn content_types(slides: &[usize]) -> String {
    let overrides: String = slides
        .iter()
        .map(|n| {
            format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                n
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>{}<Override PartName="/ppt/notesSlides/notesSlide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml"/></Types>"#,
        overrides
    )
}

fn root_rels() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#,
        REL_BASE
    )
}

/// Presentation listing `slides` (part numbers) in the given order.
fn presentation(slides: &[usize]) -> (String, String) {
    let ids: String = slides
        .iter()
        .enumerate()
        .map(|(i, n)| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, n + 1))
        .collect();
    let presentation = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#,
        NAMESPACES, ids
    );

    let slide_rels: String = slides
        .iter()
        .map(|n| {
            format!(
                r#"<Relationship Id="rId{}" Type="{}/slide" Target="slides/slide{}.xml"/>"#,
                n + 1,
                REL_BASE,
                n
            )
        })
        .collect();
    let rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}/slideMaster" Target="slideMasters/slideMaster1.xml"/>{}</Relationships>"#,
        REL_BASE, slide_rels
    );

    (presentation, rels)
}

fn text_box(id: u32, name: &str, runs: &[&str]) -> String {
    let runs: String = runs
        .iter()
        .map(|t| format!(r#"<a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r>"#, t))
        .collect();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="100"/><a:ext cx="3000000" cy="500000"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p>{runs}<a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#,
        id = id,
        name = name,
        x = id * 1000,
        runs = runs
    )
}

fn placeholder(id: u32, name: &str, ph: &str, text: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        id, name, ph, text
    )
}

/// The prototype slide: title and body placeholders, three token text
/// boxes and one picture.
pub fn prototype_slide() -> String {
    let shapes = [
        placeholder(2, "Title 1", r#"<p:ph type="title"/>"#, "Click to add title"),
        placeholder(3, "Content Placeholder 2", r#"<p:ph type="body" idx="1"/>"#, "Click to add text"),
        text_box(4, "TextBox 3", &["{SECTION TITLE}"]),
        text_box(5, "TextBox 4", &["Head: ", "{HEAD}"]),
        text_box(6, "TextBox 5", &["{STEPS}"]),
        r#"<p:pic><p:nvPicPr><p:cNvPr id="7" name="Picture 6" descr="old logo"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"><a:alphaModFix amt="50000"/></a:blip><a:srcRect l="1000"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="914400" y="457200"/><a:ext cx="1828800" cy="914400"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#.to_string(),
    ]
    .concat();

    slide_with_shapes(&shapes)
}

fn slide_with_shapes(shapes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        NAMESPACES, shapes
    )
}

fn slide_rels(with_notes: bool) -> String {
    let notes = if with_notes {
        format!(
            r#"<Relationship Id="rId3" Type="{}/notesSlide" Target="../notesSlides/notesSlide1.xml"/>"#,
            REL_BASE
        )
    } else {
        String::new()
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{base}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="{base}/image" Target="../media/image1.png"/>{notes}</Relationships>"#,
        base = REL_BASE,
        notes = notes
    )
}

fn build(parts: Vec<(String, Vec<u8>)>) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in parts {
        zip.start_file(name, FileOptions::default()).unwrap();
        zip.write_all(&data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// A one-slide template whose slide has a notes page.
pub fn template() -> Vec<u8> {
    let (presentation, presentation_rels) = presentation(&[1]);
    build(vec![
        ("[Content_Types].xml".into(), content_types(&[1]).into_bytes()),
        ("_rels/.rels".into(), root_rels().into_bytes()),
        ("ppt/presentation.xml".into(), presentation.into_bytes()),
        ("ppt/_rels/presentation.xml.rels".into(), presentation_rels.into_bytes()),
        ("ppt/slides/slide1.xml".into(), prototype_slide().into_bytes()),
        ("ppt/slides/_rels/slide1.xml.rels".into(), slide_rels(true).into_bytes()),
        ("ppt/media/image1.png".into(), ORIGINAL_IMAGE_BYTES.to_vec()),
        (
            "ppt/notesSlides/notesSlide1.xml".into(),
            format!(r#"<p:notes {}><p:cSld><p:spTree/></p:cSld></p:notes>"#, NAMESPACES).into_bytes(),
        ),
    ])
}

/// A template listing slide2.xml before slide1.xml.
pub fn two_slide_template() -> Vec<u8> {
    let (presentation, presentation_rels) = presentation(&[2, 1]);
    build(vec![
        ("[Content_Types].xml".into(), content_types(&[1, 2]).into_bytes()),
        ("_rels/.rels".into(), root_rels().into_bytes()),
        ("ppt/presentation.xml".into(), presentation.into_bytes()),
        ("ppt/_rels/presentation.xml.rels".into(), presentation_rels.into_bytes()),
        ("ppt/slides/slide1.xml".into(), prototype_slide().into_bytes()),
        ("ppt/slides/_rels/slide1.xml.rels".into(), slide_rels(false).into_bytes()),
        (
            "ppt/slides/slide2.xml".into(),
            slide_with_shapes(&text_box(2, "TextBox 1", &["Cover"])).into_bytes(),
        ),
        ("ppt/media/image1.png".into(), ORIGINAL_IMAGE_BYTES.to_vec()),
    ])
}
