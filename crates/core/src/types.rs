//! Domain types shared by the cleaner, the formatter and deck engines.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Column holding the section label, e.g. `"2. Wire Prep"`.
pub const SECTION_COLUMN: &str = "SECTION";

/// Column holding the step text, e.g. `"S1 (Cut) Cut the wire"`.
pub const STEPS_COLUMN: &str = "STEPS";

/// One data row of the step sheet, keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// (column, value) pairs in header order.
    fields: Vec<(String, String)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from (column, value) pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new();
        for (column, value) in pairs {
            row.insert(column, value);
        }
        row
    }

    /// Set a column value, replacing an existing one with the same name.
    fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == column) {
            Some(field) => field.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Look up a column value.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a column value that must be present.
    pub fn require(&self, column: &str) -> Result<&str> {
        self.get(column)
            .ok_or_else(|| Error::MissingColumn(column.to_string()))
    }

    /// The `SECTION` field.
    pub fn section(&self) -> Result<&str> {
        self.require(SECTION_COLUMN)
    }

    /// The `STEPS` field.
    pub fn steps(&self) -> Result<&str> {
        self.require(STEPS_COLUMN)
    }
}

/// Marker substrings in template text that receive computed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placeholder {
    /// `{SECTION TITLE}`
    SectionTitle,
    /// `{HEAD}`
    Head,
    /// `{STEPS}`
    Steps,
}

impl Placeholder {
    /// All placeholders, in the order a text run is checked against them.
    pub const ALL: [Placeholder; 3] = [Self::SectionTitle, Self::Head, Self::Steps];

    /// The literal token as it appears in the template.
    pub fn token(self) -> &'static str {
        match self {
            Self::SectionTitle => "{SECTION TITLE}",
            Self::Head => "{HEAD}",
            Self::Steps => "{STEPS}",
        }
    }
}

/// Opaque handle to a slide inside a deck engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlideId(pub usize);

/// Identifier of a shape, unique within its slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeId(pub u32);

/// Broad category of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// An auto shape or text box; may carry a text frame.
    TextFrame,
    /// A picture.
    Picture,
    /// A group of shapes.
    Group,
    /// Tables, charts, connectors and anything else.
    Other,
}

/// Role of a layout placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceholderKind {
    Title,
    Body,
    CenterTitle,
    Subtitle,
    /// Generic content placeholder (the default role when none is given).
    Object,
    Other(String),
}

/// Position and size of a shape, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// Description of a shape on a slide, as reported by a deck engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeInfo {
    pub id: ShapeId,
    pub name: String,
    pub kind: ShapeKind,
    /// Set when the shape is a layout placeholder.
    pub placeholder: Option<PlaceholderKind>,
    /// Whether the shape owns a text frame.
    pub has_text: bool,
    pub geometry: Option<Geometry>,
}

impl ShapeInfo {
    /// Whether this shape is a picture.
    pub fn is_picture(&self) -> bool {
        self.kind == ShapeKind::Picture
    }

    /// Whether this shape is a placeholder of one of the given kinds.
    pub fn is_placeholder_in(&self, kinds: &[PlaceholderKind]) -> bool {
        self.placeholder
            .as_ref()
            .is_some_and(|kind| kinds.contains(kind))
    }
}

/// Image bytes used to replace pictures on generated slides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// File name the image was loaded from, used for its extension.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageData {
    /// Create image data from a file name and raw bytes.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Load an image from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingResource {
                kind: "Image",
                path: path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}
