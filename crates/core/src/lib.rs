//! Core domain types, step formatting rules, CSV cleaning and slide
//! assembly for step-by-step PowerPoint decks.

pub mod assemble;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod rows;
pub mod table;
pub mod types;

pub use assemble::{GenerationReport, SlideAssembler};
pub use config::{CleanerConfig, GeneratorConfig};
pub use engine::DeckEngine;
pub use error::{Error, Result};
pub use format::{FormatState, RowText, SectionMatch};
pub use rows::{read_rows, read_rows_from_path};
pub use table::{clean_file, CleanReport, MissingValues, Table};
pub use types::{
    Geometry, ImageData, Placeholder, PlaceholderKind, Row, ShapeId, ShapeInfo, ShapeKind,
    SlideId,
};
