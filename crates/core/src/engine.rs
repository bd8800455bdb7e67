//! The document-template engine seam.
//!
//! Slide assembly only needs a handful of operations from the underlying
//! document library. Backends (such as the PPTX crate) implement
//! [`DeckEngine`]; the assembly logic never sees the file format.

use crate::error::Result;
use crate::types::{ImageData, ShapeId, ShapeInfo, SlideId};

/// Operations a template deck backend provides.
pub trait DeckEngine {
    /// Slides in presentation order.
    fn slides(&self) -> Vec<SlideId>;

    /// Number of slides in the deck.
    fn slide_count(&self) -> usize {
        self.slides().len()
    }

    /// Append a structural copy of `prototype` (shapes, z-order, geometry)
    /// to the end of the deck.
    fn duplicate_slide(&mut self, prototype: SlideId) -> Result<SlideId>;

    /// Remove a slide and everything only it refers to.
    fn remove_slide(&mut self, slide: SlideId) -> Result<()>;

    /// Top-level shapes of a slide, back to front.
    fn shapes(&self, slide: SlideId) -> Result<Vec<ShapeInfo>>;

    /// Remove a shape from a slide.
    fn remove_shape(&mut self, slide: SlideId, shape: ShapeId) -> Result<()>;

    /// Offer the text of every run on the slide to `rewrite`; runs for which
    /// it returns `Some` get the new text. Returns the number of rewritten runs.
    fn rewrite_text_runs(
        &mut self,
        slide: SlideId,
        rewrite: &mut dyn FnMut(&str) -> Option<String>,
    ) -> Result<usize>;

    /// Show `image` in place of a picture shape, keeping its position and size.
    fn replace_picture(&mut self, slide: SlideId, shape: ShapeId, image: &ImageData)
        -> Result<()>;
}
