//! Slide assembly: one generated slide per step row.

use crate::config::GeneratorConfig;
use crate::engine::DeckEngine;
use crate::error::{Error, Result};
use crate::format::{FormatState, RowText};
use crate::types::{ImageData, PlaceholderKind, Row, SlideId};
use serde::Serialize;

/// Summary of an assembly run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Rows read from the CSV.
    pub rows: usize,
    pub slides_generated: usize,
    pub placeholders_removed: usize,
    /// Text runs that received a substitution.
    pub substitutions: usize,
    pub pictures_replaced: usize,
    /// Whether the prototype slide was removed from the deck.
    pub prototype_removed: bool,
}

/// Duplicates the prototype slide per row and fills it in.
#[derive(Debug, Clone)]
pub struct SlideAssembler {
    strip_placeholders: Vec<PlaceholderKind>,
    keep_prototype: bool,
}

impl Default for SlideAssembler {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}

impl SlideAssembler {
    /// Create an assembler that strips title and body placeholders and
    /// drops the prototype afterwards.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assembler from a generator configuration.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            strip_placeholders: config.strip_placeholders.clone(),
            keep_prototype: config.keep_prototype,
        }
    }

    /// Keep the prototype slide in the output deck.
    pub fn with_keep_prototype(mut self, keep: bool) -> Self {
        self.keep_prototype = keep;
        self
    }

    /// Generate one slide per row, in row order.
    ///
    /// The first slide of `deck` is the prototype. Rows are folded with a
    /// [`FormatState`] so unparsable section labels reuse the last good one.
    pub fn assemble<E: DeckEngine>(
        &self,
        deck: &mut E,
        rows: &[Row],
        image: &ImageData,
    ) -> Result<GenerationReport> {
        let prototype = deck.slides().first().copied().ok_or(Error::NoSlides)?;

        let mut report = GenerationReport {
            rows: rows.len(),
            ..Default::default()
        };

        rows.iter()
            .enumerate()
            .try_fold(FormatState::new(), |state, (idx, row)| {
                log::info!("Processing row {}", idx + 1);
                let (text, state) = state.format_row(row.section()?, row.steps()?);
                self.build_slide(deck, prototype, &text, image, &mut report)?;
                Ok::<_, Error>(state)
            })?;

        if report.slides_generated == 0 {
            return Err(Error::NothingGenerated);
        }

        if !self.keep_prototype {
            deck.remove_slide(prototype)?;
            report.prototype_removed = true;
        }

        Ok(report)
    }

    fn build_slide<E: DeckEngine>(
        &self,
        deck: &mut E,
        prototype: SlideId,
        text: &RowText,
        image: &ImageData,
        report: &mut GenerationReport,
    ) -> Result<SlideId> {
        let slide = deck.duplicate_slide(prototype)?;
        report.slides_generated += 1;

        for shape in deck.shapes(slide)? {
            if shape.is_placeholder_in(&self.strip_placeholders) {
                deck.remove_shape(slide, shape.id)?;
                log::debug!("Removed shape '{}' from slide", shape.name);
                report.placeholders_removed += 1;
            }
        }

        report.substitutions += deck.rewrite_text_runs(slide, &mut |run| {
            let (_, replaced) = text.substitute(run)?;
            log::debug!("Replacing {:?} with {:?}", run, replaced);
            Some(replaced)
        })?;

        for shape in deck.shapes(slide)? {
            if shape.is_picture() {
                deck.replace_picture(slide, shape.id, image)?;
                log::debug!(
                    "Replaced picture '{}' at {:?} with image '{}'",
                    shape.name,
                    shape.geometry,
                    image.file_name
                );
                report.pictures_replaced += 1;
            }
        }

        Ok(slide)
    }
}
