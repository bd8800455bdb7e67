//! PPTX (Office Open XML) template engine backend.
//!
//! Opens .pptx files (ZIP archives of XML parts), lets slides be duplicated
//! and edited through [`stepdeck_core::DeckEngine`], and writes them back.

pub mod deck;
pub mod package;
pub mod xml;

#[cfg(test)]
mod fixtures;

pub use deck::PptxDeck;
