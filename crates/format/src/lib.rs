//! RDF format conversion: Turtle, JSON-LD, and RDF/XML over a minimal triple
//! model sufficient to round-trip the documents this pod itself produces.

pub mod converter;
pub mod triple;

pub use converter::FormatConverter;
pub use triple::{ObjectTerm, Triple};
