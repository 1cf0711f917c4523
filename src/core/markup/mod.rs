// Markup pipeline: Docs API model → tree → HTML, plus image localization.

pub mod doc_converter;
pub mod docs_models;
pub mod html;
pub mod image_localizer;
pub mod tree;

pub use doc_converter::{parse_document, to_hast};
pub use html::to_html;
pub use image_localizer::localize_images;
pub use tree::{Element, Node};
