// =============================================================================
// GOOGLE DOCS API DOCUMENT STRUCTURES
// =============================================================================
//
// Only the parts of the Docs API document model the converter reads. Every
// field is optional or defaulted so documents using features we ignore still
// deserialize.

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleDocument {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    pub body: Option<Body>,
    #[serde(default)]
    pub lists: HashMap<String, List>,
    #[serde(default)]
    pub inline_objects: HashMap<String, InlineObject>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    pub paragraph: Option<Paragraph>,
    pub table: Option<Table>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
    pub paragraph_style: Option<ParagraphStyle>,
    pub bullet: Option<Bullet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    pub named_style_type: Option<String>,
    pub heading_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bullet {
    #[serde(default)]
    pub list_id: String,
    #[serde(default)]
    pub nesting_level: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    pub text_run: Option<TextRun>,
    pub inline_object_element: Option<InlineObjectElement>,
    pub horizontal_rule: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub content: Option<String>,
    pub text_style: Option<TextStyle>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    pub baseline_offset: Option<String>,
    pub link: Option<Link>,
    pub weighted_font_family: Option<WeightedFontFamily>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub url: Option<String>,
    pub heading_id: Option<String>,
    pub bookmark_id: Option<String>,
}

impl Link {
    pub fn href(&self) -> Option<String> {
        if let Some(url) = &self.url {
            return Some(url.clone());
        }
        self.heading_id
            .as_ref()
            .or(self.bookmark_id.as_ref())
            .map(|id| format!("#{}", id))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedFontFamily {
    #[serde(default)]
    pub font_family: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineObjectElement {
    #[serde(default)]
    pub inline_object_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineObject {
    pub inline_object_properties: Option<InlineObjectProperties>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineObjectProperties {
    pub embedded_object: Option<EmbeddedObject>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedObject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_properties: Option<ImageProperties>,
    pub size: Option<Size>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProperties {
    pub content_uri: Option<String>,
    pub source_uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub magnitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub list_properties: Option<ListProperties>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProperties {
    #[serde(default)]
    pub nesting_levels: Vec<NestingLevel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestingLevel {
    pub glyph_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

impl GoogleDocument {
    /// Whether the given list level renders with numbers rather than bullets.
    pub fn is_ordered_list(&self, list_id: &str, level: usize) -> bool {
        self.lists
            .get(list_id)
            .and_then(|list| list.list_properties.as_ref())
            .and_then(|props| props.nesting_levels.get(level))
            .and_then(|nesting| nesting.glyph_type.as_deref())
            .is_some_and(|glyph| {
                matches!(
                    glyph,
                    "DECIMAL" | "ZERO_DECIMAL" | "ALPHA" | "UPPER_ALPHA" | "ROMAN" | "UPPER_ROMAN"
                )
            })
    }

    pub fn embedded_object(&self, inline_object_id: &str) -> Option<&EmbeddedObject> {
        self.inline_objects
            .get(inline_object_id)
            .and_then(|obj| obj.inline_object_properties.as_ref())
            .and_then(|props| props.embedded_object.as_ref())
    }
}
