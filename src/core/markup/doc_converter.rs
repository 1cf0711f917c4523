//! Google Docs document model → semantic markup tree.
//!
//! The conversion is pure: no I/O, no image handling. Image nodes keep the
//! remote `contentUri` until the image localizer rewrites them.

use super::docs_models::{
    EmbeddedObject, GoogleDocument, Paragraph, ParagraphElement, StructuralElement, TextRun,
};
use super::tree::{Element, Node};
use crate::core::site::SiteError;
use serde::Deserialize;

/// Font families rendered as inline code.
const MONOSPACE_HINTS: &[&str] = &["mono", "courier", "consolas", "source code", "inconsolata"];

/// Decodes a raw Docs API payload into the typed document model.
pub fn parse_document(raw: &serde_json::Value) -> Result<GoogleDocument, SiteError> {
    if !raw.is_object() {
        return Err(SiteError::Convert(
            "document payload is not a JSON object".to_string(),
        ));
    }
    GoogleDocument::deserialize(raw).map_err(|e| SiteError::Convert(e.to_string()))
}

/// Converts a document into a `root` node holding its body blocks.
pub fn to_hast(doc: &GoogleDocument) -> Node {
    let content = doc
        .body
        .as_ref()
        .map(|b| b.content.as_slice())
        .unwrap_or_default();
    Node::root(convert_blocks(doc, content))
}

/// One open `ul`/`ol` while consecutive bullet paragraphs are grouped.
struct OpenList {
    list_id: String,
    element: Element,
}

fn convert_blocks(doc: &GoogleDocument, content: &[StructuralElement]) -> Vec<Node> {
    let mut out = Vec::new();
    let mut lists: Vec<OpenList> = Vec::new();

    for element in content {
        if let Some(paragraph) = &element.paragraph {
            if let Some(bullet) = &paragraph.bullet {
                if lists.first().is_some_and(|l| l.list_id != bullet.list_id) {
                    close_lists(&mut lists, 0, &mut out);
                }
                let level = bullet.nesting_level;
                close_lists(&mut lists, level + 1, &mut out);
                while lists.len() < level + 1 {
                    let depth = lists.len();
                    let tag = if doc.is_ordered_list(&bullet.list_id, depth) {
                        "ol"
                    } else {
                        "ul"
                    };
                    lists.push(OpenList {
                        list_id: bullet.list_id.clone(),
                        element: Element::new(tag),
                    });
                }

                let item =
                    Element::new("li").with_children(convert_inline(doc, &paragraph.elements));
                if let Some(open) = lists.last_mut() {
                    open.element.children.push(item.into_node());
                }
                continue;
            }

            close_lists(&mut lists, 0, &mut out);
            if let Some(node) = convert_paragraph(doc, paragraph) {
                out.push(node);
            }
        } else if let Some(table) = &element.table {
            close_lists(&mut lists, 0, &mut out);
            let rows = table
                .table_rows
                .iter()
                .map(|row| {
                    let cells = row
                        .table_cells
                        .iter()
                        .map(|cell| {
                            Element::new("td")
                                .with_children(convert_blocks(doc, &cell.content))
                                .into_node()
                        })
                        .collect();
                    Element::new("tr").with_children(cells).into_node()
                })
                .collect();
            let tbody = Element::new("tbody").with_children(rows).into_node();
            out.push(Element::new("table").with_children(vec![tbody]).into_node());
        }
        // Section breaks and tables of contents render nothing.
    }

    close_lists(&mut lists, 0, &mut out);
    out
}

/// Pops open lists until only `keep` remain, nesting each popped list into
/// the last item of its parent.
fn close_lists(lists: &mut Vec<OpenList>, keep: usize, out: &mut Vec<Node>) {
    while lists.len() > keep {
        let Some(closed) = lists.pop() else {
            break;
        };
        let node = closed.element.into_node();
        match lists.last_mut() {
            Some(parent) => match parent.element.children.last_mut() {
                Some(Node::Element(li)) if li.tag_name == "li" => li.children.push(node),
                _ => parent.element.children.push(node),
            },
            None => out.push(node),
        }
    }
}

fn convert_paragraph(doc: &GoogleDocument, paragraph: &Paragraph) -> Option<Node> {
    let children = convert_inline(doc, &paragraph.elements);
    if children.is_empty() {
        return None;
    }

    // A paragraph holding nothing but a rule becomes a block-level `hr`.
    if let [Node::Element(el)] = children.as_slice() {
        if el.tag_name == "hr" {
            return Some(Element::new("hr").into_node());
        }
    }

    let style = paragraph.paragraph_style.as_ref();
    let named = style
        .and_then(|s| s.named_style_type.as_deref())
        .unwrap_or("NORMAL_TEXT");

    let mut element = match named {
        "TITLE" => Element::new("h1").with_property("class", "title"),
        "SUBTITLE" => Element::new("p").with_property("class", "subtitle"),
        "HEADING_1" => Element::new("h1"),
        "HEADING_2" => Element::new("h2"),
        "HEADING_3" => Element::new("h3"),
        "HEADING_4" => Element::new("h4"),
        "HEADING_5" => Element::new("h5"),
        "HEADING_6" => Element::new("h6"),
        _ => Element::new("p"),
    };

    if let Some(id) = style.and_then(|s| s.heading_id.as_deref()) {
        element = element.with_property("id", id);
    }

    Some(element.with_children(children).into_node())
}

fn convert_inline(doc: &GoogleDocument, elements: &[ParagraphElement]) -> Vec<Node> {
    let mut nodes = Vec::new();
    for element in elements {
        if let Some(run) = &element.text_run {
            nodes.extend(convert_text_run(run));
        } else if let Some(inline) = &element.inline_object_element {
            if let Some(img) = doc
                .embedded_object(&inline.inline_object_id)
                .and_then(convert_image)
            {
                nodes.push(img);
            }
        } else if element.horizontal_rule.is_some() {
            nodes.push(Element::new("hr").into_node());
        }
    }
    nodes
}

fn convert_text_run(run: &TextRun) -> Vec<Node> {
    let content = run.content.as_deref().unwrap_or_default();
    let content = content.strip_suffix('\n').unwrap_or(content);
    if content.is_empty() {
        return Vec::new();
    }

    let mut children = Vec::new();
    for (i, line) in content.split('\u{000b}').enumerate() {
        if i > 0 {
            children.push(Element::new("br").into_node());
        }
        if !line.is_empty() {
            children.push(Node::text(line));
        }
    }

    let Some(style) = &run.text_style else {
        return children;
    };

    let is_monospace = style.weighted_font_family.as_ref().is_some_and(|f| {
        let family = f.font_family.to_lowercase();
        MONOSPACE_HINTS.iter().any(|hint| family.contains(hint))
    });
    let href = style.link.as_ref().and_then(|l| l.href());

    if is_monospace {
        children = wrap("code", children);
    }
    match style.baseline_offset.as_deref() {
        Some("SUPERSCRIPT") => children = wrap("sup", children),
        Some("SUBSCRIPT") => children = wrap("sub", children),
        _ => {}
    }
    if style.strikethrough {
        children = wrap("s", children);
    }
    // Docs underlines every link; the anchor already says it.
    if style.underline && href.is_none() {
        children = wrap("u", children);
    }
    if style.italic {
        children = wrap("em", children);
    }
    if style.bold {
        children = wrap("strong", children);
    }
    if let Some(href) = href {
        children = vec![Element::new("a")
            .with_property("href", href)
            .with_children(children)
            .into_node()];
    }

    children
}

fn wrap(tag: &str, children: Vec<Node>) -> Vec<Node> {
    vec![Element::new(tag).with_children(children).into_node()]
}

fn convert_image(object: &EmbeddedObject) -> Option<Node> {
    let props = object.image_properties.as_ref()?;
    let src = props
        .content_uri
        .as_deref()
        .or(props.source_uri.as_deref())?;

    let mut img = Element::new("img").with_property("src", src);
    if let Some(alt) = object.description.as_deref().or(object.title.as_deref()) {
        img = img.with_property("alt", alt);
    }
    if let Some(title) = object.title.as_deref() {
        img = img.with_property("title", title);
    }
    if let Some(size) = &object.size {
        if let Some(width) = size.width.as_ref().and_then(|d| d.magnitude) {
            img = img.with_property("width", format!("{}", width.round() as i64));
        }
        if let Some(height) = size.height.as_ref().and_then(|d| d.magnitude) {
            img = img.with_property("height", format!("{}", height.round() as i64));
        }
    }
    Some(img.into_node())
}
