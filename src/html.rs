use crate::cleanup::{extract_media_blocks, trim_html_comments};
use kuchiki::{NodeData, NodeRef};

/// Concatenated CSS text of every `<style>` element in document order,
/// with legacy HTML comment wrappers peeled off.
pub(crate) fn collect_style_tag_css(document: &NodeRef) -> String {
    let mut css = String::new();
    if let Ok(styles) = document.select("style") {
        for style in styles {
            css.push_str(&trim_html_comments(&style.as_node().text_contents()));
            css.push('\n');
        }
    }
    css
}

/// Drop `class` and `id` attributes everywhere. Selectors have already been
/// resolved by the time this runs, so the hooks they needed can go.
pub(crate) fn remove_class_and_id_attributes(document: &NodeRef) {
    if let Ok(elements) = document.select("*") {
        for element in elements {
            let mut attributes = element.attributes.borrow_mut();
            attributes.remove("class");
            attributes.remove("id");
        }
    }
}

/// Remove `<style>` tags whose rules have been inlined. With
/// `preserve_media`, a tag whose text contains `@media` blocks survives and
/// keeps exactly that text; media queries cannot be inlined, so they stay
/// behind verbatim for clients that do evaluate them.
pub(crate) fn strip_style_tags(document: &NodeRef, preserve_media: bool) {
    let Ok(styles) = document.select("style") else {
        return;
    };
    // collect before mutating, detaching mid-walk would break the iterator
    let styles: Vec<NodeRef> = styles.map(|style| style.as_node().clone()).collect();

    for node in styles {
        if preserve_media {
            let media = extract_media_blocks(&trim_html_comments(&node.text_contents()));
            if !media.is_empty() {
                while let Some(child) = node.first_child() {
                    child.detach();
                }
                node.append(NodeRef::new_text(media));
                continue;
            }
        }
        node.detach();
    }
}

/// Minimal XML serialization of the whole document: childless elements
/// self-close, no XML prolog. The tree library's own serializer emits HTML,
/// which is not necessarily well-formed XML (void elements, attribute
/// quoting), so XHTML output gets this dedicated writer.
pub(crate) fn serialize_xhtml(document: &NodeRef) -> String {
    let mut out = String::new();
    write_xhtml_node(document, &mut out);
    out
}

fn write_xhtml_node(node: &NodeRef, out: &mut String) {
    match node.data() {
        NodeData::Document(_) | NodeData::DocumentFragment => {
            for child in node.children() {
                write_xhtml_node(&child, out);
            }
        }
        NodeData::Doctype(doctype) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(&doctype.name);
            out.push_str(">\n");
        }
        NodeData::Element(element) => {
            let tag = element.name.local.as_ref();
            out.push('<');
            out.push_str(tag);

            let attributes = element.attributes.borrow();
            for (name, attribute) in attributes.map.iter() {
                out.push(' ');
                out.push_str(name.local.as_ref());
                out.push_str("=\"");
                escape_xml_attr(&attribute.value, out);
                out.push('"');
            }

            if node.first_child().is_none() {
                out.push_str(" />");
            } else {
                out.push('>');
                for child in node.children() {
                    write_xhtml_node(&child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
        NodeData::Text(text) => {
            escape_xml_text(&text.borrow(), out);
        }
        NodeData::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(&comment.borrow());
            out.push_str("-->");
        }
        NodeData::ProcessingInstruction(_) => {}
    }
}

fn escape_xml_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn escape_xml_text(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}
