use super::document::{Document, NodeId, NodeKind};
use super::encoding::{self, OutputEncoding};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io;

const INDENT: u8 = b' ';
const INDENT_WIDTH: usize = 2;

/// Re-renders the tree with a two-space indent, a fresh XML declaration
/// carrying the output encoding label, and the bytes encoded for that
/// encoding. Qualified names and attributes are written verbatim, so
/// namespace prefixes and declarations survive untouched.
pub(crate) fn serialize(document: &Document, output: &OutputEncoding) -> io::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), INDENT, INDENT_WIDTH);
    writer.write_event(Event::Decl(BytesDecl::new(
        "1.0",
        Some(output.label.as_str()),
        None,
    )))?;

    for &id in document.top_level() {
        write_node(document, id, &mut writer)?;
    }

    let mut text = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    text.push('\n');
    Ok(encoding::encode(&text, output))
}

fn write_node(document: &Document, id: NodeId, writer: &mut Writer<Vec<u8>>) -> io::Result<()> {
    match &document.node(id).kind {
        NodeKind::Element(element) => {
            let mut start = BytesStart::new(element.name.as_str());
            for (key, value) in &element.attributes {
                start.push_attribute((key.as_str(), value.as_str()));
            }

            if element.children.is_empty() {
                writer.write_event(Event::Empty(start))?;
            } else {
                writer.write_event(Event::Start(start))?;
                for &child in &element.children {
                    write_node(document, child, writer)?;
                }
                writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
            }
        }
        NodeKind::Text(text) => {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        NodeKind::CData(text) => {
            writer.write_event(Event::CData(BytesCData::new(text.as_str())))?;
        }
        NodeKind::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
        }
        NodeKind::ProcessingInstruction(content) => {
            writer.write_event(Event::PI(BytesPI::new(content.as_str())))?;
        }
        NodeKind::DocType(content) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(content.as_str())))?;
        }
    }
    Ok(())
}
