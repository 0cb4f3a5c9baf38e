use super::node::ProviderNode;
use crate::error::{MonitorError, MonitorResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// An element whose end tag has not been seen yet
struct Frame {
    name: String,
    attributes: Vec<(String, ProviderNode)>,
    /// Children grouped by tag name, in order of first appearance
    children: Vec<(String, Vec<ProviderNode>)>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> MonitorResult<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(malformed)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(malformed)?.into_owned();
            attributes.push((format!("@{}", key), ProviderNode::Text(value)));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn push_child(&mut self, name: String, node: ProviderNode) {
        match self.children.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, nodes)) => nodes.push(node),
            None => self.children.push((name, vec![node])),
        }
    }

    fn close(self) -> (String, ProviderNode) {
        let text = self.text.trim().to_string();

        if self.attributes.is_empty() && self.children.is_empty() {
            let node = if text.is_empty() {
                ProviderNode::Null
            } else {
                ProviderNode::Text(text)
            };
            return (self.name, node);
        }

        let mut entries = self.attributes;
        for (name, mut nodes) in self.children {
            let node = if nodes.len() == 1 {
                nodes.remove(0)
            } else {
                ProviderNode::List(nodes)
            };
            entries.push((name, node));
        }
        if !text.is_empty() {
            entries.push(("#text".to_string(), ProviderNode::Text(text)));
        }
        (self.name, ProviderNode::Map(entries))
    }
}

fn malformed<E: std::fmt::Display>(err: E) -> MonitorError {
    MonitorError::MalformedResponse(format!("invalid XML: {}", err))
}

/// Convert an XML document into a [`ProviderNode`] rooted at a single-key map
pub fn parse_xml(input: &str) -> MonitorResult<ProviderNode> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, ProviderNode)> = None;

    loop {
        let event = reader.read_event().map_err(malformed)?;
        let finished = match event {
            Event::Start(start) => {
                stack.push(Frame::open(&start)?);
                None
            }
            Event::Empty(start) => Some(Frame::open(&start)?.close()),
            Event::End(_) => match stack.pop() {
                Some(frame) => Some(frame.close()),
                None => return Err(malformed("unexpected closing tag")),
            },
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text.unescape().map_err(malformed)?);
                }
                None
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
                None
            }
            Event::Eof => break,
            _ => None,
        };

        if let Some((name, node)) = finished {
            match stack.last_mut() {
                Some(parent) => parent.push_child(name, node),
                None if root.is_none() => root = Some((name, node)),
                None => return Err(malformed("multiple root elements")),
            }
        }
    }

    if let Some(frame) = stack.last() {
        return Err(malformed(format!("unclosed element <{}>", frame.name)));
    }
    match root {
        Some((name, node)) => Ok(ProviderNode::Map(vec![(name, node)])),
        None => Err(malformed("document has no root element")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_only_elements_become_strings() {
        let node = parse_xml("<?xml version=\"1.0\"?><a><b>hello</b><c/><d>  </d></a>").unwrap();
        assert_eq!(node.path(&["a", "b"]), Some(&ProviderNode::Text("hello".into())));
        assert_eq!(node.path(&["a", "c"]), Some(&ProviderNode::Null));
        assert_eq!(node.path(&["a", "d"]), Some(&ProviderNode::Null));
    }

    #[test]
    fn test_repeated_children_become_list() {
        let node = parse_xml("<r><g>1</g><x>y</x><g>2</g></r>").unwrap();
        assert_eq!(
            node.path(&["r", "g"]),
            Some(&ProviderNode::List(vec![
                ProviderNode::Text("1".into()),
                ProviderNode::Text("2".into()),
            ]))
        );
    }

    #[test]
    fn test_attributes_and_mixed_text() {
        let node =
            parse_xml(r#"<headline id="7">Big <hlword>news</hlword> today &amp; more</headline>"#)
                .unwrap();
        let headline = node.get("headline").unwrap();
        assert_eq!(headline.get("@id").and_then(|n| n.as_text()), Some("7"));
        assert_eq!(headline.get("hlword").and_then(|n| n.as_text()), Some("news"));
        assert_eq!(
            headline.get("#text").and_then(|n| n.as_text()),
            Some("Big  today & more")
        );
    }

    #[test]
    fn test_cdata_is_text() {
        let node = parse_xml("<u><![CDATA[https://example.com/?a=1&b=2]]></u>").unwrap();
        assert_eq!(
            node.get("u").and_then(|n| n.as_text()),
            Some("https://example.com/?a=1&b=2")
        );
    }

    #[test]
    fn test_broken_documents_are_malformed() {
        for input in ["<a><b></a>", "<a>", "", "<a/><b/>", "just text"] {
            let err = parse_xml(input).unwrap_err();
            assert!(
                matches!(err, MonitorError::MalformedResponse(_)),
                "input {:?} gave {:?}",
                input,
                err
            );
        }
    }
}
