use super::RepairError;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Index into the document arena.
pub(crate) type NodeId = usize;

/// Node 0 is a synthetic document node whose children are the prolog
/// items (comments, PIs, DOCTYPE) and the root element.
const DOCUMENT: NodeId = 0;

#[derive(Debug)]
pub(crate) struct ElementData {
    /// Qualified name exactly as it appeared in the source, prefix included.
    pub(crate) name: String,
    /// Attributes in source order, values unescaped. Namespace
    /// declarations travel here untouched.
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) children: Vec<NodeId>,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Element(ElementData),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

/// Owned element tree with parent links, built once per parse so that
/// container lookups are explicit parent walks rather than positional
/// guesses over raw markup.
#[derive(Debug)]
pub(crate) struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Parses decoded text into a tree. Whitespace-only text nodes are
    /// dropped; everything else round-trips through the serializer.
    pub(crate) fn parse(text: &str) -> Result<Self, RepairError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().check_end_names = true;
        let mut document = Document {
            nodes: vec![Node {
                parent: None,
                kind: NodeKind::Element(ElementData {
                    name: String::new(),
                    attributes: Vec::new(),
                    children: Vec::new(),
                }),
            }],
        };
        let mut open: Vec<NodeId> = vec![DOCUMENT];

        loop {
            match reader.read_event().map_err(RepairError::Parse)? {
                Event::Start(start) => {
                    let id = document.push_element(&start)?;
                    document.attach(*open.last().unwrap_or(&DOCUMENT), id);
                    open.push(id);
                }
                Event::Empty(start) => {
                    let id = document.push_element(&start)?;
                    document.attach(*open.last().unwrap_or(&DOCUMENT), id);
                }
                Event::End(_) => {
                    if open.len() <= 1 {
                        return Err(RepairError::MissingRoot);
                    }
                    open.pop();
                }
                Event::Text(text) => {
                    let content = text.unescape().map_err(RepairError::Parse)?;
                    if !content.trim().is_empty() {
                        let id = document.push(NodeKind::Text(content.into_owned()));
                        document.attach(*open.last().unwrap_or(&DOCUMENT), id);
                    }
                }
                Event::CData(cdata) => {
                    let content = String::from_utf8_lossy(&cdata).into_owned();
                    let id = document.push(NodeKind::CData(content));
                    document.attach(*open.last().unwrap_or(&DOCUMENT), id);
                }
                Event::Comment(comment) => {
                    let content = String::from_utf8_lossy(&comment).into_owned();
                    let id = document.push(NodeKind::Comment(content));
                    document.attach(*open.last().unwrap_or(&DOCUMENT), id);
                }
                Event::PI(pi) => {
                    let content = String::from_utf8_lossy(&pi).into_owned();
                    let id = document.push(NodeKind::ProcessingInstruction(content));
                    document.attach(*open.last().unwrap_or(&DOCUMENT), id);
                }
                Event::DocType(doctype) => {
                    let content = String::from_utf8_lossy(&doctype).into_owned();
                    let id = document.push(NodeKind::DocType(content));
                    document.attach(DOCUMENT, id);
                }
                Event::Decl(_) => {
                    // Re-emitted by the serializer with the output encoding.
                }
                Event::Eof => break,
            }
        }

        if open.len() > 1 {
            let name = document.qualified_name(*open.last().unwrap_or(&DOCUMENT));
            return Err(RepairError::UnclosedElement(name.to_string()));
        }
        if document.root_element().is_none() {
            return Err(RepairError::MissingRoot);
        }

        Ok(document)
    }

    fn push_element(
        &mut self,
        start: &quick_xml::events::BytesStart<'_>,
    ) -> Result<NodeId, RepairError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| RepairError::Parse(err.into()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(RepairError::Parse)?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(self.push(NodeKind::Element(ElementData {
            name,
            attributes,
            children: Vec::new(),
        })))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node { parent: None, kind });
        self.nodes.len() - 1
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        if let NodeKind::Element(element) = &mut self.nodes[parent].kind {
            element.children.push(child);
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Children of the synthetic document node, in source order.
    pub(crate) fn top_level(&self) -> &[NodeId] {
        match &self.nodes[DOCUMENT].kind {
            NodeKind::Element(element) => &element.children,
            _ => &[],
        }
    }

    pub(crate) fn root_element(&self) -> Option<NodeId> {
        self.top_level()
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some())
    }

    /// Qualified name of an element, empty for non-elements.
    pub(crate) fn qualified_name(&self, id: NodeId) -> &str {
        self.element(id).map(|e| e.name.as_str()).unwrap_or("")
    }

    /// Local part of an element name, prefix stripped.
    pub(crate) fn local_name(&self, id: NodeId) -> &str {
        let name = self.qualified_name(id);
        name.rsplit(':').next().unwrap_or(name)
    }

    /// Namespace prefix of an element name, when one is present.
    pub(crate) fn prefix(&self, id: NodeId) -> Option<&str> {
        let name = self.qualified_name(id);
        name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Nearest ancestor element, skipping the synthetic document node.
    pub(crate) fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id].parent?;
        if parent == DOCUMENT {
            return None;
        }
        self.element(parent).map(|_| parent)
    }

    pub(crate) fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.element(id)
            .map(|element| {
                element
                    .children
                    .iter()
                    .copied()
                    .filter(|&child| self.element(child).is_some())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All elements whose local name matches, in document order.
    pub(crate) fn elements_by_local_name(&self, local: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_by_local_name(DOCUMENT, local, &mut found);
        found
    }

    fn collect_by_local_name(&self, id: NodeId, local: &str, found: &mut Vec<NodeId>) {
        if id != DOCUMENT && self.element(id).is_some() && self.local_name(id) == local {
            found.push(id);
        }
        if let Some(element) = self.element(id) {
            for &child in &element.children {
                self.collect_by_local_name(child, local, found);
            }
        }
    }

    /// Concatenated text and CDATA of the subtree, document order.
    pub(crate) fn subtree_text(&self, id: NodeId) -> String {
        let mut buffer = String::new();
        self.collect_text(id, &mut buffer);
        buffer
    }

    fn collect_text(&self, id: NodeId, buffer: &mut String) {
        match &self.nodes[id].kind {
            NodeKind::Text(text) | NodeKind::CData(text) => buffer.push_str(text),
            NodeKind::Element(element) => {
                for &child in &element.children {
                    self.collect_text(child, buffer);
                }
            }
            _ => {}
        }
    }

    pub(crate) fn create_element(&mut self, name: String) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }))
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.attach(parent, child);
    }

    /// Inserts `child` into `parent` right after `anchor`, or last when
    /// the anchor is not among the parent's children.
    pub(crate) fn insert_child_after(&mut self, parent: NodeId, anchor: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        if let NodeKind::Element(element) = &mut self.nodes[parent].kind {
            match element.children.iter().position(|&id| id == anchor) {
                Some(index) => element.children.insert(index + 1, child),
                None => element.children.push(child),
            }
        }
    }

    /// Replaces the element's content with a single text node. Detached
    /// children stay in the arena but are no longer reachable.
    pub(crate) fn set_element_text(&mut self, id: NodeId, text: &str) {
        let text_id = self.push(NodeKind::Text(text.to_string()));
        self.nodes[text_id].parent = Some(id);
        if let NodeKind::Element(element) = &mut self.nodes[id].kind {
            element.children.clear();
            element.children.push(text_id);
        }
    }
}
