//! Read-only parse tree
//!
//! The tree is an arena of [`ParseNode`]s addressed by [`NodeId`]. Parent
//! links exist only for ancestor queries; ownership lives in the arena.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::error::{ConvertError, Result};

/// Deepest element nesting accepted before the input is rejected.
pub const MAX_DEPTH: usize = 256;

/// Deepest `<table>` nesting accepted; tables recurse once more when the
/// document is written out.
pub const MAX_TABLE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ParseNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ParseTree {
    nodes: Vec<ParseNode>,
}

impl ParseTree {
    /// Parse an HTML string into an owned tree
    pub fn parse(html: &str) -> Result<Self> {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        Self::from_rcdom(&dom)
    }

    fn from_rcdom(dom: &RcDom) -> Result<Self> {
        let mut tree = ParseTree {
            nodes: vec![ParseNode {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        };

        // Explicit stack so hostile nesting can't blow the call stack here
        let mut stack: Vec<(Handle, NodeId, usize, usize)> = dom
            .document
            .children
            .borrow()
            .iter()
            .rev()
            .map(|child| (child.clone(), tree.root(), 1, 0))
            .collect();

        while let Some((handle, parent, depth, mut tables)) = stack.pop() {
            if depth > MAX_DEPTH {
                return Err(ConvertError::Parse(format!(
                    "element nesting exceeds {MAX_DEPTH} levels"
                )));
            }

            let kind = match &handle.data {
                NodeData::Element { name, attrs, .. } => {
                    if &*name.local == "table" {
                        tables += 1;
                        if tables > MAX_TABLE_DEPTH {
                            return Err(ConvertError::Parse(format!(
                                "table nesting exceeds {MAX_TABLE_DEPTH} levels"
                            )));
                        }
                    }
                    NodeKind::Element {
                        tag: name.local.to_string(),
                        attrs: attrs
                            .borrow()
                            .iter()
                            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                            .collect(),
                    }
                }
                NodeData::Text { contents } => NodeKind::Text(contents.borrow().to_string()),
                // Comments, doctype and processing instructions carry no content
                _ => continue,
            };

            let id = tree.push(kind, parent);
            for child in handle.children.borrow().iter().rev() {
                stack.push((child.clone(), id, depth + 1, tables));
            }
        }

        Ok(tree)
    }

    fn push(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ParseNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &ParseNode {
        &self.nodes[id.0]
    }

    /// Lowercase tag name, `None` for text and the document node
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn is_tag(&self, id: NodeId, names: &[&str]) -> bool {
        self.tag(id).is_some_and(|tag| names.contains(&tag))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set or replace an attribute. Only the pre-passes mutate the tree.
    pub(crate) fn set_attr(&mut self, id: NodeId, name: &str, value: String) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            match attrs.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value,
                None => attrs.push((name.to_string(), value)),
            }
        }
    }

    /// Whitespace-separated tokens of the `class` attribute
    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attr(id, "class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Element children only, skipping text
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.tag(child).is_some())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn parent_tag(&self, id: NodeId) -> Option<&str> {
        self.parent(id).and_then(|parent| self.tag(parent))
    }

    /// Ancestors from the parent up to the document node
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&node| self.parent(node))
    }

    /// All nodes below `id` in document order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Sibling elements after `id` with the given tag, nearest first
    pub fn following_siblings(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.siblings(id)
            .iter()
            .skip_while(|&&sibling| sibling != id)
            .skip(1)
            .copied()
            .filter(|&sibling| self.tag(sibling) == Some(tag))
            .collect()
    }

    /// Sibling elements before `id` with the given tag, nearest first
    pub fn preceding_siblings(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        let siblings = self.siblings(id);
        let at = siblings
            .iter()
            .position(|&sibling| sibling == id)
            .unwrap_or(0);
        siblings[..at]
            .iter()
            .rev()
            .copied()
            .filter(|&sibling| self.tag(sibling) == Some(tag))
            .collect()
    }

    fn siblings(&self, id: NodeId) -> &[NodeId] {
        match self.parent(id) {
            Some(parent) => self.children(parent),
            None => &[],
        }
    }

    /// First element in document order carrying `id="<value>"`
    pub fn find_by_id(&self, value: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&node| self.attr(node, "id") == Some(value))
    }

    /// First element in document order with the given tag
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&node| self.tag(node) == Some(tag))
    }

    /// All elements below `id` with the given tag, in document order
    pub fn find_all(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.tag(node) == Some(tag))
            .collect()
    }

    /// Concatenated text of the subtree
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find_first("body")
    }

    /// Trimmed text of the first `<title>`, if non-empty
    pub fn title(&self) -> Option<String> {
        let title = self.find_first("title")?;
        let text = self.text_content(title).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}
