use std::collections::HashMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
enum NodeType {
    Document,
    Element(Element),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    node_type: NodeType,
}

#[derive(Debug, Clone)]
struct Element {
    tag_name: String,
    attrs: HashMap<String, String>,
}

/// Arena DOM holding `document > html > body` plus whatever the harness
/// creates. Nodes are never freed; detaching only clears the parent link.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                node_type: NodeType::Document,
            }],
            root: NodeId(0),
            body: NodeId(0),
        };
        let html = dom.create_node(Some(dom.root), Self::element_node("html"));
        dom.body = dom.create_node(Some(html), Self::element_node("body"));
        dom
    }

    fn element_node(tag_name: &str) -> NodeType {
        NodeType::Element(Element {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs: HashMap::new(),
        })
    }

    fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn create_detached_element(&mut self, tag_name: &str) -> Result<NodeId> {
        if tag_name.is_empty() || !tag_name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
        {
            return Err(Error::Dom(format!("invalid tag name: {tag_name:?}")));
        }
        Ok(self.create_node(None, Self::element_node(tag_name)))
    }

    fn node(&self, node_id: NodeId) -> Result<&Node> {
        self.nodes
            .get(node_id.0)
            .ok_or_else(|| Error::Dom(format!("unknown node id {}", node_id.0)))
    }

    fn element(&self, node_id: NodeId) -> Result<&Element> {
        match &self.node(node_id)?.node_type {
            NodeType::Element(element) => Ok(element),
            NodeType::Document => Err(Error::Dom(format!(
                "node {} is not an element",
                node_id.0
            ))),
        }
    }

    fn element_mut(&mut self, node_id: NodeId) -> Result<&mut Element> {
        let node = self
            .nodes
            .get_mut(node_id.0)
            .ok_or_else(|| Error::Dom(format!("unknown node id {}", node_id.0)))?;
        match &mut node.node_type {
            NodeType::Element(element) => Ok(element),
            NodeType::Document => Err(Error::Dom(format!(
                "node {} is not an element",
                node_id.0
            ))),
        }
    }

    pub fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).ok().map(|e| e.tag_name.as_str())
    }

    pub fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id.0).and_then(|node| node.parent)
    }

    pub fn children(&self, node_id: NodeId) -> &[NodeId] {
        self.nodes
            .get(node_id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn attr(&self, node_id: NodeId, name: &str) -> Option<&str> {
        self.element(node_id)
            .ok()
            .and_then(|element| element.attrs.get(name))
            .map(String::as_str)
    }

    pub fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        self.element_mut(node_id)?
            .attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    pub fn is_descendant_of(&self, node_id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(node_id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn is_connected(&self, node_id: NodeId) -> bool {
        node_id == self.root || self.is_descendant_of(node_id, self.root)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        self.element(child)?;
        if parent == child || self.is_descendant_of(parent, child) {
            return Err(Error::Dom(format!(
                "appendChild would create a cycle: parent={} child={}",
                parent.0, child.0
            )));
        }
        if let Some(old_parent) = self.nodes[child.0].parent {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child) != Some(parent) {
            return Err(Error::Dom(format!(
                "node {} is not a child of {}",
                child.0, parent.0
            )));
        }
        self.nodes[parent.0].children.retain(|id| *id != child);
        self.nodes[child.0].parent = None;
        Ok(())
    }

    /// Path from the document root down to `node_id`, inclusive.
    pub fn propagation_path(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = Some(node_id);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.parent(node);
        }
        path.reverse();
        path
    }

    pub fn node_label(&self, node_id: NodeId) -> String {
        match self.tag_name(node_id) {
            Some(tag) => match self.attr(node_id, "id") {
                Some(id) => format!("{tag}#{id}"),
                None => format!("{tag}@{}", node_id.0),
            },
            None => "#document".into(),
        }
    }

    pub fn dump_node(&self, node_id: NodeId) -> String {
        let Ok(element) = self.element(node_id) else {
            return "#document".into();
        };
        let mut attrs = element.attrs.iter().collect::<Vec<_>>();
        attrs.sort();
        let mut out = format!("<{}", element.tag_name);
        for (name, value) in attrs {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
        out.push('>');
        for child in self.children(node_id) {
            out.push_str(&self.dump_node(*child));
        }
        out.push_str(&format!("</{}>", element.tag_name));
        out
    }
}
