use super::Surface;
use rz_command_types::ElementTemplate;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Handle to an element in a [`MemorySurface`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// Arena-backed element tree.
///
/// Node 0 is the results container. Nodes are never freed; detached nodes
/// simply have no parent. The arena grows only as fast as the renderer
/// instantiates, which is once per row id, group key and heading.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    nodes: Vec<Element>,
    created: usize,
    scrolled: Vec<NodeId>,
    enhanced: usize,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    #[must_use]
    pub fn new() -> Self {
        let container = Element {
            tag: "div".to_string(),
            ..Default::default()
        };
        Self {
            nodes: vec![container],
            created: 0,
            scrolled: Vec::new(),
            enhanced: 0,
        }
    }

    #[must_use]
    pub fn container(&self) -> NodeId {
        NodeId(0)
    }

    /// Elements instantiated from templates so far
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// How many times the post-insert hook ran
    #[must_use]
    pub fn enhance_count(&self) -> usize {
        self.enhanced
    }

    /// Nodes scrolled into view, oldest first
    #[must_use]
    pub fn scrolled(&self) -> &[NodeId] {
        &self.scrolled
    }

    #[must_use]
    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attributes.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes[node.0].text.as_deref()
    }

    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// All attached descendants of the container with `name == value`,
    /// in document order.
    #[must_use]
    pub fn find_all(&self, name: &str, value: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.walk(self.container(), &mut |id| {
            if self.attribute(id, name) == Some(value) {
                found.push(id);
            }
        });
        found
    }

    /// Attached row ids (`role="option"`) in document order
    #[must_use]
    pub fn rendered_ids(&self) -> Vec<String> {
        self.find_all(super::ATTR_ROLE, "option")
            .into_iter()
            .filter_map(|id| self.attribute(id, "id").map(String::from))
            .collect()
    }

    /// Indented markup dump of the container
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(self.container(), 0, &mut out);
        out
    }

    fn walk(&self, node: NodeId, visit: &mut impl FnMut(NodeId)) {
        for &child in &self.nodes[node.0].children {
            visit(child);
            self.walk(child, visit);
        }
    }

    fn write_markup(&self, node: NodeId, depth: usize, out: &mut String) {
        let element = &self.nodes[node.0];
        let indent = "  ".repeat(depth);

        let _ = write!(out, "{indent}<{}", element.tag);
        for (name, value) in &element.attributes {
            if value.is_empty() {
                let _ = write!(out, " {name}");
            } else {
                let _ = write!(out, " {name}=\"{value}\"");
            }
        }
        out.push('>');

        if element.children.is_empty() {
            if let Some(text) = &element.text {
                out.push_str(text);
            }
            let _ = writeln!(out, "</{}>", element.tag);
            return;
        }

        out.push('\n');
        if let Some(text) = &element.text {
            let _ = writeln!(out, "{indent}  {text}");
        }
        for &child in &element.children {
            self.write_markup(child, depth + 1, out);
        }
        let _ = writeln!(out, "{indent}</{}>", element.tag);
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }
}

impl Surface for MemorySurface {
    type Node = NodeId;

    fn instantiate(&mut self, template: &ElementTemplate) -> NodeId {
        self.nodes.push(Element {
            tag: template.tag.clone(),
            attributes: template.attributes.clone(),
            text: template.text.clone(),
            children: Vec::new(),
            parent: None,
        });
        self.created += 1;
        NodeId(self.nodes.len() - 1)
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        self.nodes[node.0].text = Some(text.to_string());
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        self.nodes[node.0].attributes.remove(name);
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.detach(*child);
        self.nodes[child.0].parent = Some(*parent);
        self.nodes[parent.0].children.push(*child);
    }

    fn clear_children(&mut self, node: &NodeId) {
        for child in std::mem::take(&mut self.nodes[node.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    fn replace_results(&mut self, nodes: &[NodeId]) {
        let container = self.container();
        self.clear_children(&container);
        for node in nodes {
            self.append_child(&container, node);
        }
    }

    fn scroll_into_view(&mut self, node: &NodeId) {
        self.scrolled.push(*node);
    }

    fn enhance(&mut self, _nodes: &[NodeId]) {
        self.enhanced += 1;
    }
}
