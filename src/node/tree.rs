use crate::utils::path::last_segment;
use crate::utils::path::relative_key;
use crate::utils::path::segments;
use crate::StoreNode;

/// Position of a node inside its [`NodeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    full_key: String,
    value: String,
    is_dir: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena holding a snapshot of one store subtree.
///
/// Full keys are relative to the queried root, whose own full key is empty:
/// reading `/` yields nodes `a`, `a/b`, `d`, ... The tree is built once and
/// never follows later store changes.
#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: Vec<NodeData>,
}

impl NodeTree {
    const ROOT: NodeId = NodeId(0);

    fn empty() -> Self {
        Self {
            nodes: vec![NodeData {
                full_key: String::new(),
                value: String::new(),
                is_dir: true,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Projects a recursive store read.
    pub fn from_store_node(root: &StoreNode) -> Self {
        let mut tree = Self::empty();
        for child in &root.nodes {
            tree.insert_store_node(Self::ROOT, &root.key, child);
        }
        tree
    }

    /// Builds a tree from flat `path -> value` pairs; intermediate segments
    /// become directories.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.into()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        let mut tree = Self::empty();
        for (path, value) in pairs {
            let mut current = Self::ROOT;
            let mut full_key = String::new();
            let mut parts = segments(&path).peekable();
            while let Some(part) = parts.next() {
                if !full_key.is_empty() {
                    full_key.push('/');
                }
                full_key.push_str(part);

                let is_leaf = parts.peek().is_none();
                current = match tree.child_by_key(current, part) {
                    Some(existing) => {
                        if !is_leaf {
                            let node = &mut tree.nodes[existing.0];
                            node.is_dir = true;
                            node.value.clear();
                        }
                        existing
                    }
                    None => tree.push(current, full_key.clone(), String::new(), !is_leaf),
                };
                if is_leaf && !tree.nodes[current.0].is_dir {
                    tree.nodes[current.0].value = value.clone();
                }
            }
        }
        tree
    }

    pub fn root(&self) -> Node<'_> {
        Node {
            tree: self,
            id: Self::ROOT,
        }
    }

    pub fn get(
        &self,
        id: NodeId,
    ) -> Option<Node<'_>> {
        (id.0 < self.nodes.len()).then_some(Node { tree: self, id })
    }

    /// Number of nodes, the root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds nothing but its root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    fn insert_store_node(
        &mut self,
        parent: NodeId,
        root_key: &str,
        node: &StoreNode,
    ) {
        let full_key = relative_key(root_key, &node.key).to_string();
        let id = self.push(parent, full_key, node.value_str().to_string(), node.dir);
        for child in &node.nodes {
            self.insert_store_node(id, root_key, child);
        }
    }

    fn push(
        &mut self,
        parent: NodeId,
        full_key: String,
        value: String,
        is_dir: bool,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            full_key,
            value,
            is_dir,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn child_by_key(
        &self,
        parent: NodeId,
        key: &str,
    ) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|child| last_segment(&self.nodes[child.0].full_key) == key)
    }
}

/// Borrowed view on one node of a [`NodeTree`]
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    tree: &'a NodeTree,
    id: NodeId,
}

impl<'a> Node<'a> {
    fn data(&self) -> &'a NodeData {
        &self.tree.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Path relative to the tree root, e.g. `a/b`
    pub fn full_key(&self) -> &'a str {
        &self.data().full_key
    }

    /// Last segment of the full key
    pub fn key(&self) -> &'a str {
        last_segment(self.full_key())
    }

    /// Empty for directories
    pub fn value(&self) -> &'a str {
        &self.data().value
    }

    pub fn is_dir(&self) -> bool {
        self.data().is_dir
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.data().parent.map(|id| Node { tree: self.tree, id })
    }

    pub fn sub_nodes(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let tree = self.tree;
        self.data().children.iter().map(move |&id| Node { tree, id })
    }

    /// Immediate child whose last segment equals `key`.
    pub fn get_sub_node(
        &self,
        key: &str,
    ) -> Option<Node<'a>> {
        self.sub_nodes().find(|child| child.key() == key)
    }
}
