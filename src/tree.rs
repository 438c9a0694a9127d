//! Editable gene tree backed by an index arena.
//!
//! # Overview
//! Statements are lexed by [`crate::newick`] and the parenthesized ones
//! parsed by `phylotree`; the parsed tree is copied once into a flat arena of
//! [`Node`]s addressed by [`NodeId`]. Labels come back unquoted, and plain
//! `[...]` comments stay attached to their node and are written back out. Pruning then only ever needs a
//! single structural edit, [`GeneTree::remove_leaf`], which keeps the tree
//! well formed after every call:
//!
//! ```text
//! remove C from            the parent of C is left with one child,
//!       root               so it is spliced out and B inherits the
//!      /    \              summed branch length:
//!     A    node1
//!   (0.1)  /   \                 root
//!   (0.2) B     C               /    \
//!       (0.3) (0.4)            A      B
//!                            (0.1)  (0.5)
//! ```
//!
//! Removed nodes stay in the arena flagged as removed, so ids handed out
//! earlier never point at a different node.

use phylotree::tree::Tree as PhyloTree;
use std::fmt::Write as _;
use std::panic;

use crate::error::TreeError;
use crate::newick::{Statement, lex_statement, placeholder_label};

/// Index of a node inside a [`GeneTree`] arena.
pub type NodeId = usize;

/// One node of a gene tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Leaf label, or internal label such as a support value.
    pub name: Option<String>,
    /// Length of the branch leading to this node.
    pub parent_edge: Option<f64>,
    /// Text of a `[...]` comment attached to the node, brackets excluded.
    pub comment: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    removed: bool,
}

impl Node {
    fn new(name: Option<String>, parent_edge: Option<f64>, parent: Option<NodeId>) -> Self {
        Node { name, parent_edge, comment: None, parent, children: Vec::new(), removed: false }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A rooted (or arbitrarily rooted) phylogenetic tree open to leaf removal.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl GeneTree {
    /// Parse the first Newick statement of `newick`, e.g. `((A:0.1,B:0.2):0.3,C:0.4);`.
    ///
    /// A bare `label;` gives a single-leaf tree and `;` an empty one.
    pub fn from_newick(newick: &str) -> Result<Self, TreeError> {
        match lex_statement(newick)? {
            Statement::Empty => Ok(GeneTree { nodes: Vec::new(), root: None }),
            Statement::Leaf { name, comment } => {
                let mut leaf = Node::new(name, None, None);
                leaf.comment = comment;
                Ok(GeneTree { nodes: vec![leaf], root: Some(0) })
            }
            Statement::Nested { skeleton, labels } => {
                let parsed = panic::catch_unwind(|| PhyloTree::from_newick(&skeleton))
                    .map_err(|_| TreeError::Parse("rejected by the Newick parser".to_string()))?
                    .map_err(|e| TreeError::Parse(e.to_string()))?;
                Self::from_phylo(&parsed, &labels)
            }
        }
    }

    /// Copy a `phylotree` parse of a placeholder skeleton into the arena,
    /// keeping child order and restoring the real labels.
    fn from_phylo(tree: &PhyloTree, labels: &[String]) -> Result<Self, TreeError> {
        let phylo_root = tree.get_root().map_err(|e| TreeError::Parse(e.to_string()))?;

        let mut nodes: Vec<Node> = Vec::new();
        // (phylotree id, arena id of the parent)
        let mut stack: Vec<(usize, Option<NodeId>)> = vec![(phylo_root, None)];

        while let Some((phylo_id, parent)) = stack.pop() {
            let source = tree.get(&phylo_id).map_err(|e| TreeError::Parse(e.to_string()))?;
            let name = match source.name.as_deref() {
                Some(placeholder) => Some(
                    placeholder_label(labels, placeholder)
                        .ok_or_else(|| TreeError::Parse(format!("unexpected label '{placeholder}'")))?
                        .to_string(),
                ),
                None => None,
            };
            let id = nodes.len();
            // The root edge carries no information once the tree is rewritten.
            let edge = if parent.is_some() { source.parent_edge } else { None };
            let mut node = Node::new(name, edge, parent);
            node.comment = source.comment.clone();
            nodes.push(node);
            if let Some(p) = parent {
                nodes[p].children.push(id);
            }
            // Reverse so children are popped, and therefore appended, in order.
            for &child in source.children.iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        let root = if nodes.is_empty() { None } else { Some(0) };
        Ok(GeneTree { nodes, root })
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// True once every node has been removed.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Look up a live node.
    pub fn get(&self, id: NodeId) -> Result<&Node, TreeError> {
        match self.nodes.get(id) {
            Some(node) if !node.removed => Ok(node),
            _ => Err(TreeError::UnknownNode(id)),
        }
    }

    /// Label of a live node, `None` for unnamed or unknown nodes.
    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.get(id).ok()?.name.as_deref()
    }

    /// Live nodes in preorder (parent before children, children in order).
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        order
    }

    /// Terminal nodes in preorder.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.nodes[id].is_leaf())
            .collect()
    }

    pub fn n_leaves(&self) -> usize {
        self.leaves().len()
    }

    /// Leaf labels in preorder; unnamed leaves read as `""`.
    pub fn leaf_labels(&self) -> Vec<&str> {
        self.leaves()
            .into_iter()
            .map(|id| self.nodes[id].name.as_deref().unwrap_or(""))
            .collect()
    }

    /// Remove a leaf and restore a well formed tree.
    ///
    /// Walking up from the removed leaf:
    /// - an internal node left without children is removed as well;
    /// - a non-root node left with one child is spliced out, the child
    ///   taking over the summed branch length and the position among its
    ///   new siblings;
    /// - a root left with one child is replaced by that child, whose
    ///   branch length is dropped.
    ///
    /// # Errors
    /// `UnknownNode` for ids that are out of range or already removed,
    /// `NotALeaf` for internal nodes.
    pub fn remove_leaf(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.get(id)?;
        if !node.is_leaf() {
            return Err(TreeError::NotALeaf(id));
        }
        let parent = node.parent;

        self.nodes[id].removed = true;
        match parent {
            Some(p) => {
                self.detach(p, id);
                self.collapse_from(p);
            }
            None => self.root = None,
        }
        Ok(())
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].children.retain(|&c| c != child);
    }

    fn collapse_from(&mut self, mut id: NodeId) {
        loop {
            match self.nodes[id].children.len() {
                0 => {
                    self.nodes[id].removed = true;
                    match self.nodes[id].parent {
                        Some(p) => {
                            self.detach(p, id);
                            id = p;
                        }
                        None => {
                            self.root = None;
                            return;
                        }
                    }
                }
                1 => {
                    let child = self.nodes[id].children[0];
                    self.nodes[id].removed = true;
                    match self.nodes[id].parent {
                        Some(grandparent) => {
                            let edge = sum_edges(self.nodes[id].parent_edge, self.nodes[child].parent_edge);
                            self.nodes[child].parent_edge = edge;
                            self.nodes[child].parent = Some(grandparent);
                            for slot in self.nodes[grandparent].children.iter_mut() {
                                if *slot == id {
                                    *slot = child;
                                }
                            }
                        }
                        None => {
                            self.nodes[child].parent = None;
                            self.nodes[child].parent_edge = None;
                            self.root = Some(child);
                        }
                    }
                    return;
                }
                _ => return,
            }
        }
    }

    /// Render as a single Newick statement terminated by `;`.
    ///
    /// Labels containing Newick punctuation, quotes or whitespace are single
    /// quoted. An empty tree renders as `;`.
    pub fn to_newick(&self) -> String {
        enum Step {
            Enter(NodeId),
            Comma,
            Close(NodeId),
        }

        let mut out = String::new();
        let mut steps: Vec<Step> = self.root.into_iter().map(Step::Enter).collect();
        while let Some(step) = steps.pop() {
            match step {
                Step::Enter(id) if !self.nodes[id].children.is_empty() => {
                    out.push('(');
                    steps.push(Step::Close(id));
                    for (k, &child) in self.nodes[id].children.iter().enumerate().rev() {
                        steps.push(Step::Enter(child));
                        if k > 0 {
                            steps.push(Step::Comma);
                        }
                    }
                }
                Step::Enter(id) => self.write_suffix(id, &mut out),
                Step::Comma => out.push(','),
                Step::Close(id) => {
                    out.push(')');
                    self.write_suffix(id, &mut out);
                }
            }
        }
        out.push(';');
        out
    }

    fn write_suffix(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        if let Some(name) = &node.name {
            out.push_str(&quote_label(name));
        }
        // Writing into a String cannot fail.
        if let Some(length) = node.parent_edge {
            let _ = write!(out, ":{length}");
        }
        if let Some(comment) = &node.comment {
            let _ = write!(out, "[{comment}]");
        }
    }
}

fn sum_edges(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        (a, None) => a,
        (None, b) => b,
    }
}

fn quote_label(label: &str) -> String {
    let needs_quotes = label
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '\'' | '"' | ':' | ';' | ','));
    if needs_quotes {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}
