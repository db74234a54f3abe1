// Copyright 2023 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the labelled domain tree underlying zone storage.
//!
//! A [`LabelTree`] stores the owner names of a zone keyed by label
//! sequences, suffix first: the tree's root node carries the zone
//! origin, and each descendant node carries the labels that extend its
//! parent's name leftward. A node's label fragment may span several
//! labels: `b.a.wild.example.` in an otherwise empty `example.` zone
//! occupies a single node with the fragment `b.a.wild`, and inserting
//! `*.wild.example.` afterwards splits that node so the shared suffix
//! `wild` becomes a node of its own. Splitting is what makes empty
//! non-terminals and wildcard-cancelling siblings visible to the
//! lookup algorithm: a search that stops against the middle of a
//! fragment reports the precise [`NameRelation`] it stopped with.
//!
//! Nodes live in an arena ([`Vec`]) and refer to each other by 32-bit
//! [`NodeId`] indices, so parent links do not require shared ownership.
//! Each node's children are kept sorted in canonical DNS order
//! ([RFC 4034 § 6.1]), which gives the tree a defined owner-name order:
//! a node precedes its descendants, and siblings follow their fragment
//! ordering. [`LabelTree::previous_node`] walks this order backwards
//! from the position recorded in a [`ZoneChain`] by a search.
//!
//! [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1

use std::cmp::Ordering;

use crate::name::{LabelSeq, Name, NameComparison, NameRelation};
use crate::rr::RdataSetList;

////////////////////////////////////////////////////////////////////////
// NODES                                                              //
////////////////////////////////////////////////////////////////////////

/// An index identifying a node of a [`LabelTree`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct NodeId(u32);

/// The root node of every [`LabelTree`] (the node carrying the zone
/// origin).
pub(crate) const ROOT: NodeId = NodeId(0);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node of a [`LabelTree`].
pub(crate) struct TreeNode {
    /// The labels this node adds to the left of its parent's name.
    labels: Fragment,

    /// The parent node; `None` only for the root.
    parent: Option<NodeId>,

    /// Child nodes, sorted by fragment in canonical DNS order.
    children: Vec<NodeId>,

    /// The record sets at this owner name. An empty list makes the
    /// node an empty non-terminal.
    pub data: RdataSetList,

    /// Set when a search descending through this node must invoke the
    /// cut callback (the node owns an NS RRset away from the origin, or
    /// a DNAME RRset).
    pub callback: bool,

    /// Set when this node has a child whose leftmost label is `*`.
    pub wildcard: bool,
}

/// An owned label fragment: the labels of one tree node.
struct Fragment {
    offsets: Box<[u8]>,
    wire: Box<[u8]>,
}

impl Fragment {
    fn from_seq(seq: LabelSeq) -> Self {
        let wire: Box<[u8]> = seq.wire_octets().into();
        let mut offsets = Vec::with_capacity(seq.len());
        let mut pos = 0;
        for _ in 0..seq.len() {
            offsets.push(pos as u8);
            pos += 1 + wire[pos] as usize;
        }
        Self {
            offsets: offsets.into_boxed_slice(),
            wire,
        }
    }

    fn seq(&self) -> LabelSeq {
        LabelSeq::new(&self.offsets, &self.wire)
    }

    fn len(&self) -> usize {
        self.offsets.len()
    }

    fn wire_octets(&self) -> &[u8] {
        &self.wire
    }
}

////////////////////////////////////////////////////////////////////////
// SEARCH CHAINS                                                      //
////////////////////////////////////////////////////////////////////////

/// The traversal state produced by [`LabelTree::find`]: the
/// comparison that stopped the search and the position from which
/// [`LabelTree::previous_node`] resumes.
#[derive(Default)]
pub(crate) struct ZoneChain {
    /// The node the stopping comparison was made against.
    last_compared: Option<NodeId>,

    /// The comparison (query remainder versus that node's fragment)
    /// that stopped the search.
    last_comparison: Option<NameComparison>,

    /// For a partial match: the existing node immediately preceding the
    /// searched name in owner-name order.
    seed_lower: Option<NodeId>,

    /// The current position of a `previous_node` walk.
    walk: Option<NodeId>,
}

impl ZoneChain {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn clear(&mut self) {
        self.last_compared = None;
        self.last_comparison = None;
        self.seed_lower = None;
        self.walk = None;
    }

    /// Returns the comparison result that stopped the last search.
    pub fn last_comparison(&self) -> Option<NameComparison> {
        self.last_comparison
    }

    /// Returns the node the stopping comparison was made against.
    pub fn last_compared(&self) -> Option<NodeId> {
        self.last_compared
    }
}

/// The outcome of a [`LabelTree::find`] call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum TreeFindResult {
    /// Every label of the searched name was consumed; the node is the
    /// exact match.
    ExactMatch(NodeId),

    /// The search stopped at the deepest existing ancestor of the
    /// searched name (or at the node whose cut callback claimed the
    /// search).
    PartialMatch(NodeId),

    /// The searched name is outside the tree's root domain.
    NotFound,
}

/// The outcome of searching one node's children for the query
/// remainder.
enum ChildSearch {
    Exact(NodeId),
    Descend(NodeId),
    Stop {
        compared: Option<NodeId>,
        comparison: Option<NameComparison>,
        lower: Option<NodeId>,
    },
}

////////////////////////////////////////////////////////////////////////
// THE TREE                                                           //
////////////////////////////////////////////////////////////////////////

/// A labelled domain tree; see the module documentation.
pub(crate) struct LabelTree {
    nodes: Vec<TreeNode>,
}

impl LabelTree {
    /// Creates a tree whose root node carries `origin`.
    pub fn new(origin: &Name) -> Self {
        Self {
            nodes: vec![TreeNode {
                labels: Fragment::from_seq(origin.seq()),
                parent: None,
                children: Vec::new(),
                data: RdataSetList::new(),
                callback: false,
                wildcard: false,
            }],
        }
    }

    /// Returns the node identified by `id`.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.index()]
    }

    /// Returns the record sets at `id`.
    pub fn data(&self, id: NodeId) -> &RdataSetList {
        &self.node(id).data
    }

    pub fn data_mut(&mut self, id: NodeId) -> &mut RdataSetList {
        &mut self.node_mut(id).data
    }

    pub fn set_callback(&mut self, id: NodeId) {
        self.node_mut(id).callback = true;
    }

    pub fn set_wildcard(&mut self, id: NodeId) {
        self.node_mut(id).wildcard = true;
    }

    /// Reconstructs the full owner name of `id` from the fragments on
    /// its path to the root.
    pub fn name_of(&self, id: NodeId) -> Name {
        let mut wire = Vec::new();
        let mut cur = Some(id);
        while let Some(n) = cur {
            let node = self.node(n);
            wire.extend_from_slice(node.labels.wire_octets());
            cur = node.parent;
        }
        Name::from_wire_unchecked(wire)
    }

    ////////////////////////////////////////////////////////////////////
    // SEARCHING                                                      //
    ////////////////////////////////////////////////////////////////////

    /// Searches the tree for `name` without a cut callback.
    pub fn find(&self, name: LabelSeq, chain: &mut ZoneChain) -> TreeFindResult {
        self.find_with_callback(name, chain, |_, _| false)
    }

    /// Searches the tree for `name`, descending suffix-first.
    ///
    /// For every node descended *through* (not the final exact match)
    /// whose `callback` flag is set, `cut_cb` is invoked; if it returns
    /// `true`, it has claimed the search (a zone cut or DNAME), descent
    /// halts, and the callback node is returned as a partial match.
    ///
    /// On a partial match, the chain records the stopping comparison
    /// and the owner-name-order position of the searched name, so that
    /// [`LabelTree::previous_node`] can walk backwards from it.
    pub fn find_with_callback<'t, F>(
        &'t self,
        name: LabelSeq,
        chain: &mut ZoneChain,
        mut cut_cb: F,
    ) -> TreeFindResult
    where
        F: FnMut(NodeId, &'t TreeNode) -> bool,
    {
        chain.clear();
        let root = self.node(ROOT);
        let cmp = name.compare(root.labels.seq());
        match cmp.relation {
            NameRelation::Equal => {
                chain.walk = Some(ROOT);
                return TreeFindResult::ExactMatch(ROOT);
            }
            NameRelation::Subdomain => (),
            _ => return TreeFindResult::NotFound,
        }
        let mut remaining = name.split(0, name.len() - root.labels.len());
        if root.callback && cut_cb(ROOT, root) {
            return TreeFindResult::PartialMatch(ROOT);
        }

        let mut cur = ROOT;
        loop {
            match self.search_children(cur, remaining) {
                ChildSearch::Exact(child) => {
                    chain.walk = Some(child);
                    return TreeFindResult::ExactMatch(child);
                }
                ChildSearch::Descend(child) => {
                    let child_node = self.node(child);
                    remaining = remaining.split(0, remaining.len() - child_node.labels.len());
                    if child_node.callback && cut_cb(child, child_node) {
                        return TreeFindResult::PartialMatch(child);
                    }
                    cur = child;
                }
                ChildSearch::Stop {
                    compared,
                    comparison,
                    lower,
                } => {
                    chain.last_compared = compared;
                    chain.last_comparison = comparison;
                    chain.seed_lower = Some(match lower {
                        Some(sibling) => self.largest_in_subtree(sibling),
                        None => cur,
                    });
                    return TreeFindResult::PartialMatch(cur);
                }
            }
        }
    }

    /// Locates `remaining` among the children of `parent` by binary
    /// search. Returns the insertion point and, if some child is
    /// hierarchically related to `remaining` (any relation other than
    /// [`NameRelation::None`]), that child and the comparison.
    ///
    /// Siblings are pairwise disjoint, so the query orders identically
    /// to its related sibling against every other sibling; the binary
    /// search therefore cannot narrow the related sibling out of its
    /// bracket.
    fn locate_child(
        &self,
        parent: NodeId,
        remaining: LabelSeq,
    ) -> (usize, Option<(NodeId, NameComparison)>) {
        let children = &self.node(parent).children;
        let mut lo = 0;
        let mut hi = children.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            let child = children[mid];
            let cmp = remaining.compare(self.node(child).labels.seq());
            if cmp.relation != NameRelation::None {
                return (mid, Some((child, cmp)));
            }
            match cmp.order {
                Ordering::Less => hi = mid,
                Ordering::Greater => lo = mid + 1,
                // Equal order with no shared labels cannot happen.
                Ordering::Equal => unreachable!(),
            }
        }
        (lo, None)
    }

    /// Searches the children of `parent` for the query remainder and
    /// classifies the outcome for `find_with_callback`.
    fn search_children(&self, parent: NodeId, remaining: LabelSeq) -> ChildSearch {
        let (ip, related) = self.locate_child(parent, remaining);
        let children = &self.node(parent).children;
        match related {
            Some((child, cmp)) => match cmp.relation {
                NameRelation::Equal => ChildSearch::Exact(child),
                NameRelation::Subdomain => ChildSearch::Descend(child),
                _ => {
                    // Superdomain or CommonAncestor: the search stops
                    // here. Identify the sibling (subtree) preceding
                    // the query in owner-name order.
                    let lower = if cmp.order == Ordering::Greater {
                        Some(child)
                    } else if ip > 0 {
                        Some(children[ip - 1])
                    } else {
                        None
                    };
                    ChildSearch::Stop {
                        compared: Some(child),
                        comparison: Some(cmp),
                        lower,
                    }
                }
            },
            None => {
                let (compared, comparison) = if children.is_empty() {
                    (None, None)
                } else {
                    // Record the boundary sibling the query fell
                    // against, for callers inspecting the stop state.
                    let idx = ip.min(children.len() - 1);
                    let child = children[idx];
                    let cmp = remaining.compare(self.node(child).labels.seq());
                    (Some(child), Some(cmp))
                };
                let lower = if ip > 0 { Some(children[ip - 1]) } else { None };
                ChildSearch::Stop {
                    compared,
                    comparison,
                    lower,
                }
            }
        }
    }

    ////////////////////////////////////////////////////////////////////
    // INSERTION                                                      //
    ////////////////////////////////////////////////////////////////////

    /// Inserts `name` into the tree, creating (and splitting) nodes as
    /// needed, and returns its node. `name` must be at or below the
    /// tree's root domain.
    pub fn insert(&mut self, name: &Name) -> NodeId {
        let root = self.node(ROOT);
        let cmp = name.seq().compare(root.labels.seq());
        let root_labels = root.labels.len();
        match cmp.relation {
            NameRelation::Equal => return ROOT,
            NameRelation::Subdomain => (),
            _ => {
                debug_assert!(false, "inserted name {} is outside the tree", name);
                return ROOT;
            }
        }

        let mut remaining = name.seq().split(0, name.len() - root_labels);
        let mut cur = ROOT;
        loop {
            let (ip, related) = self.locate_child(cur, remaining);
            match related {
                Some((child, cmp)) => match cmp.relation {
                    NameRelation::Equal => return child,
                    NameRelation::Subdomain => {
                        let consumed = self.node(child).labels.len();
                        remaining = remaining.split(0, remaining.len() - consumed);
                        cur = child;
                    }
                    NameRelation::Superdomain => {
                        // The inserted name ends inside this child's
                        // fragment; the split node is the new name.
                        return self.split_node(child, cmp.common_labels);
                    }
                    NameRelation::CommonAncestor => {
                        let mid = self.split_node(child, cmp.common_labels);
                        let rest = remaining.split(0, remaining.len() - cmp.common_labels);
                        let (rest_ip, rest_related) = self.locate_child(mid, rest);
                        debug_assert!(rest_related.is_none());
                        return self.add_child(mid, rest_ip, rest);
                    }
                    NameRelation::None => unreachable!(),
                },
                None => return self.add_child(cur, ip, remaining),
            }
        }
    }

    /// Creates a new node with fragment `labels` as child number `ip`
    /// of `parent`.
    fn add_child(&mut self, parent: NodeId, ip: usize, labels: LabelSeq) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(TreeNode {
            labels: Fragment::from_seq(labels),
            parent: Some(parent),
            children: Vec::new(),
            data: RdataSetList::new(),
            callback: false,
            wildcard: false,
        });
        self.node_mut(parent).children.insert(ip, id);
        id
    }

    /// Splits `child` so that the trailing `keep` labels of its
    /// fragment become a new intermediate node. `child` keeps the
    /// leading labels along with its data, flags, and children, and
    /// becomes the sole child of the new node. The new node is an empty
    /// non-terminal until records are added to it.
    ///
    /// The new node inherits `child`'s position among its siblings;
    /// this preserves their ordering, since the ordering of disjoint
    /// siblings is decided by labels the split does not remove.
    fn split_node(&mut self, child: NodeId, keep: usize) -> NodeId {
        let (suffix, prefix, parent) = {
            let node = self.node(child);
            let frag = node.labels.seq();
            debug_assert!(keep >= 1 && keep < frag.len());
            (
                Fragment::from_seq(frag.split(frag.len() - keep, keep)),
                Fragment::from_seq(frag.split(0, frag.len() - keep)),
                node.parent.expect("split of a root node"),
            )
        };

        let mid = NodeId(self.nodes.len() as u32);
        self.nodes.push(TreeNode {
            labels: suffix,
            parent: Some(parent),
            children: vec![child],
            data: RdataSetList::new(),
            callback: false,
            wildcard: false,
        });

        let pos = self
            .node(parent)
            .children
            .iter()
            .position(|&c| c == child)
            .unwrap();
        self.node_mut(parent).children[pos] = mid;

        let child_node = self.node_mut(child);
        child_node.labels = prefix;
        child_node.parent = Some(mid);
        mid
    }

    ////////////////////////////////////////////////////////////////////
    // OWNER-NAME-ORDER NAVIGATION                                    //
    ////////////////////////////////////////////////////////////////////

    /// Returns the node preceding `id` among its siblings, if any.
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        let children = &self.node(parent).children;
        let pos = children.iter().position(|&c| c == id).unwrap();
        if pos > 0 {
            Some(children[pos - 1])
        } else {
            None
        }
    }

    /// Returns the rightmost descendant of `id` (`id` itself if it has
    /// no children): the largest name of the subtree in owner-name
    /// order.
    pub fn largest_in_subtree(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(&last) = self.node(cur).children.last() {
            cur = last;
        }
        cur
    }

    /// Returns the node preceding `id` in owner-name order.
    fn node_predecessor(&self, id: NodeId) -> Option<NodeId> {
        match self.previous_sibling(id) {
            Some(sibling) => Some(self.largest_in_subtree(sibling)),
            None => self.node(id).parent,
        }
    }

    /// Steps the chain backwards through the tree in owner-name order
    /// and returns the node reached, or `None` at the root.
    ///
    /// The first call after a search positions the walk at the name
    /// preceding the searched name (for an exact match, the found node
    /// is the starting position and its predecessor is returned).
    /// Owner names that exist only implicitly inside a fragment are
    /// skipped, as are positions recorded by a callback-claimed search
    /// (which has no walk position).
    pub fn previous_node(&self, chain: &mut ZoneChain) -> Option<NodeId> {
        if let Some(seed) = chain.seed_lower.take() {
            chain.walk = Some(seed);
            return Some(seed);
        }
        let cur = chain.walk?;
        let prev = self.node_predecessor(cur)?;
        chain.walk = Some(prev);
        Some(prev)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    fn tree_with(origin: &str, names: &[&str]) -> LabelTree {
        let mut tree = LabelTree::new(&name(origin));
        for n in names {
            tree.insert(&name(n));
        }
        tree
    }

    #[test]
    fn insert_compresses_label_runs() {
        let mut tree = tree_with("example.", &[]);
        let node = tree.insert(&name("b.a.wild.example."));
        // A single node holds the whole run of new labels.
        assert_eq!(tree.node(node).labels.seq().to_string(), "b.a.wild.");
        assert_eq!(tree.name_of(node).to_string(), "b.a.wild.example.");
    }

    #[test]
    fn insert_splits_fragments_on_shared_suffixes() {
        let mut tree = tree_with("example.", &["b.a.wild.example."]);
        let star = tree.insert(&name("*.wild.example."));

        // The shared suffix "wild" must now be a node of its own, with
        // the two divergent fragments below it.
        let mut chain = ZoneChain::new();
        match tree.find(name("wild.example.").seq(), &mut chain) {
            TreeFindResult::ExactMatch(wild) => {
                assert_eq!(tree.node(wild).labels.seq().to_string(), "wild.");
                assert_eq!(tree.node(wild).children.len(), 2);
                assert!(tree.node(wild).data.is_empty());
            }
            other => panic!("expected an exact match, got {:?}", other),
        }
        assert_eq!(tree.name_of(star).to_string(), "*.wild.example.");
    }

    #[test]
    fn insert_splits_fragments_on_interior_names() {
        let mut tree = tree_with("example.", &["b.a.wild.example."]);
        let a = tree.insert(&name("a.wild.example."));
        assert_eq!(tree.name_of(a).to_string(), "a.wild.example.");
        assert_eq!(tree.node(a).labels.seq().to_string(), "a.wild.");
        assert_eq!(tree.node(a).children.len(), 1);
    }

    #[test]
    fn find_reports_exact_and_partial_matches() {
        let tree = tree_with("example.", &["a.example.", "b.a.wild.example."]);
        let mut chain = ZoneChain::new();

        assert!(matches!(
            tree.find(name("a.example.").seq(), &mut chain),
            TreeFindResult::ExactMatch(_)
        ));

        // Nothing below a.example. exists, so the search stops there.
        match tree.find(name("x.a.example.").seq(), &mut chain) {
            TreeFindResult::PartialMatch(node) => {
                assert_eq!(tree.name_of(node).to_string(), "a.example.");
            }
            other => panic!("expected a partial match, got {:?}", other),
        }
    }

    #[test]
    fn find_reports_superdomain_stops() {
        let tree = tree_with("example.", &["b.a.wild.example."]);
        let mut chain = ZoneChain::new();

        // a.wild.example. exists only inside the fragment "b.a.wild";
        // the search must stop against it with a superdomain relation.
        match tree.find(name("a.wild.example.").seq(), &mut chain) {
            TreeFindResult::PartialMatch(node) => {
                assert_eq!(node, ROOT);
                let cmp = chain.last_comparison().unwrap();
                assert_eq!(cmp.relation, NameRelation::Superdomain);
            }
            other => panic!("expected a partial match, got {:?}", other),
        }
    }

    #[test]
    fn find_reports_common_ancestor_stops() {
        let tree = tree_with("example.", &["*.wild.example.", "b.a.wild.example."]);
        let mut chain = ZoneChain::new();

        match tree.find(name("c.a.wild.example.").seq(), &mut chain) {
            TreeFindResult::PartialMatch(node) => {
                assert_eq!(tree.name_of(node).to_string(), "wild.example.");
                let cmp = chain.last_comparison().unwrap();
                assert_eq!(cmp.relation, NameRelation::CommonAncestor);
            }
            other => panic!("expected a partial match, got {:?}", other),
        }
    }

    #[test]
    fn find_rejects_names_outside_the_root_domain() {
        let tree = tree_with("example.", &[]);
        let mut chain = ZoneChain::new();
        assert_eq!(
            tree.find(name("com.").seq(), &mut chain),
            TreeFindResult::NotFound
        );
        assert_eq!(
            tree.find(name("other.test.").seq(), &mut chain),
            TreeFindResult::NotFound
        );
    }

    #[test]
    fn callback_halts_descent() {
        let mut tree = tree_with("example.", &["child.example.", "ns.child.example."]);
        let mut chain = ZoneChain::new();
        let child = match tree.find(name("child.example.").seq(), &mut chain) {
            TreeFindResult::ExactMatch(node) => node,
            other => panic!("expected an exact match, got {:?}", other),
        };
        tree.set_callback(child);

        // With a claiming callback, the search stops at the cut.
        let mut seen = Vec::new();
        let result = tree.find_with_callback(name("ns.child.example.").seq(), &mut chain, |id, _| {
            seen.push(id);
            true
        });
        assert_eq!(result, TreeFindResult::PartialMatch(child));
        assert_eq!(seen, [child]);

        // With a non-claiming callback, the search continues below.
        let result = tree.find_with_callback(name("ns.child.example.").seq(), &mut chain, |_, _| {
            false
        });
        assert!(matches!(result, TreeFindResult::ExactMatch(_)));
    }

    #[test]
    fn callback_is_not_invoked_for_the_exact_match_itself() {
        let mut tree = tree_with("example.", &["child.example."]);
        let mut chain = ZoneChain::new();
        let child = match tree.find(name("child.example.").seq(), &mut chain) {
            TreeFindResult::ExactMatch(node) => node,
            other => panic!("expected an exact match, got {:?}", other),
        };
        tree.set_callback(child);

        let result = tree.find_with_callback(name("child.example.").seq(), &mut chain, |_, _| {
            panic!("callback invoked at the exact match");
        });
        assert_eq!(result, TreeFindResult::ExactMatch(child));
    }

    #[test]
    fn previous_node_walks_owner_name_order() {
        // Canonical order: example. < a.example. < child.example.
        // < ns.example. < wild.example. < *.wild.example.
        // < b.a.wild.example.
        let tree = tree_with(
            "example.",
            &[
                "ns.example.",
                "b.a.wild.example.",
                "a.example.",
                "*.wild.example.",
                "child.example.",
            ],
        );
        let mut chain = ZoneChain::new();

        // After an exact match, the walk starts at the found node.
        assert!(matches!(
            tree.find(name("b.a.wild.example.").seq(), &mut chain),
            TreeFindResult::ExactMatch(_)
        ));
        let expected = [
            "*.wild.example.",
            "wild.example.",
            "ns.example.",
            "child.example.",
            "a.example.",
            "example.",
        ];
        for text in expected {
            let prev = tree.previous_node(&mut chain).unwrap();
            assert_eq!(tree.name_of(prev).to_string(), text);
        }
        assert!(tree.previous_node(&mut chain).is_none());
    }

    #[test]
    fn previous_node_seeds_from_a_partial_match() {
        let tree = tree_with(
            "example.",
            &["a.example.", "child.example.", "ns.child.example."],
        );
        let mut chain = ZoneChain::new();

        // d.example. sorts between child.example. (whose subtree ends
        // with ns.child.example.) and nothing else.
        assert!(matches!(
            tree.find(name("d.example.").seq(), &mut chain),
            TreeFindResult::PartialMatch(ROOT)
        ));
        let prev = tree.previous_node(&mut chain).unwrap();
        assert_eq!(tree.name_of(prev).to_string(), "ns.child.example.");
        let prev = tree.previous_node(&mut chain).unwrap();
        assert_eq!(tree.name_of(prev).to_string(), "child.example.");

        // A name sorting before every child of its closest ancestor
        // seeds the walk at that ancestor itself.
        assert!(matches!(
            tree.find(name("0.example.").seq(), &mut chain),
            TreeFindResult::PartialMatch(ROOT)
        ));
        let prev = tree.previous_node(&mut chain).unwrap();
        assert_eq!(prev, ROOT);
        assert!(tree.previous_node(&mut chain).is_none());
    }

    #[test]
    fn largest_in_subtree_returns_the_rightmost_descendant() {
        let tree = tree_with(
            "example.",
            &["a.example.", "z.example.", "m.z.example.", "z.z.example."],
        );
        let largest = tree.largest_in_subtree(ROOT);
        assert_eq!(tree.name_of(largest).to_string(), "z.z.example.");
    }
}
