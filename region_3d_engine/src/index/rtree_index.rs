/// RTreeIndex: dynamic R-tree spatial index over region AABBs.
///
/// Nodes live in a flat arena addressed by index, with parent links and
/// a free list for recycled slots; splits and merges reassign indices
/// instead of rewiring a pointer graph. A reverse key-to-leaf map gives
/// O(1) removal without a tree search.
///
/// Split policy is Guttman's quadratic split. Enlargement is measured
/// by surface area rather than volume so flat (planar-region) boxes
/// still order meaningfully.

use glam::DVec3;
use rustc_hash::FxHashMap;

use crate::error::{Region3dError, Region3dResult};
use crate::geometry::{Aabb, RegionKey};
use super::spatial_index::SpatialIndex;

/// Maximum entries or children per node before it splits.
const MAX_ENTRIES: usize = 8;

/// Minimum entries or children per non-root node; below this the node
/// is dissolved and its entries reinserted.
const MIN_ENTRIES: usize = 3;

/// Sentinel parent index for the root.
const NIL: usize = usize::MAX;

/// The unit stored in leaves: an internal region key plus the AABB it
/// was inserted with. A projection of registry state, never an owner.
#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    key: RegionKey,
    aabb: Aabb,
}

#[derive(Debug)]
enum NodeKind {
    /// Internal node: arena indices of the children
    Internal { children: Vec<usize> },
    /// Leaf node: the indexed entries
    Leaf { entries: Vec<IndexEntry> },
}

/// A single arena node.
#[derive(Debug)]
struct Node {
    /// Minimal box over all descendant entry AABBs
    aabb: Aabb,
    /// Arena index of the parent (NIL for the root)
    parent: usize,
    kind: NodeKind,
}

/// Dynamic R-tree over region AABBs.
pub struct RTreeIndex {
    /// Flat arena of nodes; freed slots are recycled via `free_list`
    nodes: Vec<Node>,
    /// Recycled arena slots
    free_list: Vec<usize>,
    /// Arena index of the root node
    root: usize,
    /// Reverse lookup: entry key to the leaf holding it
    locations: FxHashMap<RegionKey, usize>,
    /// Number of entries
    len: usize,
}

impl RTreeIndex {
    /// Create an empty index (a single empty leaf as root).
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                aabb: Aabb::empty(),
                parent: NIL,
                kind: NodeKind::Leaf { entries: Vec::new() },
            }],
            free_list: Vec::new(),
            root: 0,
            locations: FxHashMap::default(),
            len: 0,
        }
    }

    // ===== ARENA =====

    /// Allocate an arena slot, recycling from the free list first.
    fn alloc_node(&mut self, node: Node) -> usize {
        if let Some(idx) = self.free_list.pop() {
            self.nodes[idx] = node;
            idx
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    /// Return an arena slot to the free list.
    fn free_node(&mut self, idx: usize) {
        self.free_list.push(idx);
    }

    /// Entry count of a leaf, child count of an internal node.
    fn node_count(&self, n: usize) -> usize {
        match &self.nodes[n].kind {
            NodeKind::Leaf { entries } => entries.len(),
            NodeKind::Internal { children } => children.len(),
        }
    }

    // ===== BOX MAINTENANCE =====

    /// Recompute a node's AABB as the exact union over its contents.
    fn recompute_aabb(&mut self, n: usize) {
        let aabb = match &self.nodes[n].kind {
            NodeKind::Leaf { entries } => entries
                .iter()
                .fold(Aabb::empty(), |acc, e| acc.union(&e.aabb)),
            NodeKind::Internal { children } => children
                .iter()
                .fold(Aabb::empty(), |acc, &c| acc.union(&self.nodes[c].aabb)),
        };
        self.nodes[n].aabb = aabb;
    }

    /// Recompute AABBs from a node up to the root, keeping every
    /// ancestor box minimal after an entry changed below.
    fn tighten_upward(&mut self, mut n: usize) {
        loop {
            self.recompute_aabb(n);
            let parent = self.nodes[n].parent;
            if parent == NIL {
                break;
            }
            n = parent;
        }
    }

    // ===== INSERTION =====

    /// Descend to the leaf whose box needs the least surface-area
    /// enlargement to take the AABB; ties go to the smaller box, then
    /// to child order (deterministic).
    fn choose_leaf(&self, aabb: &Aabb) -> usize {
        let mut n = self.root;
        loop {
            match &self.nodes[n].kind {
                NodeKind::Leaf { .. } => return n,
                NodeKind::Internal { children } => {
                    let mut best = children[0];
                    let mut best_enlargement = f64::MAX;
                    let mut best_area = f64::MAX;
                    for &c in children {
                        let area = self.nodes[c].aabb.surface_area();
                        let enlargement = self.nodes[c].aabb.union(aabb).surface_area() - area;
                        if enlargement < best_enlargement
                            || (enlargement == best_enlargement && area < best_area)
                        {
                            best = c;
                            best_enlargement = enlargement;
                            best_area = area;
                        }
                    }
                    n = best;
                }
            }
        }
    }

    /// Place an entry without touching `len` (shared by insert and the
    /// orphan reinsertion done while condensing).
    fn insert_entry(&mut self, entry: IndexEntry) {
        let leaf = self.choose_leaf(&entry.aabb);
        self.locations.insert(entry.key, leaf);
        match &mut self.nodes[leaf].kind {
            NodeKind::Leaf { entries } => entries.push(entry),
            NodeKind::Internal { .. } => unreachable!("choose_leaf returned an internal node"),
        }
        self.tighten_upward(leaf);
        if self.node_count(leaf) > MAX_ENTRIES {
            self.split_node(leaf);
        }
    }

    /// Split an overflowing node into itself plus a new sibling,
    /// propagating upward (growing a new root if needed).
    fn split_node(&mut self, n: usize) {
        let is_leaf = matches!(self.nodes[n].kind, NodeKind::Leaf { .. });
        let sibling_kind = if is_leaf {
            let entries = match &mut self.nodes[n].kind {
                NodeKind::Leaf { entries } => std::mem::take(entries),
                NodeKind::Internal { .. } => unreachable!(),
            };
            let items: Vec<(Aabb, IndexEntry)> = entries.into_iter().map(|e| (e.aabb, e)).collect();
            let (keep, moved) = quadratic_partition(items);
            match &mut self.nodes[n].kind {
                NodeKind::Leaf { entries } => {
                    *entries = keep.into_iter().map(|(_, e)| e).collect();
                }
                NodeKind::Internal { .. } => unreachable!(),
            }
            NodeKind::Leaf {
                entries: moved.into_iter().map(|(_, e)| e).collect(),
            }
        } else {
            let children = match &mut self.nodes[n].kind {
                NodeKind::Internal { children } => std::mem::take(children),
                NodeKind::Leaf { .. } => unreachable!(),
            };
            let items: Vec<(Aabb, usize)> = children
                .into_iter()
                .map(|c| (self.nodes[c].aabb, c))
                .collect();
            let (keep, moved) = quadratic_partition(items);
            match &mut self.nodes[n].kind {
                NodeKind::Internal { children } => {
                    *children = keep.into_iter().map(|(_, c)| c).collect();
                }
                NodeKind::Leaf { .. } => unreachable!(),
            }
            NodeKind::Internal {
                children: moved.into_iter().map(|(_, c)| c).collect(),
            }
        };

        let parent = self.nodes[n].parent;
        let sibling = self.alloc_node(Node {
            aabb: Aabb::empty(),
            parent: NIL,
            kind: sibling_kind,
        });

        // Moved contents now answer to the sibling.
        let mut moved_keys: Vec<RegionKey> = Vec::new();
        let mut moved_children: Vec<usize> = Vec::new();
        match &self.nodes[sibling].kind {
            NodeKind::Leaf { entries } => {
                moved_keys = entries.iter().map(|e| e.key).collect();
            }
            NodeKind::Internal { children } => {
                moved_children = children.clone();
            }
        }
        for key in moved_keys {
            self.locations.insert(key, sibling);
        }
        for child in moved_children {
            self.nodes[child].parent = sibling;
        }

        self.recompute_aabb(n);
        self.recompute_aabb(sibling);

        if parent == NIL {
            // Root split: the tree grows one level.
            let new_root = self.alloc_node(Node {
                aabb: Aabb::empty(),
                parent: NIL,
                kind: NodeKind::Internal {
                    children: vec![n, sibling],
                },
            });
            self.nodes[n].parent = new_root;
            self.nodes[sibling].parent = new_root;
            self.root = new_root;
            self.recompute_aabb(new_root);
        } else {
            self.nodes[sibling].parent = parent;
            match &mut self.nodes[parent].kind {
                NodeKind::Internal { children } => children.push(sibling),
                NodeKind::Leaf { .. } => unreachable!("leaf with children"),
            }
            self.recompute_aabb(parent);
            if self.node_count(parent) > MAX_ENTRIES {
                self.split_node(parent);
            }
        }
    }

    // ===== REMOVAL =====

    /// Walk from a shrunken leaf to the root, dissolving underfull
    /// nodes and reinserting their surviving entries, then collapse
    /// single-child root chains.
    fn condense(&mut self, start: usize) {
        let mut orphans: Vec<IndexEntry> = Vec::new();
        let mut n = start;
        while n != self.root {
            let parent = self.nodes[n].parent;
            if self.node_count(n) < MIN_ENTRIES {
                match &mut self.nodes[parent].kind {
                    NodeKind::Internal { children } => {
                        if let Some(pos) = children.iter().position(|&c| c == n) {
                            children.swap_remove(pos);
                        }
                    }
                    NodeKind::Leaf { .. } => unreachable!("leaf as parent"),
                }
                self.collect_entries(n, &mut orphans);
            } else {
                self.recompute_aabb(n);
            }
            n = parent;
        }
        self.recompute_aabb(self.root);

        loop {
            let child = match &self.nodes[self.root].kind {
                NodeKind::Internal { children } if children.len() == 1 => children[0],
                _ => break,
            };
            self.free_node(self.root);
            self.nodes[child].parent = NIL;
            self.root = child;
        }

        for entry in orphans {
            self.insert_entry(entry);
        }
    }

    /// Drain every entry beneath a node into `out`, freeing the
    /// subtree's arena slots and dropping the reverse-map rows.
    fn collect_entries(&mut self, n: usize, out: &mut Vec<IndexEntry>) {
        let kind = std::mem::replace(
            &mut self.nodes[n].kind,
            NodeKind::Leaf { entries: Vec::new() },
        );
        match kind {
            NodeKind::Leaf { entries } => {
                for e in &entries {
                    self.locations.remove(&e.key);
                }
                out.extend(entries);
            }
            NodeKind::Internal { children } => {
                for c in children {
                    self.collect_entries(c, out);
                }
            }
        }
        self.free_node(n);
    }

    // ===== VALIDATION =====

    fn validate_node(&self, n: usize, is_root: bool, seen: &mut usize) -> Region3dResult<()> {
        let node = &self.nodes[n];
        let count = self.node_count(n);
        if count > MAX_ENTRIES {
            return Err(Region3dError::InvariantViolation(format!(
                "node {} holds {} items (max {})",
                n, count, MAX_ENTRIES
            )));
        }
        if !is_root && count < MIN_ENTRIES {
            return Err(Region3dError::InvariantViolation(format!(
                "non-root node {} holds {} items (min {})",
                n, count, MIN_ENTRIES
            )));
        }

        match &node.kind {
            NodeKind::Leaf { entries } => {
                let expected = entries
                    .iter()
                    .fold(Aabb::empty(), |acc, e| acc.union(&e.aabb));
                if !entries.is_empty() && expected != node.aabb {
                    return Err(Region3dError::InvariantViolation(format!(
                        "leaf {} box is not minimal",
                        n
                    )));
                }
                for e in entries {
                    if self.locations.get(&e.key) != Some(&n) {
                        return Err(Region3dError::InvariantViolation(format!(
                            "reverse map does not point entry {:?} at leaf {}",
                            e.key, n
                        )));
                    }
                    *seen += 1;
                }
            }
            NodeKind::Internal { children } => {
                if is_root && children.len() < 2 {
                    return Err(Region3dError::InvariantViolation(
                        "internal root with fewer than 2 children".to_string(),
                    ));
                }
                let expected = children
                    .iter()
                    .fold(Aabb::empty(), |acc, &c| acc.union(&self.nodes[c].aabb));
                if expected != node.aabb {
                    return Err(Region3dError::InvariantViolation(format!(
                        "internal node {} box is not minimal",
                        n
                    )));
                }
                for &c in children {
                    if self.nodes[c].parent != n {
                        return Err(Region3dError::InvariantViolation(format!(
                            "child {} does not point back at parent {}",
                            c, n
                        )));
                    }
                    self.validate_node(c, false, seen)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for RTreeIndex {
    fn default() -> Self {
        Self::new()
    }
}

// ===== SPATIAL INDEX TRAIT =====

impl SpatialIndex for RTreeIndex {
    fn insert(&mut self, key: RegionKey, aabb: &Aabb) -> Region3dResult<()> {
        if self.locations.contains_key(&key) {
            return Err(Region3dError::InvariantViolation(format!(
                "index key {:?} inserted twice",
                key
            )));
        }
        self.insert_entry(IndexEntry { key, aabb: *aabb });
        self.len += 1;
        Ok(())
    }

    fn remove(&mut self, key: RegionKey) -> Region3dResult<()> {
        let leaf = self
            .locations
            .remove(&key)
            .ok_or(Region3dError::KeyNotFound)?;
        match &mut self.nodes[leaf].kind {
            NodeKind::Leaf { entries } => {
                if let Some(pos) = entries.iter().position(|e| e.key == key) {
                    entries.swap_remove(pos);
                }
            }
            NodeKind::Internal { .. } => unreachable!("reverse map pointed at internal node"),
        }
        self.len -= 1;
        self.condense(leaf);
        Ok(())
    }

    fn update(&mut self, key: RegionKey, aabb: &Aabb) -> Region3dResult<()> {
        let leaf = *self
            .locations
            .get(&key)
            .ok_or(Region3dError::KeyNotFound)?;
        if self.nodes[leaf].aabb.contains(aabb) {
            // Small move: the new box still fits this leaf, so rewrite
            // the entry in place and re-tighten ancestor boxes. No
            // splits or merges.
            match &mut self.nodes[leaf].kind {
                NodeKind::Leaf { entries } => {
                    if let Some(e) = entries.iter_mut().find(|e| e.key == key) {
                        e.aabb = *aabb;
                    }
                }
                NodeKind::Internal { .. } => unreachable!("reverse map pointed at internal node"),
            }
            self.tighten_upward(leaf);
            Ok(())
        } else {
            self.remove(key)?;
            self.insert(key, aabb)
        }
    }

    fn query_point(&self, point: &DVec3, results: &mut Vec<RegionKey>) {
        let mut stack = vec![self.root];
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            if !node.aabb.contains_point(point) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf { entries } => {
                    for e in entries {
                        if e.aabb.contains_point(point) {
                            results.push(e.key);
                        }
                    }
                }
                NodeKind::Internal { children } => stack.extend_from_slice(children),
            }
        }
    }

    fn query_aabb(&self, aabb: &Aabb, results: &mut Vec<RegionKey>) {
        let mut stack = vec![self.root];
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            if !node.aabb.intersects(aabb) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf { entries } => {
                    for e in entries {
                        if e.aabb.intersects(aabb) {
                            results.push(e.key);
                        }
                    }
                }
                NodeKind::Internal { children } => stack.extend_from_slice(children),
            }
        }
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.free_list.clear();
        self.nodes.push(Node {
            aabb: Aabb::empty(),
            parent: NIL,
            kind: NodeKind::Leaf { entries: Vec::new() },
        });
        self.root = 0;
        self.locations.clear();
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn validate(&self) -> Region3dResult<()> {
        if self.nodes[self.root].parent != NIL {
            return Err(Region3dError::InvariantViolation(
                "root has a parent".to_string(),
            ));
        }
        let mut seen = 0;
        self.validate_node(self.root, true, &mut seen)?;
        if seen != self.len {
            return Err(Region3dError::InvariantViolation(format!(
                "tree holds {} entries but len is {}",
                seen, self.len
            )));
        }
        if self.locations.len() != self.len {
            return Err(Region3dError::InvariantViolation(format!(
                "reverse map holds {} rows but len is {}",
                self.locations.len(),
                self.len
            )));
        }
        Ok(())
    }
}

// ===== QUADRATIC SPLIT =====

/// Guttman's quadratic split over (box, payload) items.
///
/// Seeds are the pair wasting the most area when joined; remaining
/// items go one at a time, strongest preference first, to the group
/// they enlarge least. Either group is force-filled when it could
/// otherwise miss the minimum occupancy.
fn quadratic_partition<T>(mut items: Vec<(Aabb, T)>) -> (Vec<(Aabb, T)>, Vec<(Aabb, T)>) {
    let mut seed_a = 0;
    let mut seed_b = 1;
    let mut worst_waste = f64::MIN;
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            let waste = items[i].0.union(&items[j].0).surface_area()
                - items[i].0.surface_area()
                - items[j].0.surface_area();
            if waste > worst_waste {
                worst_waste = waste;
                seed_a = i;
                seed_b = j;
            }
        }
    }

    // seed_b > seed_a, so removing it first keeps seed_a stable
    let item_b = items.remove(seed_b);
    let item_a = items.remove(seed_a);
    let mut box_a = item_a.0;
    let mut box_b = item_b.0;
    let mut group_a = vec![item_a];
    let mut group_b = vec![item_b];

    while !items.is_empty() {
        if group_a.len() + items.len() <= MIN_ENTRIES {
            for (aabb, item) in items.drain(..) {
                box_a = box_a.union(&aabb);
                group_a.push((aabb, item));
            }
            break;
        }
        if group_b.len() + items.len() <= MIN_ENTRIES {
            for (aabb, item) in items.drain(..) {
                box_b = box_b.union(&aabb);
                group_b.push((aabb, item));
            }
            break;
        }

        let mut pick = 0;
        let mut pick_d_a = 0.0;
        let mut pick_d_b = 0.0;
        let mut best_diff = f64::MIN;
        for (i, (aabb, _)) in items.iter().enumerate() {
            let d_a = box_a.union(aabb).surface_area() - box_a.surface_area();
            let d_b = box_b.union(aabb).surface_area() - box_b.surface_area();
            let diff = (d_a - d_b).abs();
            if diff > best_diff {
                best_diff = diff;
                pick = i;
                pick_d_a = d_a;
                pick_d_b = d_b;
            }
        }

        let (aabb, item) = items.remove(pick);
        let to_a = pick_d_a < pick_d_b
            || (pick_d_a == pick_d_b
                && (box_a.surface_area() < box_b.surface_area()
                    || (box_a.surface_area() == box_b.surface_area()
                        && group_a.len() <= group_b.len())));
        if to_a {
            box_a = box_a.union(&aabb);
            group_a.push((aabb, item));
        } else {
            box_b = box_b.union(&aabb);
            group_b.push((aabb, item));
        }
    }

    (group_a, group_b)
}

#[cfg(test)]
#[path = "rtree_index_tests.rs"]
mod tests;
