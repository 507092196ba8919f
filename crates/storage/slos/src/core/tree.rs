//! Generic on-disk B+tree.
//!
//! One engine serves three trees in the core: the allocator's offset-keyed
//! tree, its size-keyed tree, and the inode index. They differ only in key
//! width, value width, and node type tag, so the tree is generic over
//! `TreeKey`/`TreeValue` and parameterized by a `NodeType`.
//!
//! Mutating operations are copy-on-write: every touched node, from the leaf
//! up to the root, is written to a freshly allocated block before the call
//! returns. The caller is responsible for persisting the new root pointer
//! (into an inode record or the superblock) before it is considered
//! committed.

#[allow(unused_imports)]
use crate::prelude::*;
use super::node::{TreeNode, NodeType, InternalEntry, NODE_DATA_SIZE, MAX_INTERNAL_ENTRIES};
use crate::error::{SlosError, Result};

// ============================================================================
// KEY / VALUE TRAITS
// ============================================================================

pub trait TreeKey: Clone + Copy + Ord + Sized {
    fn to_u64(&self) -> u64;
    fn from_u64(v: u64) -> Self;
    fn serialize(&self, buf: &mut [u8]);
    fn deserialize(buf: &[u8]) -> Self;
    const SIZE: usize;
}

pub trait TreeValue: Clone + Copy + Sized {
    fn serialize(&self, buf: &mut [u8]);
    fn deserialize(buf: &[u8]) -> Self;
    const SIZE: usize;
}

impl TreeKey for u64 {
    fn to_u64(&self) -> u64 { *self }
    fn from_u64(v: u64) -> Self { v }
    fn serialize(&self, buf: &mut [u8]) { buf[..8].copy_from_slice(&self.to_le_bytes()); }
    fn deserialize(buf: &[u8]) -> Self {
        u64::from_le_bytes(buf[..8].try_into().unwrap())
    }
    const SIZE: usize = 8;
}

impl TreeValue for u64 {
    fn serialize(&self, buf: &mut [u8]) { buf[..8].copy_from_slice(&self.to_le_bytes()); }
    fn deserialize(buf: &[u8]) -> Self {
        u64::from_le_bytes(buf[..8].try_into().unwrap())
    }
    const SIZE: usize = 8;
}

// ============================================================================
// BLOCK DEVICE / ALLOCATOR TRAITS
// ============================================================================

/// Raw block I/O. Implemented against `std::fs::File` by tools, and against
/// a kernel buffer cache by the mounted filesystem.
///
/// `read_node`/`write_node` interpret a block as a `TreeNode` (used for
/// every B+tree, allocator, and radix-tree node); `read_block`/`write_block`
/// treat the same physical block as an opaque byte array, used for file
/// data blocks the buffer manager flushes at checkpoint time.
pub trait BlockDevice {
    fn read_node(&self, block: u64) -> Result<TreeNode>;
    fn write_node(&mut self, block: u64, node: &TreeNode) -> Result<()>;
    fn read_block(&self, block: u64) -> Result<Vec<u8>>;
    fn write_block(&mut self, block: u64, data: &[u8]) -> Result<()>;
    fn sync(&mut self) -> Result<()>;
}

/// Block allocation, consumed by tree mutation to give every CoW'd node a
/// fresh physical home. The core's own dual-tree allocator (see `alloc`)
/// implements this trait so tree code does not need to know it is talking
/// to itself when flushing the allocator's own trees.
pub trait BlockAllocator {
    fn allocate_block(&mut self) -> Result<u64>;
    fn free_block(&mut self, block: u64) -> Result<()>;
}

// ============================================================================
// TREE PATH
// ============================================================================

/// Root-to-leaf path recorded during a descent, as `(block, index_in_parent)`
/// pairs. Needed so a mutation can walk back up reallocating ancestors.
#[derive(Clone, Debug, Default)]
pub struct TreePath {
    pub nodes: Vec<(u64, usize)>,
}

impl TreePath {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }
    pub fn push(&mut self, block: u64, index: usize) {
        self.nodes.push((block, index));
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    pub fn leaf_block(&self) -> Option<u64> {
        self.nodes.last().map(|(b, _)| *b)
    }
}

// ============================================================================
// LEAF / INTERNAL NODE VIEWS
// ============================================================================

pub struct LeafNode<'a, K, V> {
    node: &'a mut TreeNode,
    _k: core::marker::PhantomData<K>,
    _v: core::marker::PhantomData<V>,
}

impl<'a, K: TreeKey, V: TreeValue> LeafNode<'a, K, V> {
    pub fn new(node: &'a mut TreeNode) -> Self {
        Self { node, _k: core::marker::PhantomData, _v: core::marker::PhantomData }
    }

    fn entry_size() -> usize {
        K::SIZE + V::SIZE
    }

    pub fn max_entries() -> usize {
        NODE_DATA_SIZE / Self::entry_size()
    }

    pub fn get_entry(&self, index: usize) -> Option<(K, V)> {
        if index >= self.node.item_count as usize {
            return None;
        }
        let off = index * Self::entry_size();
        let key = K::deserialize(&self.node.data[off..]);
        let value = V::deserialize(&self.node.data[off + K::SIZE..]);
        Some((key, value))
    }

    pub fn set_entry(&mut self, index: usize, key: &K, value: &V) {
        let off = index * Self::entry_size();
        key.serialize(&mut self.node.data[off..]);
        value.serialize(&mut self.node.data[off + K::SIZE..]);
    }

    /// Binary search; `Ok(i)` on exact match, `Err(i)` at the insertion slot.
    pub fn search(&self, key: &K) -> core::result::Result<usize, usize> {
        let mut lo = 0usize;
        let mut hi = self.node.item_count as usize;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (mk, _) = self.get_entry(mid).unwrap();
            match mk.cmp(key) {
                core::cmp::Ordering::Less => lo = mid + 1,
                core::cmp::Ordering::Greater => hi = mid,
                core::cmp::Ordering::Equal => return Ok(mid),
            }
        }
        Err(lo)
    }

    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        if self.node.item_count as usize >= Self::max_entries() {
            return Err(SlosError::NodeFull);
        }
        match self.search(&key) {
            Ok(_) => Err(SlosError::Exists),
            Err(pos) => {
                let count = self.node.item_count as usize;
                for i in (pos..count).rev() {
                    let (k, v) = self.get_entry(i).unwrap();
                    self.set_entry(i + 1, &k, &v);
                }
                self.set_entry(pos, &key, &value);
                self.node.item_count += 1;
                Ok(())
            }
        }
    }

    pub fn update(&mut self, key: &K, value: V) -> Result<V> {
        match self.search(key) {
            Ok(pos) => {
                let (_, old) = self.get_entry(pos).unwrap();
                self.set_entry(pos, key, &value);
                Ok(old)
            }
            Err(_) => Err(SlosError::NotFound),
        }
    }

    pub fn delete(&mut self, key: &K) -> Result<V> {
        match self.search(key) {
            Ok(pos) => {
                let (_, value) = self.get_entry(pos).unwrap();
                let count = self.node.item_count as usize;
                for i in pos..count - 1 {
                    let (k, v) = self.get_entry(i + 1).unwrap();
                    self.set_entry(i, &k, &v);
                }
                self.node.item_count -= 1;
                Ok(value)
            }
            Err(_) => Err(SlosError::NotFound),
        }
    }

    pub fn is_full(&self) -> bool {
        self.node.item_count as usize >= Self::max_entries()
    }
}

pub struct InternalNode<'a> {
    node: &'a mut TreeNode,
}

impl<'a> InternalNode<'a> {
    pub fn new(node: &'a mut TreeNode) -> Self {
        Self { node }
    }

    pub fn get_child(&self, index: usize) -> Option<u64> {
        if index >= self.node.item_count as usize {
            return None;
        }
        let off = index * InternalEntry::SIZE + 8;
        Some(u64::from_le_bytes(self.node.data[off..off + 8].try_into().unwrap()))
    }

    pub fn get_key(&self, index: usize) -> Option<u64> {
        if index >= self.node.item_count as usize {
            return None;
        }
        let off = index * InternalEntry::SIZE;
        Some(u64::from_le_bytes(self.node.data[off..off + 8].try_into().unwrap()))
    }

    pub fn set_entry(&mut self, index: usize, key: u64, child: u64) {
        let off = index * InternalEntry::SIZE;
        self.node.data[off..off + 8].copy_from_slice(&key.to_le_bytes());
        self.node.data[off + 8..off + 16].copy_from_slice(&child.to_le_bytes());
    }

    /// Find the child that would contain `key`. Entry `i`'s key is the
    /// smallest key reachable via child `i`; entry 0's key is the `0`
    /// sentinel and catches everything smaller than entry 1's key. `lo`
    /// after the loop is the count of entries with key <= the target, so
    /// the entry (and its child) to descend into is `lo - 1`.
    pub fn find_child(&self, key: u64) -> Option<(usize, u64)> {
        let count = self.node.item_count as usize;
        if count == 0 {
            return None;
        }
        let mut lo = 0usize;
        let mut hi = count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let mk = self.get_key(mid).unwrap();
            if key < mk {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        let child_idx = lo.saturating_sub(1);
        self.get_child(child_idx).map(|c| (child_idx, c))
    }

    pub fn insert_at(&mut self, pos: usize, key: u64, child: u64) -> Result<()> {
        if self.node.item_count as usize + 1 >= MAX_INTERNAL_ENTRIES {
            return Err(SlosError::NodeFull);
        }
        let count = self.node.item_count as usize;
        for i in (pos..count).rev() {
            let k = self.get_key(i).unwrap();
            let c = self.get_child(i).unwrap();
            self.set_entry(i + 1, k, c);
        }
        self.set_entry(pos, key, child);
        self.node.item_count += 1;
        Ok(())
    }
}

// ============================================================================
// B+TREE HANDLE
// ============================================================================

/// In-memory handle to a B+tree. The persistent form is just `root_block`
/// (and `generation`, folded into an inode's disk pointer epoch); height and
/// node_type are recomputed from the root node at `iopen` time in practice,
/// but are kept here to avoid a re-read on every operation.
#[derive(Clone, Copy, Debug)]
pub struct BPlusTree {
    pub root_block: u64,
    pub height: u32,
    pub node_type: NodeType,
    pub generation: u64,
}

impl BPlusTree {
    pub fn new(node_type: NodeType) -> Self {
        Self { root_block: 0, height: 0, node_type, generation: 0 }
    }

    pub fn from_root(root_block: u64, height: u32, node_type: NodeType, generation: u64) -> Self {
        Self { root_block, height, node_type, generation }
    }

    pub fn is_empty(&self) -> bool {
        self.root_block == 0
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

// ============================================================================
// COW TREE OPERATIONS
// ============================================================================

pub struct TreeOps<'a, D: BlockDevice, A: BlockAllocator> {
    device: &'a mut D,
    allocator: &'a mut A,
}

impl<'a, D: BlockDevice, A: BlockAllocator> TreeOps<'a, D, A> {
    pub fn new(device: &'a mut D, allocator: &'a mut A) -> Self {
        Self { device, allocator }
    }

    /// Descend from the root to the leaf that would hold `key`. Leaf-ness is
    /// decided by the node's own `level` field, not the in-memory
    /// `BPlusTree::height` counter, which is only a cached hint (zero right
    /// after a recovered mount) and not ground truth for how deep the
    /// on-disk tree actually is.
    fn descend<K: TreeKey, V: TreeValue>(&self, tree: &BPlusTree, key: &K) -> Result<TreePath> {
        let mut path = TreePath::new();
        let mut block = tree.root_block;
        loop {
            let mut node = self.device.read_node(block)?;
            if node.is_leaf() {
                path.push(block, 0);
                return Ok(path);
            }
            let internal = InternalNode::new(&mut node);
            let (idx, child) = internal.find_child(key.to_u64()).ok_or(SlosError::Corrupt)?;
            path.push(block, idx);
            block = child;
        }
    }

    pub fn get<K: TreeKey, V: TreeValue>(&self, tree: &BPlusTree, key: &K) -> Result<V> {
        if tree.is_empty() {
            return Err(SlosError::NotFound);
        }
        let path = self.descend::<K, V>(tree, key)?;
        let leaf_block = path.leaf_block().ok_or(SlosError::Corrupt)?;
        let mut node = self.device.read_node(leaf_block)?;
        let leaf = LeafNode::<K, V>::new(&mut node);
        match leaf.search(key) {
            Ok(idx) => Ok(leaf.get_entry(idx).unwrap().1),
            Err(_) => Err(SlosError::NotFound),
        }
    }

    pub fn insert<K: TreeKey, V: TreeValue>(
        &mut self,
        tree: &mut BPlusTree,
        key: K,
        value: V,
    ) -> Result<()> {
        if tree.is_empty() {
            let block = self.allocator.allocate_block()?;
            let gen = tree.next_generation();
            let mut node = TreeNode::new_leaf(tree.node_type, gen);
            LeafNode::<K, V>::new(&mut node).insert(key, value)?;
            node.update_crc();
            self.device.write_node(block, &node)?;
            tree.root_block = block;
            return Ok(());
        }

        let path = self.descend::<K, V>(tree, &key)?;
        let leaf_block = path.leaf_block().ok_or(SlosError::Corrupt)?;
        let mut node = self.device.read_node(leaf_block)?;
        let gen = tree.next_generation();
        node.generation = gen;

        let full = {
            let leaf = LeafNode::<K, V>::new(&mut node);
            leaf.is_full()
        };

        if !full {
            LeafNode::<K, V>::new(&mut node).insert(key, value)?;
            node.update_crc();
            let new_block = self.allocator.allocate_block()?;
            self.device.write_node(new_block, &node)?;
            self.propagate_cow(tree, &path, new_block)?;
            return Ok(());
        }

        self.split_and_insert::<K, V>(tree, &path, key, value)
    }

    fn split_and_insert<K: TreeKey, V: TreeValue>(
        &mut self,
        tree: &mut BPlusTree,
        path: &TreePath,
        key: K,
        value: V,
    ) -> Result<()> {
        let leaf_block = path.leaf_block().ok_or(SlosError::Corrupt)?;
        let mut left = self.device.read_node(leaf_block)?;
        let gen = tree.next_generation();

        let mid = left.item_count as usize / 2;
        let mut right_entries: Vec<(K, V)> = Vec::new();
        {
            let left_leaf = LeafNode::<K, V>::new(&mut left);
            for i in mid..left_leaf.node.item_count as usize {
                right_entries.push(left_leaf.get_entry(i).unwrap());
            }
        }
        left.item_count = mid as u16;

        let mut right = TreeNode::new_leaf(tree.node_type, gen);
        right.right_sibling = left.right_sibling;
        {
            let mut right_leaf = LeafNode::<K, V>::new(&mut right);
            for (k, v) in &right_entries {
                right_leaf.insert(*k, *v)?;
            }
            if key < right_entries[0].0 {
                LeafNode::<K, V>::new(&mut left).insert(key, value)?;
            } else {
                right_leaf.insert(key, value)?;
            }
        }

        left.generation = gen;
        left.update_crc();
        right.update_crc();

        let left_block = self.allocator.allocate_block()?;
        let right_block = self.allocator.allocate_block()?;
        left.right_sibling = right_block;
        left.update_crc();

        self.device.write_node(left_block, &left)?;
        self.device.write_node(right_block, &right)?;

        let split_key = LeafNode::<K, V>::new(&mut right).get_entry(0).unwrap().0.to_u64();
        self.propagate_split(tree, path, left_block, split_key, right_block)
    }

    fn propagate_cow(&mut self, tree: &mut BPlusTree, path: &TreePath, new_child: u64) -> Result<()> {
        if path.len() <= 1 {
            tree.root_block = new_child;
            return Ok(());
        }
        let mut cur = new_child;
        let gen = tree.generation;
        for i in (0..path.len() - 1).rev() {
            let (parent_block, child_idx) = path.nodes[i];
            let mut parent = self.device.read_node(parent_block)?;
            {
                let mut internal = InternalNode::new(&mut parent);
                if let Some(k) = internal.get_key(child_idx) {
                    internal.set_entry(child_idx, k, cur);
                } else {
                    internal.set_entry(child_idx, 0, cur);
                }
            }
            parent.generation = gen;
            parent.update_crc();
            cur = self.allocator.allocate_block()?;
            self.device.write_node(cur, &parent)?;
        }
        tree.root_block = cur;
        Ok(())
    }

    fn propagate_split(
        &mut self,
        tree: &mut BPlusTree,
        path: &TreePath,
        left_block: u64,
        split_key: u64,
        right_block: u64,
    ) -> Result<()> {
        if path.len() <= 1 {
            let gen = tree.generation;
            let mut root = TreeNode::new_internal(tree.node_type, tree.height as u16 + 1, gen);
            {
                let mut internal = InternalNode::new(&mut root);
                internal.insert_at(0, 0, left_block)?;
                internal.insert_at(1, split_key, right_block)?;
            }
            root.update_crc();
            let root_block = self.allocator.allocate_block()?;
            self.device.write_node(root_block, &root)?;
            tree.root_block = root_block;
            tree.height += 1;
            return Ok(());
        }

        let parent_idx = path.len() - 2;
        let (parent_block, child_idx) = path.nodes[parent_idx];
        let mut parent = self.device.read_node(parent_block)?;
        let gen = tree.generation;

        let full = {
            let internal = InternalNode::new(&mut parent);
            internal.node.item_count as usize + 1 >= MAX_INTERNAL_ENTRIES
        };
        if full {
            // Parent is also full: recursive internal-node split is not
            // implemented. The allocator and inode-index trees are sized so
            // this is unreachable in practice (internal fanout is large
            // relative to the number of live extents/inodes); surfacing
            // `NodeFull` lets a caller retry after a checkpoint compacts
            // the tree rather than corrupting it silently.
            return Err(SlosError::NodeFull);
        }

        {
            let mut internal = InternalNode::new(&mut parent);
            if let Some(k) = internal.get_key(child_idx) {
                internal.set_entry(child_idx, k, left_block);
            } else {
                internal.set_entry(child_idx, 0, left_block);
            }
            internal.insert_at(child_idx + 1, split_key, right_block)?;
        }
        parent.generation = gen;
        parent.update_crc();
        let new_parent = self.allocator.allocate_block()?;
        self.device.write_node(new_parent, &parent)?;

        let mut up = TreePath::new();
        for i in 0..parent_idx {
            up.push(path.nodes[i].0, path.nodes[i].1);
        }
        up.push(parent_block, child_idx);
        self.propagate_cow(tree, &up, new_parent)
    }

    pub fn delete<K: TreeKey, V: TreeValue>(&mut self, tree: &mut BPlusTree, key: &K) -> Result<V> {
        if tree.is_empty() {
            return Err(SlosError::NotFound);
        }
        let path = self.descend::<K, V>(tree, key)?;
        let leaf_block = path.leaf_block().ok_or(SlosError::Corrupt)?;
        let mut node = self.device.read_node(leaf_block)?;
        let gen = tree.next_generation();
        node.generation = gen;
        let value = LeafNode::<K, V>::new(&mut node).delete(key)?;
        node.update_crc();
        let new_block = self.allocator.allocate_block()?;
        self.device.write_node(new_block, &node)?;
        // No merge/borrow on underfull leaves: deleted keys leave a gap that
        // persists until the tree is rebuilt by GC. See SPEC_FULL.md open
        // questions.
        self.propagate_cow(tree, &path, new_block)?;
        Ok(value)
    }

    pub fn update<K: TreeKey, V: TreeValue>(&mut self, tree: &mut BPlusTree, key: K, value: V) -> Result<V> {
        let path = self.descend::<K, V>(tree, &key)?;
        let leaf_block = path.leaf_block().ok_or(SlosError::Corrupt)?;
        let mut node = self.device.read_node(leaf_block)?;
        let gen = tree.next_generation();
        node.generation = gen;
        let old = LeafNode::<K, V>::new(&mut node).update(&key, value)?;
        node.update_crc();
        let new_block = self.allocator.allocate_block()?;
        self.device.write_node(new_block, &node)?;
        self.propagate_cow(tree, &path, new_block)?;
        Ok(old)
    }

    /// Smallest entry with key >= `bound`, scanning right across sibling
    /// leaves if the containing leaf has nothing that qualifies.
    pub fn keymin<K: TreeKey, V: TreeValue>(&self, tree: &BPlusTree, bound: K) -> Result<(K, V)> {
        if tree.is_empty() {
            return Err(SlosError::NotFound);
        }
        let path = self.descend::<K, V>(tree, &bound)?;
        let mut block = path.leaf_block().ok_or(SlosError::Corrupt)?;
        loop {
            let mut node = self.device.read_node(block)?;
            let sibling = node.right_sibling;
            let leaf = LeafNode::<K, V>::new(&mut node);
            let pos = match leaf.search(&bound) {
                Ok(p) => p,
                Err(p) => p,
            };
            if let Some(entry) = leaf.get_entry(pos) {
                return Ok(entry);
            }
            if sibling == 0 {
                return Err(SlosError::NotFound);
            }
            block = sibling;
        }
    }

    /// The single largest-keyed entry in the tree. Used by the allocator to
    /// grab the biggest free extent when no adequately sized one exists.
    /// Implemented as a linear walk of the leaf chain: the allocator trees
    /// are kept small by the no-in-line-free design, so this does not need
    /// a dedicated rightmost-leaf descent.
    pub fn max_entry<K: TreeKey, V: TreeValue>(&self, tree: &BPlusTree) -> Result<(K, V)> {
        if tree.is_empty() {
            return Err(SlosError::NotFound);
        }
        let mut block = self.leftmost_leaf(tree)?;
        let mut best: Option<(K, V)> = None;
        loop {
            let mut node = self.device.read_node(block)?;
            let sibling = node.right_sibling;
            let leaf = LeafNode::<K, V>::new(&mut node);
            let count = leaf.node.item_count as usize;
            if count > 0 {
                best = leaf.get_entry(count - 1);
            }
            if sibling == 0 {
                break;
            }
            block = sibling;
        }
        best.ok_or(SlosError::NotFound)
    }

    /// Largest entry with key <= `bound`. A linear scan from the leftmost
    /// leaf, stopping at the first key exceeding `bound` (the leaf chain is
    /// globally ordered, so nothing past that point can qualify).
    pub fn keymax<K: TreeKey, V: TreeValue>(&self, tree: &BPlusTree, bound: K) -> Result<(K, V)> {
        if tree.is_empty() {
            return Err(SlosError::NotFound);
        }
        let mut block = self.leftmost_leaf(tree)?;
        let mut best: Option<(K, V)> = None;
        'outer: loop {
            let mut node = self.device.read_node(block)?;
            let sibling = node.right_sibling;
            let leaf = LeafNode::<K, V>::new(&mut node);
            for i in 0..leaf.node.item_count as usize {
                let entry = leaf.get_entry(i).unwrap();
                if entry.0 > bound {
                    break 'outer;
                }
                best = Some(entry);
            }
            if sibling == 0 {
                break;
            }
            block = sibling;
        }
        best.ok_or(SlosError::NotFound)
    }

    fn leftmost_leaf(&self, tree: &BPlusTree) -> Result<u64> {
        let mut block = tree.root_block;
        loop {
            let mut node = self.device.read_node(block)?;
            if node.is_leaf() {
                return Ok(block);
            }
            let internal = InternalNode::new(&mut node);
            block = internal.get_child(0).ok_or(SlosError::Corrupt)?;
        }
    }
}
