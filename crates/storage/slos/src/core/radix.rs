//! Fixed-depth radix tree: per-file logical-block -> (physical block, epoch).
//!
//! Unlike the B+trees in `tree`, a radix node carries no keys: a key's local
//! index at each of the `RADIX_DEPTH` levels is extracted directly from its
//! bits, most-significant group first, so descent never compares against a
//! stored key. Radix nodes reuse the `TreeNode` block framing (tagged
//! `NodeType::Radix`) purely for uniform CRC/I/O handling; `data` here holds
//! a flat array of `RadixEntry` rather than a dnode's key/value pairs.

#[allow(unused_imports)]
use crate::prelude::*;
use super::node::{TreeNode, NodeType, NODE_DATA_SIZE};
use super::tree::{BlockDevice, BlockAllocator};
use crate::error::{SlosError, Result};

/// Depth of the tree: every logical key destructures into exactly this many
/// local indices.
pub const RADIX_DEPTH: usize = 5;

/// Bits consumed per level. `RADIX_FANOUT = 2^RADIX_BITS` children/entries
/// per node.
pub const RADIX_BITS: u32 = 7;
pub const RADIX_FANOUT: usize = 1 << RADIX_BITS;
pub const RADIX_MASK: u64 = (RADIX_FANOUT as u64) - 1;

/// One past the largest logical block index representable by this tree.
pub const RADIX_MAX_KEY: u64 = 1u64 << (RADIX_BITS as u64 * RADIX_DEPTH as u64);

/// Sentinel marking "nothing mapped here", both for internal child pointers
/// and for leaf-level physical block numbers.
pub const RADIX_INVAL: u64 = u64::MAX;

const ENTRY_SIZE: usize = 16;
const _: () = assert!(RADIX_FANOUT * ENTRY_SIZE <= NODE_DATA_SIZE);

/// A single radix tree entry: a block number (or `RADIX_INVAL`) plus the
/// checkpoint epoch that wrote it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RadixEntry {
    pub block: u64,
    pub epoch: u64,
}

impl RadixEntry {
    pub const INVAL: RadixEntry = RadixEntry { block: RADIX_INVAL, epoch: 0 };

    pub fn is_inval(&self) -> bool {
        self.block == RADIX_INVAL
    }
}

fn local_key(key: u64, depth: usize) -> usize {
    let shift = (RADIX_DEPTH - 1 - depth) as u32 * RADIX_BITS;
    ((key >> shift) & RADIX_MASK) as usize
}

fn get_entry(node: &TreeNode, idx: usize) -> RadixEntry {
    let off = idx * ENTRY_SIZE;
    let block = u64::from_le_bytes(node.data[off..off + 8].try_into().unwrap());
    let epoch = u64::from_le_bytes(node.data[off + 8..off + 16].try_into().unwrap());
    RadixEntry { block, epoch }
}

fn set_entry(node: &mut TreeNode, idx: usize, entry: RadixEntry) {
    let off = idx * ENTRY_SIZE;
    node.data[off..off + 8].copy_from_slice(&entry.block.to_le_bytes());
    node.data[off + 8..off + 16].copy_from_slice(&entry.epoch.to_le_bytes());
}

fn new_node(generation: u64) -> TreeNode {
    let mut node = TreeNode::new(NodeType::Radix, 0, generation);
    for i in 0..RADIX_FANOUT {
        set_entry(&mut node, i, RadixEntry::INVAL);
    }
    node
}

/// Root-to-leaf path through a radix descent: one `(block, local_index)`
/// pair per level. `blocks[RADIX_DEPTH - 1]` is always the leaf holding the
/// data entry itself.
#[derive(Clone, Copy, Debug)]
pub struct RadixCursor {
    key: u64,
    blocks: [u64; RADIX_DEPTH],
    locals: [usize; RADIX_DEPTH],
}

impl RadixCursor {
    pub fn key(&self) -> u64 {
        self.key
    }
}

pub struct RadixOps<'a, D: BlockDevice, A: BlockAllocator> {
    device: &'a mut D,
    allocator: &'a mut A,
}

impl<'a, D: BlockDevice, A: BlockAllocator> RadixOps<'a, D, A> {
    pub fn new(device: &'a mut D, allocator: &'a mut A) -> Self {
        Self { device, allocator }
    }

    /// Allocate and zero-fill (all entries `INVAL`) a fresh root node.
    pub fn create_root(&mut self) -> Result<u64> {
        let block = self.allocator.allocate_block()?;
        let mut node = new_node(0);
        node.update_crc();
        self.device.write_node(block, &node)?;
        Ok(block)
    }

    /// Descend to `key`'s leaf. With `add_missing`, internal nodes absent
    /// along the path are created (and persisted) as the descent proceeds;
    /// without it, a missing internal node ends the descent early and
    /// `start` returns `NotFound`.
    pub fn start(&mut self, root: u64, key: u64, add_missing: bool) -> Result<RadixCursor> {
        if key >= RADIX_MAX_KEY {
            return Err(SlosError::KeyTooLarge);
        }
        let mut blocks = [0u64; RADIX_DEPTH];
        let mut locals = [0usize; RADIX_DEPTH];
        let mut block = root;
        for depth in 0..RADIX_DEPTH {
            let local = local_key(key, depth);
            blocks[depth] = block;
            locals[depth] = local;
            if depth + 1 < RADIX_DEPTH {
                let node = self.device.read_node(block)?;
                let entry = get_entry(&node, local);
                block = if entry.is_inval() {
                    if !add_missing {
                        return Err(SlosError::NotFound);
                    }
                    let child_block = self.allocator.allocate_block()?;
                    let child = new_node(0);
                    self.device.write_node(child_block, &child)?;
                    let mut parent = node;
                    set_entry(&mut parent, local, RadixEntry { block: child_block, epoch: 0 });
                    parent.update_crc();
                    self.device.write_node(blocks[depth], &parent)?;
                    child_block
                } else {
                    entry.block
                };
            }
        }
        Ok(RadixCursor { key, blocks, locals })
    }

    /// Read the entry at the cursor's current key. `RADIX_INVAL` means
    /// unmapped, not an error -- callers decide what that means (a hole on
    /// read, or "must allocate" on write).
    pub fn access(&self, cursor: &RadixCursor) -> Result<RadixEntry> {
        let leaf = self.device.read_node(cursor.blocks[RADIX_DEPTH - 1])?;
        Ok(get_entry(&leaf, cursor.locals[RADIX_DEPTH - 1]))
    }

    /// Overwrite the entry at the cursor's current key. The leaf is
    /// reallocated (CoW) and every ancestor's child pointer is rewritten in
    /// turn; the new root block is returned so the caller can update the
    /// owning inode.
    pub fn replace(&mut self, cursor: &mut RadixCursor, entry: RadixEntry) -> Result<u64> {
        let leaf_depth = RADIX_DEPTH - 1;
        let mut node = self.device.read_node(cursor.blocks[leaf_depth])?;
        set_entry(&mut node, cursor.locals[leaf_depth], entry);
        node.update_crc();
        let mut new_block = self.allocator.allocate_block()?;
        self.device.write_node(new_block, &node)?;
        cursor.blocks[leaf_depth] = new_block;

        for depth in (0..leaf_depth).rev() {
            let mut parent = self.device.read_node(cursor.blocks[depth])?;
            set_entry(&mut parent, cursor.locals[depth], RadixEntry { block: new_block, epoch: entry.epoch });
            parent.update_crc();
            new_block = self.allocator.allocate_block()?;
            self.device.write_node(new_block, &parent)?;
            cursor.blocks[depth] = new_block;
        }
        Ok(new_block)
    }

    /// Find the mapping for `key`, or `RADIX_INVAL` if nothing is mapped
    /// (a hole). Does not create missing internal nodes.
    pub fn find(&mut self, root: u64, key: u64) -> Result<RadixEntry> {
        match self.start(root, key, false) {
            Ok(cursor) => self.access(&cursor),
            Err(SlosError::NotFound) => Ok(RadixEntry::INVAL),
            Err(e) => Err(e),
        }
    }

    /// Map `key` to `(block, epoch)`, creating internal nodes as needed.
    /// Returns the tree's new root block.
    pub fn insert(&mut self, root: u64, key: u64, block: u64, epoch: u64) -> Result<u64> {
        let mut cursor = self.start(root, key, true)?;
        self.replace(&mut cursor, RadixEntry { block, epoch })
    }

    /// Unmap `key`. Per the source algorithm this does not collapse any
    /// internal node left entirely `INVAL` -- see SPEC_FULL.md's open
    /// question on radix-tree delete. A key with no path at all (never
    /// written) is a no-op.
    pub fn delete(&mut self, root: u64, key: u64) -> Result<u64> {
        match self.start(root, key, false) {
            Ok(mut cursor) => self.replace(&mut cursor, RadixEntry::INVAL),
            Err(SlosError::NotFound) => Ok(root),
            Err(e) => Err(e),
        }
    }

    /// Advance the cursor to the next key in ascending order, re-descending
    /// only the levels that actually changed. Returns `false` once the key
    /// space is exhausted.
    pub fn advance(&mut self, cursor: &mut RadixCursor, add_missing: bool) -> Result<bool> {
        let mut depth = RADIX_DEPTH - 1;
        loop {
            if cursor.locals[depth] + 1 < RADIX_FANOUT {
                cursor.locals[depth] += 1;
                break;
            }
            if depth == 0 {
                return Ok(false);
            }
            depth -= 1;
        }
        // Recompute the key from the updated local indices.
        let mut key = 0u64;
        for d in 0..=depth {
            key = (key << RADIX_BITS) | cursor.locals[d] as u64;
        }
        for _ in (depth + 1)..RADIX_DEPTH {
            key <<= RADIX_BITS;
        }
        cursor.key = key;

        // Descend the left edge of the new subtree for every level below
        // the one that changed.
        for d in (depth + 1)..RADIX_DEPTH {
            cursor.locals[d] = 0;
            let parent_block = cursor.blocks[d - 1];
            let node = self.device.read_node(parent_block)?;
            let entry = get_entry(&node, cursor.locals[d - 1]);
            let child_block = if entry.is_inval() {
                if !add_missing {
                    return Err(SlosError::NotFound);
                }
                let child_block = self.allocator.allocate_block()?;
                let child = new_node(0);
                self.device.write_node(child_block, &child)?;
                let mut parent = node;
                set_entry(&mut parent, cursor.locals[d - 1], RadixEntry { block: child_block, epoch: 0 });
                parent.update_crc();
                self.device.write_node(parent_block, &parent)?;
                child_block
            } else {
                entry.block
            };
            cursor.blocks[d] = child_block;
        }
        Ok(true)
    }

    /// Maximal contiguous physical run starting at logical block `key`.
    /// Walks forward while both the logical and physical offsets stay
    /// contiguous and the epoch is unchanged, returning `None` if `key`
    /// itself is unmapped.
    pub fn extent_find(&mut self, root: u64, key: u64) -> Result<Option<(u64, u64, u64)>> {
        let mut cursor = match self.start(root, key, false) {
            Ok(c) => c,
            Err(SlosError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        let first = self.access(&cursor)?;
        if first.is_inval() {
            return Ok(None);
        }
        let mut blocks_run: u64 = 1;
        let mut expected_next = first.block + 1;
        loop {
            if !self.advance(&mut cursor, false)? {
                break;
            }
            let entry = match self.access(&cursor) {
                Ok(e) => e,
                Err(_) => break,
            };
            if entry.is_inval() || entry.block != expected_next || entry.epoch != first.epoch {
                break;
            }
            blocks_run += 1;
            expected_next += 1;
        }
        Ok(Some((first.block, blocks_run, first.epoch)))
    }

    /// Map `blocks` consecutive logical keys starting at `key` onto the
    /// consecutive physical run starting at `phys_block`, all stamped with
    /// `epoch`. Returns the tree's new root block.
    pub fn extent_replace(&mut self, mut root: u64, key: u64, phys_block: u64, blocks: u64, epoch: u64) -> Result<u64> {
        let mut cursor = self.start(root, key, true)?;
        for i in 0..blocks {
            root = self.replace(&mut cursor, RadixEntry { block: phys_block + i, epoch })?;
            if i + 1 < blocks {
                if !self.advance(&mut cursor, true)? {
                    return Err(SlosError::KeyTooLarge);
                }
            }
        }
        Ok(root)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MemDevice {
        blocks: HashMap<u64, TreeNode>,
        next: u64,
    }
    impl MemDevice {
        fn new() -> Self { Self { blocks: HashMap::new(), next: 1 } }
    }
    impl BlockDevice for MemDevice {
        fn read_node(&self, block: u64) -> Result<TreeNode> {
            self.blocks.get(&block).cloned().ok_or(SlosError::NotFound)
        }
        fn write_node(&mut self, block: u64, node: &TreeNode) -> Result<()> {
            self.blocks.insert(block, *node);
            Ok(())
        }
        fn read_block(&self, _block: u64) -> Result<Vec<u8>> {
            Ok(vec![0u8; NODE_DATA_SIZE + super::super::node::NODE_HEADER_SIZE])
        }
        fn write_block(&mut self, _block: u64, _data: &[u8]) -> Result<()> { Ok(()) }
        fn sync(&mut self) -> Result<()> { Ok(()) }
    }
    impl BlockAllocator for MemDevice {
        fn allocate_block(&mut self) -> Result<u64> {
            let b = self.next;
            self.next += 1;
            Ok(b)
        }
        fn free_block(&mut self, _b: u64) -> Result<()> { Ok(()) }
    }

    #[test]
    fn insert_and_find() {
        let mut dev = MemDevice::new();
        let root_holder = &mut dev;
        let dev_ptr = root_holder as *mut MemDevice;
        let (dev_ref, alloc_ref) = unsafe { (&mut *dev_ptr, &mut *dev_ptr) };
        let mut ops = RadixOps::new(dev_ref, alloc_ref);
        let root = ops.create_root().unwrap();
        let root = ops.insert(root, 42, 9000, 1).unwrap();
        let entry = ops.find(root, 42).unwrap();
        assert_eq!(entry.block, 9000);
        let miss = ops.find(root, 43).unwrap();
        assert!(miss.is_inval());
    }

    #[test]
    fn extent_find_coalesces_contiguous_run() {
        let mut dev = MemDevice::new();
        let dev_ptr = &mut dev as *mut MemDevice;
        let (dev_ref, alloc_ref) = unsafe { (&mut *dev_ptr, &mut *dev_ptr) };
        let mut ops = RadixOps::new(dev_ref, alloc_ref);
        let root = ops.create_root().unwrap();
        let root = ops.extent_replace(root, 0, 500, 4, 1).unwrap();
        let (base, len, epoch) = ops.extent_find(root, 0).unwrap().unwrap();
        assert_eq!(base, 500);
        assert_eq!(len, 4);
        assert_eq!(epoch, 1);
    }

    #[test]
    fn delete_leaves_sentinel() {
        let mut dev = MemDevice::new();
        let dev_ptr = &mut dev as *mut MemDevice;
        let (dev_ref, alloc_ref) = unsafe { (&mut *dev_ptr, &mut *dev_ptr) };
        let mut ops = RadixOps::new(dev_ref, alloc_ref);
        let root = ops.create_root().unwrap();
        let root = ops.insert(root, 7, 100, 1).unwrap();
        let root = ops.delete(root, 7).unwrap();
        let entry = ops.find(root, 7).unwrap();
        assert!(entry.is_inval());
    }
}
