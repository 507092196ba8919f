//! Block allocator: a cached bump chunk backed by a pair of B+trees.
//!
//! Free space is tracked in two trees kept mutually consistent: one keyed
//! by starting block (`offset_tree`), one keyed by run length
//! (`size_tree`), so both "is this offset free" and "give me something at
//! least this big" are O(log n). Allocation never frees anything in line;
//! space is handed out from a cached `chunk` until it runs dry, at which
//! point the largest available extent is pulled out of the trees and
//! carved up. See `FreeRange` in this module (grounded on the free-space
//! structure the wider codebase already uses) for the stored value shape.

#[allow(unused_imports)]
use crate::prelude::*;
use super::node::NodeType;
use super::tree::{BPlusTree, BlockDevice, BlockAllocator, TreeOps};
use super::structures::DEFAULT_AMORTIZATION_CHUNK;
use crate::error::{SlosError, Result};

/// A contiguous run of free blocks, as stored as the size-tree's value (and
/// reconstructed from the offset-tree's key/value pair).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeRange {
    pub start_block: u64,
    pub block_count: u64,
}

impl FreeRange {
    pub fn new(start_block: u64, block_count: u64) -> Self {
        Self { start_block, block_count }
    }

    pub fn end_block(&self) -> u64 {
        self.start_block + self.block_count
    }
}

/// Blocks reserved off the head of a refill extent to pay for the B+tree
/// node writes the refill's own delete/reinsert produces, so refilling
/// never has to call back into `Allocator::allocate_block` (see
/// SPEC_FULL.md's COW + allocator recursion design note).
const REFILL_RESERVE_BLOCKS: u64 = 8;

/// Size-tree keys are `(block_count << 24) | (start_block & 0xFFFFFF)` so
/// two extents of equal length remain distinguishable; the shift keeps
/// ordering by length dominant; see DESIGN.md for the bound this implies
/// on distinguishable same-length extents sharing the low 24 start bits.
fn size_key(block_count: u64, start_block: u64) -> u64 {
    (block_count << 24) | (start_block & 0xFF_FFFF)
}

fn size_key_len(key: u64) -> u64 {
    key >> 24
}

struct CarveAllocator {
    next: u64,
    end: u64,
}

impl BlockAllocator for CarveAllocator {
    fn allocate_block(&mut self) -> Result<u64> {
        if self.next >= self.end {
            return Err(SlosError::NoSpace);
        }
        let b = self.next;
        self.next += 1;
        Ok(b)
    }
    fn free_block(&mut self, _block: u64) -> Result<()> {
        Ok(())
    }
}

/// The dual-tree block allocator. Implements `BlockAllocator` itself so it
/// can be handed to any other tree's `TreeOps`/`RadixOps` as their
/// allocator.
pub struct Allocator {
    pub offset_tree: BPlusTree,
    pub size_tree: BPlusTree,
    chunk_start: u64,
    chunk_remaining: u64,
    pub amortization_chunk: u64,
}

impl Allocator {
    pub fn new() -> Self {
        Self {
            offset_tree: BPlusTree::new(NodeType::AllocOffset),
            size_tree: BPlusTree::new(NodeType::AllocSize),
            chunk_start: 0,
            chunk_remaining: 0,
            amortization_chunk: DEFAULT_AMORTIZATION_CHUNK,
        }
    }

    pub fn from_roots(offset_tree: BPlusTree, size_tree: BPlusTree) -> Self {
        Self {
            offset_tree,
            size_tree,
            chunk_start: 0,
            chunk_remaining: 0,
            amortization_chunk: DEFAULT_AMORTIZATION_CHUNK,
        }
    }

    /// Seed both trees with a single free extent. Used only at first mount.
    pub fn bootstrap<D: BlockDevice>(&mut self, device: &mut D, start_block: u64, block_count: u64) -> Result<()> {
        let mut carve = CarveAllocator { next: start_block, end: start_block + block_count };
        // The seed extent pays for its own first couple of tree nodes.
        let carved_for_nodes = 2u64.min(block_count);
        let remaining = FreeRange::new(start_block + carved_for_nodes, block_count - carved_for_nodes);
        self.insert_free(device, &mut carve, remaining)?;
        Ok(())
    }

    fn insert_free<D: BlockDevice, A: BlockAllocator>(
        &mut self,
        device: &mut D,
        allocator: &mut A,
        range: FreeRange,
    ) -> Result<()> {
        if range.block_count == 0 {
            return Ok(());
        }
        let mut ops = TreeOps::new(device, allocator);
        ops.insert(&mut self.offset_tree, range.start_block, range.block_count)?;
        ops.insert(&mut self.size_tree, size_key(range.block_count, range.start_block), range.start_block)?;
        Ok(())
    }

    fn remove_free<D: BlockDevice, A: BlockAllocator>(
        &mut self,
        device: &mut D,
        allocator: &mut A,
        range: FreeRange,
    ) -> Result<()> {
        let mut ops = TreeOps::new(device, allocator);
        ops.delete::<u64, u64>(&mut self.offset_tree, &range.start_block)?;
        ops.delete::<u64, u64>(&mut self.size_tree, &size_key(range.block_count, range.start_block))?;
        Ok(())
    }

    /// Largest free extent available, biased toward one at least
    /// `self.amortization_chunk` blocks long so refills are amortized; falls
    /// back to whatever the biggest extent is when nothing that large
    /// exists.
    fn find_refill_candidate<D: BlockDevice>(&self, device: &mut D) -> Result<FreeRange> {
        let dummy_alloc_not_used = (); // reads never allocate
        let _ = dummy_alloc_not_used;
        // `get`/`keymin`/`max_entry` only read; we still need some `A` type
        // to satisfy TreeOps's generic bound, so use a allocator that would
        // fail loudly if ever actually invoked.
        struct NoAlloc;
        impl BlockAllocator for NoAlloc {
            fn allocate_block(&mut self) -> Result<u64> { Err(SlosError::NoSpace) }
            fn free_block(&mut self, _b: u64) -> Result<()> { Ok(()) }
        }
        let mut no_alloc = NoAlloc;
        let ops = TreeOps::new(device, &mut no_alloc);
        let bound = size_key(self.amortization_chunk, 0);
        if let Ok((key, start)) = ops.keymin::<u64, u64>(&self.size_tree, bound) {
            return Ok(FreeRange::new(start, size_key_len(key)));
        }
        let (key, start) = ops.max_entry::<u64, u64>(&self.size_tree)?;
        Ok(FreeRange::new(start, size_key_len(key)))
    }

    fn refill<D: BlockDevice>(&mut self, device: &mut D) -> Result<()> {
        let found = self.find_refill_candidate(device)?;
        if found.block_count <= REFILL_RESERVE_BLOCKS {
            return Err(SlosError::NoSpace);
        }

        let mut carve = CarveAllocator {
            next: found.start_block,
            end: found.start_block + REFILL_RESERVE_BLOCKS,
        };
        self.remove_free(device, &mut carve, found)?;

        let usable_start = found.start_block + REFILL_RESERVE_BLOCKS;
        let usable_count = found.block_count - REFILL_RESERVE_BLOCKS;

        if usable_count > self.amortization_chunk {
            let remainder = FreeRange::new(usable_start + self.amortization_chunk, usable_count - self.amortization_chunk);
            self.insert_free(device, &mut carve, remainder)?;
            self.chunk_start = usable_start;
            self.chunk_remaining = self.amortization_chunk;
        } else {
            self.chunk_start = usable_start;
            self.chunk_remaining = usable_count;
        }
        Ok(())
    }

    /// Cheap lower bound on available space: the cached chunk only. Used by
    /// the checkpoint syncer as a fail-fast pre-flight check; it will
    /// under-report when the trees hold more free space than what is
    /// currently cached, so a `NoSpace` from this check is not definitive,
    /// but a pass is.
    pub fn chunk_remaining(&self) -> u64 {
        self.chunk_remaining
    }

    /// Round `bytes` up to whole blocks and hand back a fresh disk extent.
    pub fn alloc_bytes<D: BlockDevice>(&mut self, device: &mut D, bytes: u64, epoch: u64) -> Result<super::structures::DiskPtr> {
        let block_size = super::structures::BLOCK_SIZE as u64;
        let blocks = (bytes + block_size - 1) / block_size;
        if blocks == 0 {
            return Ok(super::structures::DiskPtr::NULL);
        }
        if self.chunk_remaining < blocks {
            self.refill(device)?;
        }
        if self.chunk_remaining < blocks {
            return Err(SlosError::NoSpace);
        }
        let start = self.chunk_start;
        self.chunk_start += blocks;
        self.chunk_remaining -= blocks;
        Ok(super::structures::DiskPtr::new(start, blocks * block_size, epoch))
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockAllocator for Allocator {
    /// Single-block convenience wrapper used when `Allocator` is itself
    /// plugged into another tree's `TreeOps`/`RadixOps` as its block source.
    fn allocate_block(&mut self) -> Result<u64> {
        // `alloc_bytes` needs a device to refill from; a bare
        // `allocate_block` call (as required by the `BlockAllocator` trait)
        // has none. Refills must happen through `alloc_bytes`, so this path
        // only serves the cached chunk and fails once it is dry -- which in
        // practice never happens because every call site that can drive a
        // refill goes through `alloc_bytes` first.
        if self.chunk_remaining == 0 {
            return Err(SlosError::NoSpace);
        }
        let b = self.chunk_start;
        self.chunk_start += 1;
        self.chunk_remaining -= 1;
        Ok(b)
    }

    fn free_block(&mut self, _block: u64) -> Result<()> {
        // No in-line free: reclaimed only by GC at checkpoint time.
        Ok(())
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use super::super::node::TreeNode;

    struct MemDevice {
        blocks: HashMap<u64, TreeNode>,
    }
    impl MemDevice {
        fn new() -> Self { Self { blocks: HashMap::new() } }
    }
    impl BlockDevice for MemDevice {
        fn read_node(&self, block: u64) -> Result<TreeNode> {
            self.blocks.get(&block).cloned().ok_or(SlosError::NotFound)
        }
        fn write_node(&mut self, block: u64, node: &TreeNode) -> Result<()> {
            self.blocks.insert(block, *node);
            Ok(())
        }
        fn read_block(&self, _block: u64) -> Result<Vec<u8>> { Ok(vec![0u8; 4096]) }
        fn write_block(&mut self, _block: u64, _data: &[u8]) -> Result<()> { Ok(()) }
        fn sync(&mut self) -> Result<()> { Ok(()) }
    }

    #[test]
    fn bootstrap_then_alloc_is_sequential_and_non_overlapping() {
        let mut dev = MemDevice::new();
        let mut alloc = Allocator::new();
        alloc.bootstrap(&mut dev, 1000, 500).unwrap();

        let a = alloc.alloc_bytes(&mut dev, 4096, 1).unwrap();
        let b = alloc.alloc_bytes(&mut dev, 4096 * 3, 1).unwrap();
        assert!(!a.is_null());
        assert_eq!(a.block_count(), 1);
        assert_eq!(b.block_count(), 3);
        assert_ne!(a.offset, b.offset);
        assert!(b.offset >= a.offset + a.block_count());
    }

    #[test]
    fn refill_kicks_in_once_seed_chunk_is_exhausted() {
        let mut dev = MemDevice::new();
        let mut alloc = Allocator::new();
        alloc.amortization_chunk = 4;
        alloc.bootstrap(&mut dev, 1000, 100).unwrap();

        // Exhaust the chunk the offset/size trees seeded (amortization_chunk
        // blocks); the next request must trigger `refill` to pull more from
        // the trees rather than failing.
        for _ in 0..4 {
            alloc.alloc_bytes(&mut dev, 4096, 1).unwrap();
        }
        let after_refill = alloc.alloc_bytes(&mut dev, 4096, 1);
        assert!(after_refill.is_ok());
    }

    #[test]
    fn exhausting_all_space_reports_no_space() {
        let mut dev = MemDevice::new();
        let mut alloc = Allocator::new();
        alloc.amortization_chunk = 4;
        alloc.bootstrap(&mut dev, 1000, 20).unwrap();

        let mut last = Ok(super::super::structures::DiskPtr::NULL);
        for _ in 0..20 {
            last = alloc.alloc_bytes(&mut dev, 4096, 1);
            if last.is_err() {
                break;
            }
        }
        assert!(last.is_err());
    }
}
