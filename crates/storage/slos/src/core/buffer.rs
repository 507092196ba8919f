//! Buffer manager contract.
//!
//! The core never touches a block device directly outside of tree/radix
//! node I/O; file data flows through a buffer manager that batches writes
//! and defers them to the next checkpoint. The trait here is the contract
//! a kernel buffer cache (or, in tests, the in-memory implementation below)
//! must satisfy. `BufferStrategy` is the policy hook: what to hand back on
//! a read past end-of-file or into a hole, and whether a write miss should
//! allocate immediately or wait for checkpoint time.

#[allow(unused_imports)]
use crate::prelude::*;
use crate::error::Result;
use super::radix::RadixOps;
use super::structures::{DiskPtr, BLOCK_SIZE};
use super::tree::{BlockAllocator, BlockDevice};

#[cfg(feature = "std")]
use std::collections::BTreeMap;
#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;

/// Policy decisions the buffer manager defers to its caller.
pub trait BufferStrategy {
    /// Contents to hand back for a read that lands in a hole (no block
    /// mapped at this logical offset). Zero-fill is the only sane default
    /// for a sparse object; kept as a hook so a future inline-data layer
    /// can intercept it.
    fn fill_hole(&self, block_size: usize) -> Vec<u8> {
        vec![0u8; block_size]
    }

    /// Whether a dirty buffer over a hole should get a physical block right
    /// away (`true`) or stay unbacked until the next checkpoint walks the
    /// dirty set and allocates in bulk.
    fn allocate_on_write(&self) -> bool {
        false
    }
}

/// Default, checkpoint-deferred policy.
pub struct DeferredAllocation;
impl BufferStrategy for DeferredAllocation {}

/// Contract every buffer cache (kernel or test double) must implement.
pub trait BufferManager {
    /// Read a block's current contents. A cache hit returns straight from
    /// the buffer; a miss resolves `radix_root` (0 if the object has none
    /// yet) through the radix tree to a physical block and reads it from
    /// `device`, falling back to the configured `BufferStrategy` only for a
    /// genuine hole (unmapped logical block, or no radix tree at all).
    fn get<D: BlockDevice, A: BlockAllocator>(
        &mut self,
        device: &mut D,
        allocator: &mut A,
        radix_root: u64,
        object_id: u64,
        logical_block: u64,
    ) -> Result<Vec<u8>>;

    /// Mark an already-cached block as dirty without changing its
    /// contents (e.g. after a partial in-place mutation the caller made
    /// directly on a buffer it already holds).
    fn mark_dirty(&mut self, object_id: u64, logical_block: u64) -> Result<()>;

    /// Overwrite a block's cached contents and mark it dirty. The write is
    /// not visible on disk until `flush_object` (or a checkpoint) runs.
    fn write_delayed(&mut self, object_id: u64, logical_block: u64, data: &[u8]) -> Result<()>;

    /// Drop a cached block without writing it back, discarding any pending
    /// dirty data. Used when an object is truncated or removed.
    fn invalidate(&mut self, object_id: u64, logical_block: u64) -> Result<()>;

    /// Write every dirty block belonging to `object_id` back through the
    /// radix tree and clear their dirty bits. Called by the checkpoint
    /// syncer; also callable directly for an fsync-style request.
    fn flush_object(&mut self, object_id: u64) -> Result<Vec<(u64, Vec<u8>)>>;
}

struct CachedBlock {
    data: Vec<u8>,
    dirty: bool,
    /// Whether this entry is backed by a block the allocator already knows
    /// about (`Some`) or is still waiting for one at flush time (`None`).
    managed: Option<DiskPtr>,
}

/// Reference buffer manager used by tests and by tools that don't need a
/// real page cache. Keeps every dirty block in memory until flushed.
pub struct InMemoryBufferManager<S: BufferStrategy> {
    blocks: BTreeMap<(u64, u64), CachedBlock>,
    strategy: S,
}

impl<S: BufferStrategy> InMemoryBufferManager<S> {
    pub fn new(strategy: S) -> Self {
        Self { blocks: BTreeMap::new(), strategy }
    }

    pub fn is_dirty(&self, object_id: u64, logical_block: u64) -> bool {
        self.blocks.get(&(object_id, logical_block)).map(|b| b.dirty).unwrap_or(false)
    }
}

impl<S: BufferStrategy> BufferManager for InMemoryBufferManager<S> {
    fn get<D: BlockDevice, A: BlockAllocator>(
        &mut self,
        device: &mut D,
        allocator: &mut A,
        radix_root: u64,
        object_id: u64,
        logical_block: u64,
    ) -> Result<Vec<u8>> {
        if let Some(entry) = self.blocks.get(&(object_id, logical_block)) {
            return Ok(entry.data.clone());
        }
        if radix_root != 0 {
            let mut radix_ops = RadixOps::new(device, allocator);
            let entry = radix_ops.find(radix_root, logical_block)?;
            if !entry.is_inval() {
                return device.read_block(entry.block);
            }
        }
        Ok(self.strategy.fill_hole(BLOCK_SIZE as usize))
    }

    fn mark_dirty(&mut self, object_id: u64, logical_block: u64) -> Result<()> {
        if let Some(entry) = self.blocks.get_mut(&(object_id, logical_block)) {
            entry.dirty = true;
        }
        Ok(())
    }

    fn write_delayed(&mut self, object_id: u64, logical_block: u64, data: &[u8]) -> Result<()> {
        let entry = self.blocks.entry((object_id, logical_block)).or_insert_with(|| CachedBlock {
            data: vec![0u8; BLOCK_SIZE as usize],
            dirty: false,
            managed: None,
        });
        let n = data.len().min(entry.data.len());
        entry.data[..n].copy_from_slice(&data[..n]);
        entry.dirty = true;
        Ok(())
    }

    fn invalidate(&mut self, object_id: u64, logical_block: u64) -> Result<()> {
        self.blocks.remove(&(object_id, logical_block));
        Ok(())
    }

    fn flush_object(&mut self, object_id: u64) -> Result<Vec<(u64, Vec<u8>)>> {
        let mut flushed = Vec::new();
        for (&(obj, block), entry) in self.blocks.iter_mut() {
            if obj == object_id && entry.dirty {
                entry.dirty = false;
                flushed.push((block, entry.data.clone()));
            }
        }
        Ok(flushed)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use super::super::node::TreeNode;
    use super::super::radix::RadixOps;
    use crate::error::SlosError;
    use std::collections::HashMap;

    struct MemDevice {
        nodes: HashMap<u64, TreeNode>,
        blocks: HashMap<u64, Vec<u8>>,
        next: u64,
    }
    impl MemDevice {
        fn new() -> Self { Self { nodes: HashMap::new(), blocks: HashMap::new(), next: 1 } }
    }
    impl BlockDevice for MemDevice {
        fn read_node(&self, block: u64) -> Result<TreeNode> {
            self.nodes.get(&block).cloned().ok_or(SlosError::NotFound)
        }
        fn write_node(&mut self, block: u64, node: &TreeNode) -> Result<()> {
            self.nodes.insert(block, *node);
            Ok(())
        }
        fn read_block(&self, block: u64) -> Result<Vec<u8>> {
            Ok(self.blocks.get(&block).cloned().unwrap_or_else(|| vec![0u8; BLOCK_SIZE as usize]))
        }
        fn write_block(&mut self, block: u64, data: &[u8]) -> Result<()> {
            self.blocks.insert(block, data.to_vec());
            Ok(())
        }
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

    fn split_borrow(dev: &mut MemDevice) -> (&mut MemDevice, &mut MemDevice) {
        let ptr = dev as *mut MemDevice;
        unsafe { (&mut *ptr, &mut *ptr) }
    }

    #[test]
    fn write_then_get_returns_written_bytes() {
        let mut dev = MemDevice::new();
        let mut mgr = InMemoryBufferManager::new(DeferredAllocation);
        let mut data = vec![0u8; BLOCK_SIZE as usize];
        data[0] = 7;
        mgr.write_delayed(100_000, 0, &data).unwrap();
        let (a, b) = split_borrow(&mut dev);
        let back = mgr.get(a, b, 0, 100_000, 0).unwrap();
        assert_eq!(back[0], 7);
    }

    #[test]
    fn unwritten_block_with_no_radix_root_is_zero_filled() {
        let mut dev = MemDevice::new();
        let mut mgr = InMemoryBufferManager::new(DeferredAllocation);
        let (a, b) = split_borrow(&mut dev);
        let back = mgr.get(a, b, 0, 100_000, 3).unwrap();
        assert!(back.iter().all(|&b| b == 0));
    }

    #[test]
    fn cache_miss_reads_through_radix_tree_to_device() {
        let mut dev = MemDevice::new();
        let (a, b) = split_borrow(&mut dev);
        let mut radix_ops = RadixOps::new(a, b);
        let root = radix_ops.create_root().unwrap();
        let root = radix_ops.insert(root, 3, 9000, 1).unwrap();
        dev.write_block(9000, &[0xBBu8; BLOCK_SIZE as usize]).unwrap();

        let mut mgr = InMemoryBufferManager::new(DeferredAllocation);
        let (a, b) = split_borrow(&mut dev);
        let back = mgr.get(a, b, root, 100_000, 3).unwrap();
        assert!(back.iter().all(|&v| v == 0xBB));
    }

    #[test]
    fn cache_miss_on_unmapped_key_in_a_real_radix_tree_is_zero_filled() {
        let mut dev = MemDevice::new();
        let (a, b) = split_borrow(&mut dev);
        let mut radix_ops = RadixOps::new(a, b);
        let root = radix_ops.create_root().unwrap();

        let mut mgr = InMemoryBufferManager::new(DeferredAllocation);
        let (a, b) = split_borrow(&mut dev);
        let back = mgr.get(a, b, root, 100_000, 3).unwrap();
        assert!(back.iter().all(|&v| v == 0));
    }

    #[test]
    fn flush_object_drains_dirty_and_only_that_object() {
        let mut mgr = InMemoryBufferManager::new(DeferredAllocation);
        mgr.write_delayed(100_000, 0, &[1u8; 4096]).unwrap();
        mgr.write_delayed(100_001, 0, &[2u8; 4096]).unwrap();
        let flushed = mgr.flush_object(100_000).unwrap();
        assert_eq!(flushed.len(), 1);
        assert!(!mgr.is_dirty(100_000, 0));
        assert!(mgr.is_dirty(100_001, 0));
    }
}
