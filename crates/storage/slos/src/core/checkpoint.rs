//! Epoch-based checkpoint and superblock rotation.
//!
//! A checkpoint is the only point at which dirty buffers become durable:
//! it drains the buffer manager's dirty set object by object, writes each
//! flushed block through that object's radix tree, folds the updated tree
//! roots into a fresh superblock, and advances the superblock ring. Every
//! step before the final superblock write is invisible on a crash; the
//! write of the new ring slot is the only action that must be atomic, and
//! it is -- one block, one write.

#[allow(unused_imports)]
use crate::prelude::*;
use crate::error::Result;
use super::alloc::Allocator;
use super::buffer::BufferManager;
use super::inode::InodeOps;
use super::radix::RadixOps;
use super::structures::{DiskPtr, Superblock, BLOCK_SIZE, SB_RING_SIZE};
use super::tree::{BPlusTree, BlockDevice};

fn superblock_bytes(sb: &Superblock) -> Vec<u8> {
    let raw = unsafe {
        core::slice::from_raw_parts(sb as *const Superblock as *const u8, core::mem::size_of::<Superblock>())
    };
    let mut buf = vec![0u8; BLOCK_SIZE as usize];
    buf[..raw.len()].copy_from_slice(raw);
    buf
}

/// Drives one filesystem's checkpoints. Holds only the bookkeeping a
/// syncer thread needs between runs; the trees, allocator, and buffer
/// manager it operates on are borrowed for the duration of a single
/// `run` call.
pub struct Checkpointer {
    epoch: u64,
    next_slot: u32,
    dirty_node_count: u64,
    attempted_checkpoints: u64,
}

impl Checkpointer {
    pub fn new(epoch: u64, next_slot: u32) -> Self {
        Self { epoch, next_slot, dirty_node_count: 0, attempted_checkpoints: 0 }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Total `run` calls so far, including ones that found nothing dirty
    /// and skipped the superblock write. Folded into the superblock's own
    /// `checkpoint_attempts` the next time a run actually writes.
    pub fn attempted_checkpoints(&self) -> u64 {
        self.attempted_checkpoints
    }

    /// Call once per CoW'd tree node produced since the last checkpoint, so
    /// the next `run` can size its preflight reservation check.
    pub fn note_dirty_node(&mut self) {
        self.dirty_node_count += 1;
    }

    /// Blocks a checkpoint's own metadata writes are expected to consume,
    /// per the allocator/inode-index trees it will mutate while flushing.
    /// A factor of 5 covers a leaf write plus up to four levels of
    /// ancestor CoW on the way back to the root.
    pub fn reservation_blocks(&self) -> u64 {
        5 * self.dirty_node_count
    }

    /// Run one checkpoint. `dirty_object_ids` are the inode ids whose
    /// buffered blocks (per `buffers`) need writing back; `now` stamps
    /// inode mtimes touched by the flush.
    ///
    /// If draining every object in `dirty_object_ids` turns up no actual
    /// dirty data, the rest of the run (tree-root restamping, epoch bump,
    /// superblock write) is skipped entirely -- only `attempted_checkpoints`
    /// moves. A second checkpoint with nothing dirty therefore leaves the
    /// on-disk superblock bit-for-bit the same as the first.
    pub fn run<D: BlockDevice, B: BufferManager>(
        &mut self,
        device: &mut D,
        allocator: &mut Allocator,
        buffers: &mut B,
        inode_index: &mut BPlusTree,
        superblock: &mut Superblock,
        dirty_object_ids: &[u64],
    ) -> Result<()> {
        self.attempted_checkpoints += 1;

        let mut per_object = Vec::with_capacity(dirty_object_ids.len());
        let mut any_dirty = false;
        for &object_id in dirty_object_ids {
            let flushed = buffers.flush_object(object_id)?;
            if !flushed.is_empty() {
                any_dirty = true;
            }
            per_object.push((object_id, flushed));
        }

        if !any_dirty {
            log::debug!("checkpoint at epoch {} found nothing dirty, skipping superblock write", self.epoch);
            return Ok(());
        }

        let next_epoch = self.epoch + 1;

        for (object_id, flushed) in per_object {
            if flushed.is_empty() {
                continue;
            }

            let mut inode = {
                let inode_ops = InodeOps::new(device, allocator);
                inode_ops.iopen(inode_index, object_id)?
            };

            let mut root = if inode.radix_root.is_null() {
                let mut radix_ops = RadixOps::new(device, allocator);
                radix_ops.create_root()?
            } else {
                inode.radix_root.offset
            };

            // flush_object yields blocks in ascending logical order; batch
            // consecutive runs so each lands on a single contiguous physical
            // extent instead of one allocation and one radix insert per block.
            let mut i = 0;
            while i < flushed.len() {
                let mut j = i + 1;
                while j < flushed.len() && flushed[j].0 == flushed[j - 1].0 + 1 {
                    j += 1;
                }
                let run = &flushed[i..j];
                let phys = allocator.alloc_bytes(device, run.len() as u64 * BLOCK_SIZE as u64, next_epoch)?;
                for (k, (_, data)) in run.iter().enumerate() {
                    device.write_block(phys.offset + k as u64, data)?;
                }
                let mut radix_ops = RadixOps::new(device, allocator);
                root = radix_ops.extent_replace(root, run[0].0, phys.offset, run.len() as u64, next_epoch)?;
                let last_logical = run[run.len() - 1].0;
                inode.size = inode.size.max((last_logical + 1) * BLOCK_SIZE as u64);
                inode.blocks += run.len() as u64;
                i = j;
            }

            inode.radix_root = DiskPtr::new(root, BLOCK_SIZE as u64, next_epoch);
            inode.mtime = next_epoch;
            let mut inode_ops = InodeOps::new(device, allocator);
            inode_ops.iupdate(inode_index, inode)?;
        }

        superblock.epoch = next_epoch;
        superblock.inode_index = DiskPtr::new(inode_index.root_block, BLOCK_SIZE as u64, next_epoch);
        superblock.alloc_offset_tree = DiskPtr::new(allocator.offset_tree.root_block, BLOCK_SIZE as u64, next_epoch);
        superblock.alloc_size_tree = DiskPtr::new(allocator.size_tree.root_block, BLOCK_SIZE as u64, next_epoch);
        superblock.checkpoint_attempts = self.attempted_checkpoints;
        superblock.slot = self.next_slot;
        superblock.update_crc();

        let bytes = superblock_bytes(superblock);
        if let Err(e) = device.write_block(self.next_slot as u64, &bytes) {
            log::error!("checkpoint failed writing superblock slot {}", self.next_slot);
            return Err(e);
        }
        device.sync()?;
        log::debug!("checkpoint committed at epoch {}", next_epoch);

        self.epoch = next_epoch;
        self.next_slot = ((self.next_slot as u64 + 1) % SB_RING_SIZE) as u32;
        self.dirty_node_count = 0;
        Ok(())
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use super::super::buffer::{DeferredAllocation, InMemoryBufferManager};
    use super::super::config::SlosConfig;
    use super::super::inode::RECORD_TYPE_BLOB;
    use super::super::mount::{mount, Mounted};
    use super::super::node::TreeNode;
    use crate::error::SlosError;
    use std::collections::HashMap;

    #[test]
    fn reservation_scales_with_dirty_nodes() {
        let mut ckpt = Checkpointer::new(0, 0);
        assert_eq!(ckpt.reservation_blocks(), 0);
        ckpt.note_dirty_node();
        ckpt.note_dirty_node();
        assert_eq!(ckpt.reservation_blocks(), 10);
    }

    struct MemDevice {
        nodes: HashMap<u64, TreeNode>,
        blocks: HashMap<u64, Vec<u8>>,
    }
    impl MemDevice {
        fn new() -> Self { Self { nodes: HashMap::new(), blocks: HashMap::new() } }
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

    #[test]
    fn flush_maps_dirty_blocks_through_the_radix_tree() {
        let mut dev = MemDevice::new();
        let Mounted { mut superblock, mut allocator, mut inode_index, mut checkpointer, .. } =
            mount(&mut dev, 10_000, SlosConfig::default()).unwrap();

        {
            let mut inode_ops = InodeOps::new(&mut dev, &mut allocator);
            inode_ops.icreate(&mut inode_index, 100_000, 0o644, RECORD_TYPE_BLOB, 0).unwrap();
        }
        let mut buffers = InMemoryBufferManager::new(DeferredAllocation);
        buffers.write_delayed(100_000, 0, &[0xAAu8; BLOCK_SIZE as usize]).unwrap();
        buffers.write_delayed(100_000, 1, &[0xBBu8; BLOCK_SIZE as usize]).unwrap();

        checkpointer
            .run(&mut dev, &mut allocator, &mut buffers, &mut inode_index, &mut superblock, &[100_000])
            .unwrap();

        let inode = {
            let inode_ops = InodeOps::new(&mut dev, &mut allocator);
            inode_ops.iopen(&inode_index, 100_000).unwrap()
        };
        assert_eq!(inode.size, 2 * BLOCK_SIZE as u64);
        assert!(!inode.radix_root.is_null());

        let mut radix_ops = RadixOps::new(&mut dev, &mut allocator);
        let entry0 = radix_ops.find(inode.radix_root.offset, 0).unwrap();
        let entry1 = radix_ops.find(inode.radix_root.offset, 1).unwrap();
        assert_eq!(dev.read_block(entry0.block).unwrap(), vec![0xAAu8; BLOCK_SIZE as usize]);
        assert_eq!(dev.read_block(entry1.block).unwrap(), vec![0xBBu8; BLOCK_SIZE as usize]);
    }

    #[test]
    fn second_no_dirty_checkpoint_is_bit_identical_to_the_first() {
        let mut dev = MemDevice::new();
        let Mounted { mut superblock, mut allocator, mut inode_index, mut checkpointer, .. } =
            mount(&mut dev, 10_000, SlosConfig::default()).unwrap();

        {
            let mut inode_ops = InodeOps::new(&mut dev, &mut allocator);
            inode_ops.icreate(&mut inode_index, 100_000, 0o644, RECORD_TYPE_BLOB, 0).unwrap();
        }
        let mut buffers = InMemoryBufferManager::new(DeferredAllocation);
        buffers.write_delayed(100_000, 0, &[0xAAu8; BLOCK_SIZE as usize]).unwrap();
        checkpointer
            .run(&mut dev, &mut allocator, &mut buffers, &mut inode_index, &mut superblock, &[100_000])
            .unwrap();
        let epoch_after_first = superblock.epoch;
        let bytes_after_first = superblock_bytes(&superblock);

        checkpointer
            .run(&mut dev, &mut allocator, &mut buffers, &mut inode_index, &mut superblock, &[100_000])
            .unwrap();

        assert_eq!(superblock.epoch, epoch_after_first);
        assert_eq!(superblock_bytes(&superblock), bytes_after_first);
        assert_eq!(checkpointer.attempted_checkpoints(), 2);
    }
}
