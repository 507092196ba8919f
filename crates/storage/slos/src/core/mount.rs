//! Mount and recovery.
//!
//! Mounting means finding the newest valid superblock in the ring,
//! rebuilding the in-memory handles (`BPlusTree`/`Allocator`) the rest of
//! the core needs from the pointers it carries, and handing back a
//! `Mounted` bundle. First mount (an all-unused ring) bootstraps a brand
//! new filesystem instead of recovering one.

#[allow(unused_imports)]
use crate::prelude::*;
use crate::error::{Result, SlosError};
use super::alloc::Allocator;
use super::checkpoint::Checkpointer;
use super::config::SlosConfig;
use super::inode::{InodeOps, RECORD_TYPE_DIR};
use super::node::NodeType;
use super::structures::{
    Superblock, ALLOC_OFFSET_TREE_ID, ALLOC_SIZE_TREE_ID, BLOCK_SIZE, INODE_INDEX_ID,
    ROOT_INODE_ID, SB_RING_SIZE,
};
use super::tree::{BPlusTree, BlockDevice};

/// Everything mounting produces: the chosen superblock, the rebuilt
/// allocator and inode index, and a checkpointer primed at the right
/// epoch/slot to continue the ring.
pub struct Mounted {
    pub superblock: Superblock,
    pub allocator: Allocator,
    pub inode_index: BPlusTree,
    pub checkpointer: Checkpointer,
    pub config: SlosConfig,
}

fn superblock_from_bytes(buf: &[u8]) -> Superblock {
    let mut sb = Superblock::default();
    let sb_size = core::mem::size_of::<Superblock>();
    let dst = unsafe { core::slice::from_raw_parts_mut(&mut sb as *mut Superblock as *mut u8, sb_size) };
    dst.copy_from_slice(&buf[..sb_size]);
    sb
}

/// Scan the superblock ring for the newest slot that passes `is_valid`.
fn find_newest<D: BlockDevice>(device: &mut D) -> Result<Option<Superblock>> {
    let mut best: Option<Superblock> = None;
    for slot in 0..SB_RING_SIZE {
        let bytes = match device.read_block(slot) {
            Ok(b) => b,
            Err(_) => continue,
        };
        let sb = superblock_from_bytes(&bytes);
        if !sb.is_valid() {
            continue;
        }
        if best.as_ref().map(|b| sb.epoch > b.epoch).unwrap_or(true) {
            best = Some(sb);
        }
    }
    Ok(best)
}

/// Bootstrap a brand new filesystem: seed the allocator with all space
/// past the superblock ring and the bootstrap trees, create the root
/// directory inode, and stamp the first superblock.
fn bootstrap<D: BlockDevice>(device: &mut D, total_blocks: u64, config: SlosConfig) -> Result<Mounted> {
    let data_start = SB_RING_SIZE + 16; // ring + headroom for bootstrap tree nodes
    if total_blocks <= data_start {
        return Err(SlosError::NoSpace);
    }

    let mut allocator = Allocator::new();
    allocator.amortization_chunk = config.amortization_chunk;
    allocator.bootstrap(device, data_start, total_blocks - data_start)?;

    let mut inode_index = BPlusTree::new(NodeType::InodeIndex);
    {
        let mut inode_ops = InodeOps::new(device, &mut allocator);
        inode_ops.icreate(&mut inode_index, ROOT_INODE_ID, 0o755, RECORD_TYPE_DIR, 0)?;
    }

    let mut superblock = Superblock::new(0, total_blocks);
    superblock.epoch = 0;
    superblock.inode_index = super::structures::DiskPtr::new(inode_index.root_block, BLOCK_SIZE as u64, 0);
    superblock.alloc_offset_tree = super::structures::DiskPtr::new(allocator.offset_tree.root_block, BLOCK_SIZE as u64, 0);
    superblock.alloc_size_tree = super::structures::DiskPtr::new(allocator.size_tree.root_block, BLOCK_SIZE as u64, 0);
    superblock.update_crc();

    let mut checkpointer = Checkpointer::new(0, 1);
    // Persist slot 0 directly; `checkpointer` starts handing out slot 1 on
    // the first real checkpoint so bootstrap and steady-state never race
    // over the same ring entry.
    let bytes_size = core::mem::size_of::<Superblock>();
    let raw = unsafe { core::slice::from_raw_parts(&superblock as *const Superblock as *const u8, bytes_size) };
    let mut block = vec![0u8; BLOCK_SIZE as usize];
    block[..raw.len()].copy_from_slice(raw);
    device.write_block(0, &block)?;
    device.sync()?;
    let _ = &mut checkpointer; // keep for symmetry with the recovered path

    Ok(Mounted { superblock, allocator, inode_index, checkpointer, config })
}

/// Rebuild allocator/inode-index handles from a recovered superblock's
/// pointers. Heights are not persisted in the superblock; `BPlusTree::height`
/// is cosmetic bookkeeping used only to label a freshly split root's level,
/// never to decide where a leaf is. `TreeOps::descend`/`leftmost_leaf` tell
/// leaves from internal nodes by reading each node's own `level` field as
/// they go, so starting every recovered tree at height 0 costs nothing: the
/// next split just labels the new root's level starting over from 1, which
/// is still nonzero and therefore still reads back as internal.
fn recover(superblock: Superblock, config: SlosConfig) -> Mounted {
    let allocator = Allocator::from_roots(
        BPlusTree::from_root(superblock.alloc_offset_tree.offset, 0, NodeType::AllocOffset, superblock.epoch),
        BPlusTree::from_root(superblock.alloc_size_tree.offset, 0, NodeType::AllocSize, superblock.epoch),
    );
    let inode_index = BPlusTree::from_root(superblock.inode_index.offset, 0, NodeType::InodeIndex, superblock.epoch);
    let next_slot = ((superblock.slot as u64 + 1) % SB_RING_SIZE) as u32;
    let checkpointer = Checkpointer::new(superblock.epoch, next_slot);
    Mounted { superblock, allocator, inode_index, checkpointer, config }
}

/// Mount `device`, which is `total_blocks` long. Recovers the newest valid
/// superblock if one exists, otherwise bootstraps a fresh filesystem.
pub fn mount<D: BlockDevice>(device: &mut D, total_blocks: u64, config: SlosConfig) -> Result<Mounted> {
    match find_newest(device)? {
        Some(sb) => {
            log::debug!("recovering superblock at epoch {}", sb.epoch);
            Ok(recover(sb, config))
        }
        None => {
            log::info!("no valid superblock found, bootstrapping a new filesystem");
            match bootstrap(device, total_blocks, config) {
                Ok(m) => Ok(m),
                Err(e) => {
                    log::error!("bootstrap failed: device too small or allocator seed failed");
                    Err(e)
                }
            }
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use super::super::node::TreeNode;
    use std::collections::HashMap;

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
    fn first_mount_bootstraps_a_fresh_filesystem() {
        let mut dev = MemDevice::new();
        let mounted = mount(&mut dev, 10_000, SlosConfig::default()).unwrap();
        assert_eq!(mounted.superblock.epoch, 0);
        assert!(!mounted.inode_index.is_empty());
    }

    #[test]
    fn second_mount_recovers_the_bootstrapped_superblock() {
        let mut dev = MemDevice::new();
        let first = mount(&mut dev, 10_000, SlosConfig::default()).unwrap();
        drop(first);
        let second = mount(&mut dev, 10_000, SlosConfig::default()).unwrap();
        assert_eq!(second.superblock.epoch, 0);
        assert_eq!(second.superblock.magic, super::super::structures::SLOS_MAGIC);
    }
}
