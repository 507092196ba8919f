//! Core, on-disk-format implementation of the object store: the node
//! layout shared by every tree, the generic CoW B+tree engine, the
//! fixed-depth radix tree used for per-file block maps, the dual-tree
//! block allocator, the inode object, the buffer manager contract, and
//! checkpoint/mount orchestration.

pub mod alloc;
pub mod buffer;
pub mod checkpoint;
pub mod config;
pub mod inode;
pub mod mount;
pub mod node;
pub mod radix;
pub mod structures;
pub mod sync;
pub mod tree;

pub use alloc::{Allocator, FreeRange};
pub use buffer::{BufferManager, BufferStrategy, InMemoryBufferManager};
pub use checkpoint::Checkpointer;
pub use config::SlosConfig;
pub use inode::{Inode, InodeOps, RECORD_TYPE_BLOB, RECORD_TYPE_DIR};
pub use mount::{mount, Mounted};
pub use node::{InternalEntry, NodeType, TreeNode, MAX_INTERNAL_ENTRIES, NODE_DATA_SIZE, NODE_HEADER_SIZE};
pub use radix::{RadixEntry, RadixOps, RADIX_DEPTH, RADIX_FANOUT, RADIX_INVAL, RADIX_MAX_KEY};
pub use structures::{
    DiskPtr, Superblock, ALLOC_OFFSET_TREE_ID, ALLOC_SIZE_TREE_ID, BLOCK_SIZE, CHECKSUM_TREE_ID,
    EPOCH_UNUSED, INODE_INDEX_ID, RESERVED_INODE_CEILING, ROOT_INODE_ID, SB_RING_SIZE, SLOS_MAGIC,
    SLOS_VERSION,
};
pub use sync::SharedMount;
pub use tree::{BPlusTree, BlockAllocator, BlockDevice, TreeKey, TreeOps, TreeValue};

#[cfg(test)]
mod tests;
