//! A single-level, copy-on-write object store.
//!
//! Objects (files and directories alike, tagged by record type) live behind
//! one flat inode index; each object's bytes are reached through a
//! fixed-depth radix tree mapping logical block to physical block, not
//! through a conventional extent list. All metadata -- the inode index,
//! the allocator's two trees, the per-object radix trees -- is the same
//! generic copy-on-write B+tree/radix node, so a single node format and a
//! single CRC scheme cover the whole disk.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │         Superblock ring (SB_RING_SIZE slots)          │
//! │  - Magic, epoch, CRC                                  │
//! │  - Inode index root  /  Allocator tree roots          │
//! └──────────────────────────────────────────────────────┘
//!                       │
//!      ┌────────────────┼────────────────┐
//!      │                │                │
//!  Inode index    Allocator offset   Allocator size
//!   (B+Tree)         tree (B+Tree)    tree (B+Tree)
//!      │
//!   Inode record
//!      │
//!  Radix tree (per object)
//!      │
//!   Data blocks
//! ```
//!
//! ## Disk Layout
//!
//! ```text
//! Blocks 0..SB_RING_SIZE:  Superblock ring
//! Blocks SB_RING_SIZE+:    B+tree / radix nodes and data, allocator-managed
//! ```
//!
//! ## Checkpoint Model
//!
//! Every mutation is copy-on-write in memory; nothing is durable until a
//! checkpoint runs:
//!
//! 1. Flush each dirty object's buffered blocks through its radix tree
//! 2. Fold the updated inode-index and allocator tree roots into a fresh
//!    superblock
//! 3. Write that superblock into the next ring slot and advance the epoch
//!
//! A crash at any point before step 3's write leaves the previous epoch's
//! superblock intact and recoverable; no write-ahead log is needed because
//! nothing is ever modified in place.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

/// Prelude module for no_std/std compatibility
pub mod prelude {
    pub use core::option::Option::{self, None, Some};
    pub use core::result::Result::{self, Err, Ok};
    pub use core::default::Default;
    pub use core::clone::Clone;
    pub use core::marker::{Copy, Send, Sync};
    pub use core::cmp::{Eq, Ord, PartialEq, PartialOrd};
    pub use core::fmt::Debug;
    pub use core::convert::{From, Into};
    pub use core::iter::Iterator;

    #[cfg(feature = "std")]
    pub use std::{vec::Vec, vec, string::String, boxed::Box};

    #[cfg(not(feature = "std"))]
    pub use alloc::{vec::Vec, vec, string::String, boxed::Box};
}

#[allow(unused_imports)]
use prelude::*;

pub mod error;

pub mod core;

pub use error::{Result, SlosError};

pub use core::{
    // Structures
    Superblock, DiskPtr, TreeNode, NodeType, Inode,

    // Tree and radix operations
    BPlusTree, TreeOps, TreeKey, TreeValue,
    RadixOps, RadixEntry,

    // Allocation, buffering, checkpointing, mount
    Allocator, FreeRange,
    BufferManager, BufferStrategy, InMemoryBufferManager,
    Checkpointer,
    mount, Mounted, SharedMount,
    SlosConfig,
    InodeOps,

    // Device/allocator contracts
    BlockDevice, BlockAllocator,

    // Constants
    SLOS_MAGIC, SLOS_VERSION, BLOCK_SIZE, SB_RING_SIZE, EPOCH_UNUSED,
    RESERVED_INODE_CEILING, ROOT_INODE_ID, INODE_INDEX_ID,
    ALLOC_OFFSET_TREE_ID, ALLOC_SIZE_TREE_ID, CHECKSUM_TREE_ID,
    RADIX_DEPTH, RADIX_FANOUT, RADIX_MAX_KEY, RADIX_INVAL,
};

/// CRC32 used for every on-disk structure: superblocks, tree/radix nodes,
/// and inode records.
pub fn crc32(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc: u32 = 0xFFFFFFFF;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY
            } else {
                crc >> 1
            };
        }
    }

    !crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32() {
        // Standard CRC32 test vectors
        assert_eq!(crc32(b""), 0x00000000);
        assert_eq!(crc32(b"a"), 0xE8B7BE43);
        assert_eq!(crc32(b"abc"), 0x352441C2);
        assert_eq!(crc32(b"message digest"), 0x20159D7F);
    }
}
