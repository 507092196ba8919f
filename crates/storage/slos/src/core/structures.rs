//! Core on-disk constants and the superblock record.

#[allow(unused_imports)]
use crate::prelude::*;
use crate::crc32;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Superblock magic. Chosen to be unlikely to collide with other on-disk
/// formats when scanning raw devices during recovery.
pub const SLOS_MAGIC: u64 = 0x19AA_8455_1155_05AA;

/// Filesystem format version.
pub const SLOS_VERSION: u16 = 1;

/// Block size, fixed for the lifetime of a filesystem instance.
pub const BLOCK_SIZE: u32 = 4096;

/// Sector size assumed of the underlying block device.
pub const SECTOR_SIZE: u32 = 512;

/// Number of slots in the superblock ring.
pub const SB_RING_SIZE: u64 = 100;

/// Sentinel epoch meaning "this superblock slot has never been written".
pub const EPOCH_UNUSED: u64 = u64::MAX;

/// Default allocator refill size, in blocks (spec: `amortization_chunk`).
pub const DEFAULT_AMORTIZATION_CHUNK: u64 = 1024;

/// Inode ids below this value are reserved for filesystem-internal objects
/// (inode index, the two allocator trees, the checksum tree, root).
pub const RESERVED_INODE_CEILING: u64 = 100_000;

pub const INODE_INDEX_ID: u64 = 1;
pub const ALLOC_OFFSET_TREE_ID: u64 = 2;
pub const ALLOC_SIZE_TREE_ID: u64 = 3;
pub const CHECKSUM_TREE_ID: u64 = 4;
pub const ROOT_INODE_ID: u64 = RESERVED_INODE_CEILING;

// ============================================================================
// DISK POINTER
// ============================================================================

/// A pointer to an on-disk extent: `offset` blocks in, `size` bytes long,
/// stamped with the checkpoint epoch that wrote it. Offset 0 is reserved
/// and never allocated, so it doubles as the "null" pointer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DiskPtr {
    pub offset: u64,
    pub size: u64,
    pub epoch: u64,
}

impl DiskPtr {
    pub const NULL: DiskPtr = DiskPtr { offset: 0, size: 0, epoch: 0 };

    pub fn new(offset: u64, size: u64, epoch: u64) -> Self {
        Self { offset, size, epoch }
    }

    pub fn is_null(&self) -> bool {
        self.offset == 0
    }

    pub fn block_count(&self) -> u64 {
        (self.size + BLOCK_SIZE as u64 - 1) / BLOCK_SIZE as u64
    }
}

// ============================================================================
// SUPERBLOCK
// ============================================================================

/// Size of a superblock record as written into the ring.
pub const SUPERBLOCK_SIZE: usize = 256;

/// One slot of the superblock ring. The newest valid slot (maximum epoch,
/// matching magic, passing CRC) describes the mounted filesystem.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Superblock {
    pub magic: u64,
    pub version: u16,
    pub flags: u16,
    pub slot: u32,

    pub block_size: u32,
    pub sector_size: u32,

    pub total_blocks: u64,
    pub epoch: u64,

    pub inode_index: DiskPtr,
    pub alloc_offset_tree: DiskPtr,
    pub alloc_size_tree: DiskPtr,
    pub checksum_tree: DiskPtr,

    pub data_bytes_synced: u64,
    pub meta_bytes_synced: u64,
    pub checkpoint_attempts: u64,

    pub reserved: [u8; 56],

    pub crc32: u32,
    pub _pad: u32,
}

/// Bytes covered by the CRC (everything before the `crc32` field).
pub const SUPERBLOCK_CRC_OFFSET: usize = SUPERBLOCK_SIZE - 8;

impl Superblock {
    pub fn new(slot: u32, total_blocks: u64) -> Self {
        Self {
            magic: SLOS_MAGIC,
            version: SLOS_VERSION,
            flags: 0,
            slot,
            block_size: BLOCK_SIZE,
            sector_size: SECTOR_SIZE,
            total_blocks,
            epoch: EPOCH_UNUSED,
            inode_index: DiskPtr::NULL,
            alloc_offset_tree: DiskPtr::NULL,
            alloc_size_tree: DiskPtr::NULL,
            checksum_tree: DiskPtr::NULL,
            data_bytes_synced: 0,
            meta_bytes_synced: 0,
            checkpoint_attempts: 0,
            reserved: [0; 56],
            crc32: 0,
            _pad: 0,
        }
    }

    pub fn update_crc(&mut self) {
        self.crc32 = self.calculate_crc();
    }

    pub fn calculate_crc(&self) -> u32 {
        let bytes = unsafe {
            core::slice::from_raw_parts(self as *const _ as *const u8, SUPERBLOCK_CRC_OFFSET)
        };
        crc32(bytes)
    }

    pub fn verify_crc(&self) -> bool {
        self.crc32 == self.calculate_crc()
    }

    /// A slot is usable for recovery if its magic and version match, its
    /// epoch is not the "unused" sentinel, and its checksum is intact.
    pub fn is_valid(&self) -> bool {
        self.magic == SLOS_MAGIC
            && self.version == SLOS_VERSION
            && self.epoch != EPOCH_UNUSED
            && self.verify_crc()
    }
}

impl Default for Superblock {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

// ============================================================================
// COMPILE-TIME CHECKS
// ============================================================================

const _: () = assert!(core::mem::size_of::<Superblock>() == SUPERBLOCK_SIZE);
const _: () = assert!(core::mem::size_of::<DiskPtr>() == 24);
