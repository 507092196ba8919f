//! The inode object and the inode index tree built on top of it.
//!
//! An inode carries no block list of its own; it points at the root of a
//! per-file radix tree (see the `radix` module) that maps logical block
//! index to physical block and the epoch that wrote it. The inode index
//! itself is an ordinary instance of the generic B+tree keyed by inode id.

#[allow(unused_imports)]
use crate::prelude::*;
use crate::crc32;
use crate::error::{Result, SlosError};
use super::structures::DiskPtr;
use super::tree::{BPlusTree, BlockAllocator, BlockDevice, TreeOps, TreeValue};

/// A plain byte-addressed object (a file, in VFS terms).
pub const RECORD_TYPE_BLOB: u8 = 1;
/// An object whose bytes are a directory-entry encoding, interpreted by a
/// layer above the core.
pub const RECORD_TYPE_DIR: u8 = 2;

pub const INODE_RECORD_SIZE: usize = 120;

/// On-disk inode record, stored as the inode index tree's value type.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Inode {
    pub inode_num: u64,
    pub mode: u32,
    pub record_type: u8,
    pub flags: u8,
    pub nlink: u32,
    pub size: u64,
    pub blocks: u64,
    pub uid: u32,
    pub gid: u32,
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
    pub birthtime: u64,
    pub radix_root: DiskPtr,
    pub generation: u64,
    pub crc32: u32,
}

impl Inode {
    pub fn new(inode_num: u64, mode: u32, record_type: u8, now: u64) -> Self {
        let mut inode = Self {
            inode_num,
            mode,
            record_type,
            flags: 0,
            nlink: 1,
            size: 0,
            blocks: 0,
            uid: 0,
            gid: 0,
            atime: now,
            mtime: now,
            ctime: now,
            birthtime: now,
            radix_root: DiskPtr::NULL,
            generation: 0,
            crc32: 0,
        };
        inode.update_crc();
        inode
    }

    pub fn is_blob(&self) -> bool {
        self.record_type == RECORD_TYPE_BLOB
    }

    pub fn is_dir(&self) -> bool {
        self.record_type == RECORD_TYPE_DIR
    }

    fn crc_bytes(&self) -> [u8; INODE_RECORD_SIZE - 4] {
        let mut buf = [0u8; INODE_RECORD_SIZE - 4];
        let mut w = Writer { buf: &mut buf, pos: 0 };
        w.put_u64(self.inode_num);
        w.put_u32(self.mode);
        w.put_u8(self.record_type);
        w.put_u8(self.flags);
        w.put_u32(self.nlink);
        w.put_u64(self.size);
        w.put_u64(self.blocks);
        w.put_u32(self.uid);
        w.put_u32(self.gid);
        w.put_u64(self.atime);
        w.put_u64(self.mtime);
        w.put_u64(self.ctime);
        w.put_u64(self.birthtime);
        w.put_u64(self.radix_root.offset);
        w.put_u64(self.radix_root.size);
        w.put_u64(self.radix_root.epoch);
        w.put_u64(self.generation);
        buf
    }

    pub fn calculate_crc(&self) -> u32 {
        crc32(&self.crc_bytes())
    }

    pub fn update_crc(&mut self) {
        self.crc32 = self.calculate_crc();
    }

    pub fn verify_crc(&self) -> bool {
        self.crc32 == self.calculate_crc()
    }
}

struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    fn put_u8(&mut self, v: u8) {
        self.buf[self.pos] = v;
        self.pos += 1;
    }
    fn put_u32(&mut self, v: u32) {
        self.buf[self.pos..self.pos + 4].copy_from_slice(&v.to_le_bytes());
        self.pos += 4;
    }
    fn put_u64(&mut self, v: u64) {
        self.buf[self.pos..self.pos + 8].copy_from_slice(&v.to_le_bytes());
        self.pos += 8;
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn get_u8(&mut self) -> u8 {
        let v = self.buf[self.pos];
        self.pos += 1;
        v
    }
    fn get_u32(&mut self) -> u32 {
        let v = u32::from_le_bytes(self.buf[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        v
    }
    fn get_u64(&mut self) -> u64 {
        let v = u64::from_le_bytes(self.buf[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        v
    }
}

impl TreeValue for Inode {
    const SIZE: usize = INODE_RECORD_SIZE;

    fn serialize(&self, buf: &mut [u8]) {
        let body = self.crc_bytes();
        buf[..body.len()].copy_from_slice(&body);
        buf[body.len()..body.len() + 4].copy_from_slice(&self.crc32.to_le_bytes());
    }

    fn deserialize(buf: &[u8]) -> Self {
        let mut r = Reader { buf, pos: 0 };
        let inode_num = r.get_u64();
        let mode = r.get_u32();
        let record_type = r.get_u8();
        let flags = r.get_u8();
        let nlink = r.get_u32();
        let size = r.get_u64();
        let blocks = r.get_u64();
        let uid = r.get_u32();
        let gid = r.get_u32();
        let atime = r.get_u64();
        let mtime = r.get_u64();
        let ctime = r.get_u64();
        let birthtime = r.get_u64();
        let radix_offset = r.get_u64();
        let radix_size = r.get_u64();
        let radix_epoch = r.get_u64();
        let generation = r.get_u64();
        let crc32 = u32::from_le_bytes(buf[r.pos..r.pos + 4].try_into().unwrap());
        Self {
            inode_num,
            mode,
            record_type,
            flags,
            nlink,
            size,
            blocks,
            uid,
            gid,
            atime,
            mtime,
            ctime,
            birthtime,
            radix_root: DiskPtr::new(radix_offset, radix_size, radix_epoch),
            generation,
            crc32,
        }
    }
}

const _: () = assert!(INODE_RECORD_SIZE >= 8 + 4 + 1 + 1 + 4 + 8 + 8 + 4 + 4 + 8 * 4 + 24 + 8 + 4);

/// Create, open, update and remove operations against the inode index
/// tree. A thin wrapper over `TreeOps` keyed by inode id; the trees it
/// reads and writes are handed in by the caller (mount state) so this
/// struct stays borrow-free between calls.
pub struct InodeOps<'a, D: BlockDevice, A: BlockAllocator> {
    ops: TreeOps<'a, D, A>,
}

impl<'a, D: BlockDevice, A: BlockAllocator> InodeOps<'a, D, A> {
    pub fn new(device: &'a mut D, allocator: &'a mut A) -> Self {
        Self { ops: TreeOps::new(device, allocator) }
    }

    pub fn icreate(
        &mut self,
        index: &mut BPlusTree,
        inode_num: u64,
        mode: u32,
        record_type: u8,
        now: u64,
    ) -> Result<Inode> {
        let inode = Inode::new(inode_num, mode, record_type, now);
        self.ops.insert(index, inode_num, inode)?;
        Ok(inode)
    }

    pub fn iopen(&self, index: &BPlusTree, inode_num: u64) -> Result<Inode> {
        let inode = self.ops.get::<u64, Inode>(index, &inode_num)?;
        if !inode.verify_crc() {
            return Err(SlosError::Corrupt);
        }
        Ok(inode)
    }

    pub fn iupdate(&mut self, index: &mut BPlusTree, mut inode: Inode) -> Result<()> {
        inode.update_crc();
        self.ops.update(index, inode.inode_num, inode)?;
        Ok(())
    }

    /// Inode removal is directory/VFS-layer behavior, not a core operation:
    /// the core never drops an inode record on its own.
    pub fn iremove(&mut self, _index: &mut BPlusTree, _inode_num: u64) -> Result<Inode> {
        Err(SlosError::Unsupported)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use super::super::node::{NodeType, TreeNode};
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
        fn read_block(&self, _block: u64) -> Result<Vec<u8>> { Ok(vec![0u8; 4096]) }
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

    fn split_borrow(dev: &mut MemDevice) -> (&mut MemDevice, &mut MemDevice) {
        let ptr = dev as *mut MemDevice;
        unsafe { (&mut *ptr, &mut *ptr) }
    }

    #[test]
    fn inode_crc_round_trips_through_serialize() {
        let inode = Inode::new(100_000, 0o644, RECORD_TYPE_BLOB, 12345);
        let mut buf = [0u8; Inode::SIZE];
        inode.serialize(&mut buf);
        let back = Inode::deserialize(&buf);
        assert_eq!(back.inode_num, inode.inode_num);
        assert!(back.verify_crc());
    }

    #[test]
    fn icreate_then_iopen_round_trips() {
        let mut dev = MemDevice::new();
        let mut tree = BPlusTree::new(NodeType::InodeIndex);
        let (a, b) = split_borrow(&mut dev);
        let mut ops = InodeOps::new(a, b);
        ops.icreate(&mut tree, 100_000, 0o755, RECORD_TYPE_DIR, 1).unwrap();
        let inode = ops.iopen(&tree, 100_000).unwrap();
        assert!(inode.is_dir());
        assert_eq!(inode.mode, 0o755);
    }

    #[test]
    fn iremove_is_unsupported() {
        let mut dev = MemDevice::new();
        let mut tree = BPlusTree::new(NodeType::InodeIndex);
        let (a, b) = split_borrow(&mut dev);
        let mut ops = InodeOps::new(a, b);
        ops.icreate(&mut tree, 100_000, 0o644, RECORD_TYPE_BLOB, 1).unwrap();
        assert!(matches!(ops.iremove(&mut tree, 100_000), Err(SlosError::Unsupported)));
        assert!(ops.iopen(&tree, 100_000).is_ok());
    }
}
