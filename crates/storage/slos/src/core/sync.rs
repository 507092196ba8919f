//! Shared-mount synchronization.
//!
//! The tree, allocator, and inode operations elsewhere in `core` take plain
//! `&mut` borrows and do no locking of their own -- the same discipline
//! `wfs-common`'s tree code uses, leaving synchronization to whatever holds
//! the mount. `SharedMount` is that holder: a single `spin::Mutex` guarding
//! the whole `Mounted` bundle, mirroring the `Mutex<WfsInner<D>>` wrapper the
//! teacher's VFS adapter puts around its own device/superblock pair. Callers
//! that need finer-grained concurrency than one mutex around the entire
//! mount (per-tree rwlocks, per-buffer locks) build it above this, in the
//! kernel's VFS/syncer layer, the way process scheduling lives in
//! `watos-process` rather than in any storage crate.
use spin::Mutex;

use super::mount::Mounted;

/// A mounted filesystem behind a single exclusive lock. Readers and writers
/// alike take it for the duration of one operation; there is no
/// upgrade/downgrade path, matching the coarse single-mutex model the
/// teacher's own VFS wrapper uses.
pub struct SharedMount {
    inner: Mutex<Mounted>,
}

impl SharedMount {
    pub fn new(mounted: Mounted) -> Self {
        Self { inner: Mutex::new(mounted) }
    }

    /// Run `f` with exclusive access to the mount state. This is the only
    /// way to reach the guarded `Mounted`; there is no raw `lock()` exposed
    /// so every access is scoped and cannot be held across an `.await` or a
    /// panic unwind that a caller forgot to catch.
    pub fn with_mount<R>(&self, f: impl FnOnce(&mut Mounted) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use super::super::config::SlosConfig;
    use super::super::mount::mount;
    use super::super::structures::BLOCK_SIZE;
    use super::super::tree::BlockDevice;
    use crate::error::{Result, SlosError};
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
    fn with_mount_serializes_access_to_the_mount_state() {
        let mut dev = MemDevice::new();
        let mounted = mount(&mut dev, 10_000, SlosConfig::default()).unwrap();
        let shared = SharedMount::new(mounted);
        let epoch = shared.with_mount(|m| m.superblock.epoch);
        assert_eq!(epoch, 0);
        shared.with_mount(|m| m.checkpointer.note_dirty_node());
        let reserved = shared.with_mount(|m| m.checkpointer.reservation_blocks());
        assert_eq!(reserved, 5);
    }
}
