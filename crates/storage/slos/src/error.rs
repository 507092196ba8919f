//! Error types for the SLOS core.
//!
//! Every fallible operation in this crate returns `SlosError`. Kinds map
//! directly onto the failure classes an operator or a higher layer (VFS,
//! checkpoint replicator) needs to distinguish; none of them carry a string
//! payload, so callers can match on kind instead of parsing messages.

use core::fmt;

/// Failure kinds produced by the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlosError {
    /// The allocator could not satisfy a request even after a refill scan.
    NoSpace,
    /// A key was not present in a tree, or an inode id is not indexed.
    NotFound,
    /// A create-style call collided with an existing key.
    Exists,
    /// The block device returned an error, or an I/O completion failed.
    IoError,
    /// A magic, CRC, or structural check on a superblock/node/inode failed.
    Corrupt,
    /// The requested operation is intentionally not implemented in the core
    /// (directory/VFS-only behavior, inode removal).
    Unsupported,
    /// A tree node has no room for another entry; callers split and retry.
    NodeFull,
    /// A radix-tree key is outside `[0, F^D)` for the tree's fanout/depth.
    KeyTooLarge,
}

impl fmt::Display for SlosError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SlosError::NoSpace => "no space left on device",
            SlosError::NotFound => "key not found",
            SlosError::Exists => "key already exists",
            SlosError::IoError => "device i/o error",
            SlosError::Corrupt => "on-disk structure failed validation",
            SlosError::Unsupported => "operation not supported",
            SlosError::NodeFull => "tree node is full",
            SlosError::KeyTooLarge => "key exceeds tree capacity",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SlosError {}

pub type Result<T> = core::result::Result<T, SlosError>;
