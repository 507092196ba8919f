//! mkfs.slos - create SLOS (single-level object store) disk images
//!
//! Usage:
//!   mkfs.slos -o disk.img -s 64M
//!   mkfs.slos -o disk.img -s 1G

use clap::Parser;
use std::cell::UnsafeCell;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use slos_core::core::{BlockAllocator, BlockDevice, NodeType, TreeNode};
use slos_core::{Result as SlosResult, SlosConfig, SlosError, BLOCK_SIZE};

#[derive(Parser)]
#[command(name = "mkfs.slos")]
#[command(about = "Create SLOS disk images")]
struct Args {
    /// Output disk image file
    #[arg(short, long)]
    output: PathBuf,

    /// Disk size (e.g., 64M, 1G)
    #[arg(short, long)]
    size: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim().to_uppercase();
    let (num_str, mult) = if s.ends_with("GB") || s.ends_with("G") {
        (s.trim_end_matches("GB").trim_end_matches('G'), 1024 * 1024 * 1024)
    } else if s.ends_with("MB") || s.ends_with("M") {
        (s.trim_end_matches("MB").trim_end_matches('M'), 1024 * 1024)
    } else if s.ends_with("KB") || s.ends_with("K") {
        (s.trim_end_matches("KB").trim_end_matches('K'), 1024)
    } else {
        (s.as_str(), 1)
    };

    num_str.parse::<u64>().ok().map(|n| n * mult)
}

/// A `std::fs::File` as a `BlockDevice`/`BlockAllocator`. Interior
/// mutability through `UnsafeCell` lets the same value be borrowed as both
/// at once via the usual raw-pointer split, since mkfs never actually
/// touches them concurrently.
struct FileBlockDevice {
    file: UnsafeCell<File>,
    next_block: UnsafeCell<u64>,
}

impl FileBlockDevice {
    fn new(path: &PathBuf, size: u64, data_start: u64) -> std::io::Result<Self> {
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(size)?;
        Ok(Self {
            file: UnsafeCell::new(file),
            next_block: UnsafeCell::new(data_start),
        })
    }

    fn file(&self) -> &mut File {
        unsafe { &mut *self.file.get() }
    }
}

impl BlockDevice for FileBlockDevice {
    fn read_node(&self, block: u64) -> SlosResult<TreeNode> {
        let file = self.file();
        let mut node = TreeNode::default();
        file.seek(SeekFrom::Start(block * BLOCK_SIZE as u64))
            .map_err(|_| SlosError::IoError)?;
        let bytes = unsafe {
            std::slice::from_raw_parts_mut(&mut node as *mut TreeNode as *mut u8, BLOCK_SIZE as usize)
        };
        file.read_exact(bytes).map_err(|_| SlosError::IoError)?;
        Ok(node)
    }

    fn write_node(&mut self, block: u64, node: &TreeNode) -> SlosResult<()> {
        let file = self.file();
        file.seek(SeekFrom::Start(block * BLOCK_SIZE as u64))
            .map_err(|_| SlosError::IoError)?;
        let bytes = unsafe {
            std::slice::from_raw_parts(node as *const TreeNode as *const u8, BLOCK_SIZE as usize)
        };
        file.write_all(bytes).map_err(|_| SlosError::IoError)
    }

    fn read_block(&self, block: u64) -> SlosResult<Vec<u8>> {
        let file = self.file();
        let mut buf = vec![0u8; BLOCK_SIZE as usize];
        file.seek(SeekFrom::Start(block * BLOCK_SIZE as u64))
            .map_err(|_| SlosError::IoError)?;
        file.read_exact(&mut buf).map_err(|_| SlosError::IoError)?;
        Ok(buf)
    }

    fn write_block(&mut self, block: u64, data: &[u8]) -> SlosResult<()> {
        let file = self.file();
        file.seek(SeekFrom::Start(block * BLOCK_SIZE as u64))
            .map_err(|_| SlosError::IoError)?;
        let mut padded = vec![0u8; BLOCK_SIZE as usize];
        padded[..data.len().min(BLOCK_SIZE as usize)].copy_from_slice(&data[..data.len().min(BLOCK_SIZE as usize)]);
        file.write_all(&padded).map_err(|_| SlosError::IoError)
    }

    fn sync(&mut self) -> SlosResult<()> {
        self.file().sync_all().map_err(|_| SlosError::IoError)
    }
}

impl BlockAllocator for FileBlockDevice {
    fn allocate_block(&mut self) -> SlosResult<u64> {
        let next_block = unsafe { &mut *self.next_block.get() };
        let block = *next_block;
        *next_block += 1;
        let zero = [0u8; BLOCK_SIZE as usize];
        self.file()
            .seek(SeekFrom::Start(block * BLOCK_SIZE as u64))
            .map_err(|_| SlosError::IoError)?;
        self.file().write_all(&zero).map_err(|_| SlosError::IoError)?;
        Ok(block)
    }

    fn free_block(&mut self, _block: u64) -> SlosResult<()> {
        // mkfs never frees; the filesystem is built once, from scratch.
        Ok(())
    }
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let size = parse_size(&args.size)
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid size format"))?;

    if size < 1024 * 1024 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Disk size must be at least 1MB",
        ));
    }

    let total_blocks = size / BLOCK_SIZE as u64;
    // mount() bootstraps from the superblock ring onward; FileBlockDevice's
    // own bump allocator is only used while laying that ring down, before
    // the real allocator exists to serve the first writes.
    let data_start = 16u64;

    println!("Creating SLOS disk image: {}", args.output.display());
    println!("  Size: {} bytes ({} blocks)", size, total_blocks);

    let mut device = FileBlockDevice::new(&args.output, size, data_start)?;

    if args.verbose {
        println!("  Block size: {} bytes", BLOCK_SIZE);
    }

    let config = SlosConfig::default();
    let mounted = slos_core::core::mount(&mut device, total_blocks, config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("mount/bootstrap failed: {}", e)))?;

    if args.verbose {
        println!("  Superblock epoch: {}", mounted.superblock.epoch);
        println!("  Inode index root: {}", mounted.inode_index.root_block);
        println!("  Allocator offset tree root: {}", mounted.allocator.offset_tree.root_block);
        println!("  Allocator size tree root:   {}", mounted.allocator.size_tree.root_block);
    }

    device
        .sync()
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "Final sync failed"))?;

    println!("Done! SLOS filesystem created.");
    let _ = NodeType::InodeIndex; // keep import used across feature combinations
    Ok(())
}
