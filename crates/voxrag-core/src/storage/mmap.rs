//! Memory-mapped, append-only vector store.
//!
//! The backing file is a single flat region: a 24-byte header followed by
//! `count` packed `f32` vectors of `dimension` elements each.
//!
//! ```text
//! offset 0..8   magic    b"VOXVEC01"
//! offset 8..16  dim      u64 little-endian
//! offset 16..24 count    u64 little-endian
//! offset 24..   vectors  count * dim * 4 bytes, packed
//! ```

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use memmap2::{MmapMut, MmapOptions};
use parking_lot::RwLock;

use crate::error::{Error, Result};

use super::vector_bytes::{bytes_to_vector, vector_to_bytes};

const MAGIC: &[u8; 8] = b"VOXVEC01";
const HEADER_SIZE: u64 = 24;
const INITIAL_CAPACITY_VECTORS: u64 = 1024;
const GROWTH_FACTOR: f64 = 1.5;

/// Memory-mapped store for fixed-dimension `f32` vectors.
///
/// Single writer, many readers: `append` takes an exclusive lock only for
/// the duration of the write (and the occasional remap); `get` takes a
/// shared lock and copies the requested vector out before releasing it, so
/// no borrow ever survives a remap.
pub struct MmapStorage {
    path: PathBuf,
    dimension: u64,
    mmap: RwLock<MmapMut>,
    file: std::fs::File,
    count: AtomicU64,
    /// Bumped every time the backing file is grown and remapped. Readers
    /// don't need to observe it directly today (they never hold a slice
    /// across the lock), but it documents the invariant the storage relies
    /// on and gives future zero-copy accessors a way to detect staleness.
    remap_epoch: AtomicU64,
}

impl MmapStorage {
    /// Opens (or creates) the vector store at `path` for vectors of
    /// `dimension` elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleStore`] if the file already exists with
    /// a different dimension, or if the header magic or length is invalid —
    /// both are fatal configuration errors, not input validation, since the
    /// fix is to delete the file and re-ingest, not to retry the request.
    /// Returns [`Error::Io`] for filesystem failures.
    pub fn open<P: AsRef<Path>>(path: P, dimension: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let is_new = !path.exists();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if is_new {
            let initial_len = HEADER_SIZE + INITIAL_CAPACITY_VECTORS * dimension * 4;
            file.set_len(initial_len)?;
            let mut mmap = unsafe { MmapOptions::new().map_mut(&file)? };
            mmap[0..8].copy_from_slice(MAGIC);
            mmap[8..16].copy_from_slice(&dimension.to_le_bytes());
            mmap[16..24].copy_from_slice(&0u64.to_le_bytes());
            mmap.flush()?;

            tracing::debug!(path = %path.display(), dimension, "created vector store");

            return Ok(Self {
                path,
                dimension,
                mmap: RwLock::new(mmap),
                file,
                count: AtomicU64::new(0),
                remap_epoch: AtomicU64::new(0),
            });
        }

        let len = file.metadata()?.len();
        if len < HEADER_SIZE {
            return Err(Error::IncompatibleStore {
                path: path.display().to_string(),
                reason: "file is shorter than the header".into(),
            });
        }

        let mmap = unsafe { MmapOptions::new().map_mut(&file)? };
        if &mmap[0..8] != MAGIC {
            return Err(Error::IncompatibleStore {
                path: path.display().to_string(),
                reason: "bad magic".into(),
            });
        }
        let stored_dim = u64::from_le_bytes(mmap[8..16].try_into().unwrap());
        if stored_dim != dimension {
            return Err(Error::IncompatibleStore {
                path: path.display().to_string(),
                reason: format!(
                    "store was created with dimension {stored_dim}, opened with {dimension}"
                ),
            });
        }
        let count = u64::from_le_bytes(mmap[16..24].try_into().unwrap());

        tracing::info!(path = %path.display(), dimension, count, "opened vector store");

        Ok(Self {
            path,
            dimension,
            mmap: RwLock::new(mmap),
            file,
            count: AtomicU64::new(count),
            remap_epoch: AtomicU64::new(0),
        })
    }

    /// Returns the fixed vector dimension this store was opened with.
    #[must_use]
    pub fn dimension(&self) -> u64 {
        self.dimension
    }

    /// Returns the number of vectors currently stored.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Appends `vector` and returns its assigned id (its index, `0`-based).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `vector.len()` doesn't match
    /// the store's dimension.
    pub fn append(&self, vector: &[f32]) -> Result<u64> {
        if vector.len() as u64 != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension as usize,
                actual: vector.len(),
            });
        }

        let id = self.count.load(Ordering::Acquire);
        let offset = HEADER_SIZE + id * self.dimension * 4;
        let required_len = offset + self.dimension * 4;

        {
            let mut mmap = self.mmap.write();
            if required_len > mmap.len() as u64 {
                self.grow(&mut mmap, required_len)?;
            }
            let bytes = vector_to_bytes(vector);
            mmap[offset as usize..(offset + bytes.len() as u64) as usize].copy_from_slice(bytes);
            let new_count = id + 1;
            mmap[16..24].copy_from_slice(&new_count.to_le_bytes());
            mmap.flush_async()?;
        }

        self.count.store(id + 1, Ordering::Release);
        Ok(id)
    }

    /// Grows the backing file to at least `required_len` bytes by
    /// `GROWTH_FACTOR`, then remaps. Caller must hold the write lock.
    fn grow(&self, mmap: &mut MmapMut, required_len: u64) -> Result<()> {
        let current_len = mmap.len() as u64;
        let grown_len = ((current_len as f64) * GROWTH_FACTOR) as u64;
        let new_len = grown_len.max(required_len);

        mmap.flush()?;
        self.file.set_len(new_len)?;
        let new_mmap = unsafe { MmapOptions::new().map_mut(&self.file)? };
        *mmap = new_mmap;
        self.remap_epoch.fetch_add(1, Ordering::AcqRel);

        tracing::debug!(path = %self.path.display(), old_len = current_len, new_len, "grew vector store");
        Ok(())
    }

    /// Returns a copy of the vector stored at `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VectorNotFound`] if `id >= count()`.
    pub fn get(&self, id: u64) -> Result<Vec<f32>> {
        if id >= self.count.load(Ordering::Acquire) {
            return Err(Error::VectorNotFound(id));
        }
        let offset = HEADER_SIZE + id * self.dimension * 4;
        let len = (self.dimension * 4) as usize;

        let mmap = self.mmap.read();
        let bytes = &mmap[offset as usize..offset as usize + len];
        Ok(bytes_to_vector(bytes, self.dimension as usize))
    }

    /// Flushes all pending writes to disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the flush fails.
    pub fn close(&self) -> Result<()> {
        self.mmap.write().flush()?;
        Ok(())
    }
}
