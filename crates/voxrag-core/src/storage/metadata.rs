//! Append-only, log-structured key-value store for document and chunk
//! metadata.
//!
//! Grounded in the teacher's write-ahead-log-plus-index approach to payload
//! storage, simplified to a single log per keyspace with no periodic
//! snapshot: the document/chunk counts this engine targets make full-log
//! replay at open time cheap enough that a snapshot isn't worth its added
//! format surface.
//!
//! Each record is a length-prefixed JSON blob: a `u32` little-endian byte
//! count followed by `{"key": ..., "value": ...}`. The in-memory index maps
//! key to the record's byte offset in the log, rebuilt by replaying the log
//! on open — later records for the same key shadow earlier ones.

use std::fs::{File, OpenOptions};
use std::hash::Hash;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Serialize)]
struct RecordRef<'a, K, V> {
    key: K,
    value: &'a V,
}

#[derive(Deserialize)]
struct RecordOwned<K, V> {
    key: K,
    value: V,
}

/// A single append-only log keyed by `K`, holding values of type `V`.
struct LogStore<K, V> {
    path: PathBuf,
    index: RwLock<FxHashMap<K, u64>>,
    writer: Mutex<File>,
    reader: Mutex<File>,
    _marker: std::marker::PhantomData<V>,
}

impl<K, V> LogStore<K, V>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let writer = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;
        let reader = OpenOptions::new().read(true).open(&path)?;

        let index = Self::replay(&path)?;

        Ok(Self {
            path,
            index: RwLock::new(index),
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
            _marker: std::marker::PhantomData,
        })
    }

    fn replay(path: &Path) -> Result<FxHashMap<K, u64>> {
        let mut index = FxHashMap::default();
        let file = OpenOptions::new().read(true).open(path)?;
        let mut reader = BufReader::new(file);
        let mut offset = 0u64;

        loop {
            let mut len_buf = [0u8; 4];
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(Error::Io(e)),
            }
            let len = u32::from_le_bytes(len_buf) as usize;
            let record_offset = offset;

            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;

            let record: RecordOwned<K, serde_json::Value> = serde_json::from_slice(&buf)?;
            index.insert(record.key, record_offset);

            offset += 4 + len as u64;
        }

        Ok(index)
    }

    fn save(&self, key: K, value: &V) -> Result<()> {
        let record = RecordRef {
            key: key.clone(),
            value,
        };
        let bytes = serde_json::to_vec(&record)?;
        let len = bytes.len() as u32;

        let mut writer = self.writer.lock();
        let offset = writer.seek(SeekFrom::End(0))?;
        writer.write_all(&len.to_le_bytes())?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        writer.sync_data()?;

        self.index.write().insert(key, offset);
        Ok(())
    }

    fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let offset = *self.index.read().get(key)?;
        let mut reader = self.reader.lock();
        reader.seek(SeekFrom::Start(offset)).ok()?;

        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf).ok()?;
        let len = u32::from_le_bytes(len_buf) as usize;

        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).ok()?;

        let record: RecordOwned<K, V> = serde_json::from_slice(&buf).ok()?;
        Some(record.value)
    }

    fn len(&self) -> usize {
        self.index.read().len()
    }
}

/// Durable key-to-blob store holding the two logical keyspaces described by
/// the data model: documents (keyed by string id) and chunks (keyed by
/// vector id).
pub struct MetadataStore {
    documents: LogStore<String, crate::models::Document>,
    chunks: LogStore<u64, crate::models::Chunk>,
}

impl MetadataStore {
    /// Opens (or creates) `documents.log` and `chunks.log` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on filesystem failure or [`Error::Serialization`]
    /// if an existing log contains a corrupt record.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let documents = LogStore::open(dir.join("documents.log"))?;
        let chunks = LogStore::open(dir.join("chunks.log"))?;

        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "opened metadata store"
        );

        Ok(Self { documents, chunks })
    }

    /// Appends (or overwrites, by re-keying) a document record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Serialization`] on write failure.
    pub fn save_document(&self, document: &crate::models::Document) -> Result<()> {
        self.documents.save(document.id.clone(), document)
    }

    /// Looks up a document by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentNotFound`] if no document with `id` exists.
    pub fn get_document(&self, id: &str) -> Result<crate::models::Document> {
        self.documents
            .get(&id.to_string())
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))
    }

    /// Appends a chunk record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Serialization`] on write failure.
    pub fn save_chunk(&self, chunk: &crate::models::Chunk) -> Result<()> {
        self.chunks.save(chunk.id, chunk)
    }

    /// Looks up a chunk by its vector-store id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChunkNotFound`] if no chunk with `id` exists.
    pub fn get_chunk(&self, id: u64) -> Result<crate::models::Chunk> {
        self.chunks.get(&id).ok_or(Error::ChunkNotFound(id))
    }

    /// Flushes both logs to disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if a flush fails.
    pub fn close(&self) -> Result<()> {
        self.documents.writer.lock().flush()?;
        self.chunks.writer.lock().flush()?;
        Ok(())
    }
}
