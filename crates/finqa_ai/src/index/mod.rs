use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use finqa_core::domain::Chunk;
use finqa_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::embeddings::Embedder;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStatus {
    pub ready: bool,
    pub model: Option<String>,
    pub dims: Option<u32>,
    pub chunk_count: u32,
    pub updated_at: Option<String>,
}

impl IndexStatus {
    fn empty() -> Self {
        Self {
            ready: false,
            model: None,
            dims: None,
            chunk_count: 0,
            updated_at: None,
        }
    }
}

/// Index contents held in memory for querying. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct LoadedIndex {
    pub status: IndexStatus,
    pub chunks: BTreeMap<String, Chunk>,
    pub vectors: BTreeMap<String, Vec<f32>>,
}

impl LoadedIndex {
    pub fn is_ready(&self) -> bool {
        self.status.ready && !self.vectors.is_empty()
    }
}

/// Directory-backed vector index over externally produced chunks.
///
/// Building replaces the previous contents. Callers must not build while queries
/// against a loaded copy are in flight if they expect those queries to see the new
/// data; a loaded copy is never mutated.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    root: PathBuf,
}

impl VectorIndex {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn index_dir(&self) -> PathBuf {
        self.root.join("index")
    }

    fn status_path(&self) -> PathBuf {
        self.index_dir().join("index_status.json")
    }

    fn chunks_path(&self) -> PathBuf {
        self.index_dir().join("index_chunks.json")
    }

    fn vectors_path(&self) -> PathBuf {
        self.index_dir().join("index_vectors.json")
    }

    fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.index_dir()).map_err(|e| {
            AppError::io("AI_INDEX_BUILD_FAILED", "Failed to create index directory")
                .with_details(format!("path={}; err={}", self.index_dir().display(), e))
        })
    }

    pub fn status(&self) -> Result<IndexStatus, AppError> {
        let path = self.status_path();
        if !path.exists() {
            return Ok(IndexStatus::empty());
        }
        read_json(&path, "index status")
    }

    /// Embed every chunk (stable chunk-id order) and persist. Status is written last,
    /// so an interrupted build never reports ready.
    pub fn build(
        &self,
        chunks: &[Chunk],
        embedder: &dyn Embedder,
        updated_at: &str,
    ) -> Result<IndexStatus, AppError> {
        if chunks.is_empty() {
            return Err(AppError::input(
                "AI_INDEX_BUILD_FAILED",
                "No chunks provided; load and split documents before building the index",
            ));
        }
        self.ensure_dirs()?;

        // Mark not-ready before touching data files.
        write_json_atomic(&self.status_path(), &IndexStatus::empty(), "index status")?;

        let by_id: BTreeMap<String, Chunk> = chunks.iter().map(|c| (c.chunk_id(), c.clone())).collect();

        let mut vectors: BTreeMap<String, Vec<f32>> = BTreeMap::new();
        let mut dims: Option<u32> = None;
        for (chunk_id, chunk) in by_id.iter() {
            let v = embedder.embed(&chunk.text)?;
            let got = v.len() as u32;
            match dims {
                None => dims = Some(got),
                Some(d) if d != got => {
                    return Err(AppError::collaborator(
                        "AI_INDEX_BUILD_FAILED",
                        "Embedding dims changed during build",
                    )
                    .with_details(format!("chunk_id={chunk_id}; expected={d}; got={got}")));
                }
                Some(_) => {}
            }
            vectors.insert(chunk_id.clone(), v);
        }

        write_json_atomic(&self.chunks_path(), &by_id, "index chunks")?;
        write_json_atomic(&self.vectors_path(), &vectors, "index vectors")?;

        let status = IndexStatus {
            ready: true,
            model: Some(embedder.model().to_string()),
            dims,
            chunk_count: by_id.len() as u32,
            updated_at: Some(updated_at.to_string()),
        };
        write_json_atomic(&self.status_path(), &status, "index status")?;

        tracing::info!(
            chunks = status.chunk_count,
            dims = status.dims.unwrap_or(0),
            model = %embedder.model(),
            "built vector index"
        );
        Ok(status)
    }

    /// Load a ready index into memory.
    pub fn load(&self) -> Result<LoadedIndex, AppError> {
        let status = self.status()?;
        if !status.ready {
            return Err(AppError::precondition(
                "QA_INDEX_NOT_READY",
                "Index not ready; build the index before querying",
            )
            .with_details(format!("root={}", self.root.display())));
        }
        let chunks: BTreeMap<String, Chunk> = read_json(&self.chunks_path(), "index chunks")?;
        let vectors: BTreeMap<String, Vec<f32>> = read_json(&self.vectors_path(), "index vectors")?;
        if vectors.len() != chunks.len() {
            return Err(AppError::precondition(
                "QA_INDEX_NOT_READY",
                "Index chunks and vectors disagree; rebuild index",
            )
            .with_details(format!("chunks={}; vectors={}", chunks.len(), vectors.len())));
        }
        Ok(LoadedIndex {
            status,
            chunks,
            vectors,
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::io("AI_INDEX_READ_FAILED", format!("Failed to read {what}"))
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        AppError::io("AI_INDEX_READ_FAILED", format!("Failed to decode {what}"))
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<(), AppError> {
    let tmp = path.with_extension("tmp");
    let json = serde_json::to_vec_pretty(value).map_err(|e| {
        AppError::io("AI_INDEX_BUILD_FAILED", format!("Failed to encode {what}"))
            .with_details(e.to_string())
    })?;
    fs::write(&tmp, json).map_err(|e| {
        AppError::io("AI_INDEX_BUILD_FAILED", format!("Failed to write {what}"))
            .with_details(format!("path={}; err={}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        AppError::io("AI_INDEX_BUILD_FAILED", format!("Failed to finalize {what} write"))
            .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
    })
}
