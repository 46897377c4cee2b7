use finqa_core::domain::RetrievedResult;
use finqa_core::error::AppError;

use crate::embeddings::Embedder;
use crate::index::LoadedIndex;

mod similarity;

/// Upper bound on results per call.
pub const MAX_TOP_K: usize = 50;

/// Similarity-search collaborator. Deterministic for a fixed index and query;
/// results are ordered best first.
pub trait Retriever {
    fn is_ready(&self) -> bool;
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedResult>, AppError>;
}

/// Cosine-similarity retrieval over a loaded [`LoadedIndex`].
#[derive(Debug)]
pub struct IndexRetriever<E> {
    index: LoadedIndex,
    embedder: E,
}

impl<E: Embedder> IndexRetriever<E> {
    pub fn new(index: LoadedIndex, embedder: E) -> Self {
        Self { index, embedder }
    }

    pub fn index(&self) -> &LoadedIndex {
        &self.index
    }
}

impl<E: Embedder> Retriever for IndexRetriever<E> {
    fn is_ready(&self) -> bool {
        self.index.is_ready()
            && self.index.status.model.as_deref() == Some(self.embedder.model())
    }

    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedResult>, AppError> {
        let q = query.trim();
        if q.is_empty() {
            return Err(AppError::input("AI_RETRIEVAL_FAILED", "Query must not be empty"));
        }
        let k = k.clamp(1, MAX_TOP_K);

        let st = &self.index.status;
        if !self.index.is_ready() {
            return Err(AppError::precondition(
                "QA_INDEX_NOT_READY",
                "Index not ready; build the index before querying",
            ));
        }
        let model = st.model.as_deref().unwrap_or_default();
        if model != self.embedder.model() {
            return Err(AppError::precondition(
                "QA_INDEX_MODEL_MISMATCH",
                "Index was built with a different embedding model",
            )
            .with_details(format!("index_model={model}; embedder_model={}", self.embedder.model())));
        }
        let dims = st
            .dims
            .ok_or_else(|| AppError::precondition("QA_INDEX_NOT_READY", "Index status missing dims"))?;

        let qv = self.embedder.embed(q)?;
        if qv.len() as u32 != dims {
            return Err(AppError::precondition(
                "QA_INDEX_DIMS_MISMATCH",
                "Query embedding dims do not match index dims",
            )
            .with_details(format!("index_dims={dims}; query_dims={}", qv.len())));
        }
        let qnorm = similarity::l2_norm(&qv);
        if qnorm == 0.0 {
            return Err(AppError::collaborator(
                "AI_RETRIEVAL_FAILED",
                "Query embedding norm is zero",
            ));
        }

        let mut hits: Vec<(&String, f32)> = Vec::new();
        for (chunk_id, v) in self.index.vectors.iter() {
            let vnorm = similarity::l2_norm(v);
            if vnorm == 0.0 || v.len() != qv.len() {
                continue;
            }
            hits.push((chunk_id, similarity::cosine_similarity(&qv, v, qnorm, vnorm)));
        }

        hits.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(b.0)));
        hits.truncate(k);

        let mut out = Vec::with_capacity(hits.len());
        for (rank, (chunk_id, score)) in hits.into_iter().enumerate() {
            let chunk = self.index.chunks.get(chunk_id).ok_or_else(|| {
                AppError::precondition("QA_INDEX_NOT_READY", "Indexed vector has no chunk; rebuild index")
                    .with_details(format!("chunk_id={chunk_id}"))
            })?;
            out.push(RetrievedResult::new(chunk.clone(), rank as u32).with_score(score));
        }
        tracing::debug!(k, hits = out.len(), "retrieved chunks");
        Ok(out)
    }
}
