//! Async and batch entry points.
//!
//! Extraction itself is synchronous. These helpers move it onto Tokio's
//! blocking pool and bound how many documents are in flight at once.

use crate::core::extractor::{StreamTextExtractor, TextExtractionResult, default_extractor};
use crate::{DoctextError, TextExtractionError};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

type ExtractionOutcome = std::result::Result<TextExtractionResult, TextExtractionError>;

impl StreamTextExtractor {
    /// Extract an in-memory document on the blocking thread pool.
    pub async fn extract_bytes_async(&self, bytes: Vec<u8>, resource_name: Option<String>) -> ExtractionOutcome {
        let extractor = self.clone();
        tokio::task::spawn_blocking(move || extractor.extract_bytes(&bytes, resource_name.as_deref()))
            .await
            .map_err(|e| TextExtractionError::new(DoctextError::Other(format!("Extraction task failed: {}", e))))?
    }

    /// Extract many in-memory documents concurrently.
    ///
    /// At most `max_concurrent_extractions` documents (default: twice the CPU
    /// count) are processed at once. Results come back in input order, and a
    /// failed document does not affect the others.
    pub async fn batch_extract_bytes(&self, items: Vec<(Vec<u8>, Option<String>)>) -> Vec<ExtractionOutcome> {
        if items.is_empty() {
            return Vec::new();
        }

        let max_concurrent = self
            .config()
            .max_concurrent_extractions
            .unwrap_or_else(|| num_cpus::get() * 2);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        let mut tasks = JoinSet::new();
        for (index, (bytes, resource_name)) in items.into_iter().enumerate() {
            let extractor = self.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => extractor.extract_bytes_async(bytes, resource_name).await,
                    Err(e) => Err(TextExtractionError::new(DoctextError::Other(format!(
                        "Batch semaphore closed: {}",
                        e
                    )))),
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<ExtractionOutcome>> = (0..tasks.len()).map(|_| None).collect();

        while let Some(task_result) = tasks.join_next().await {
            match task_result {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "batch extraction task failed"),
            }
        }

        results
            .into_iter()
            .map(|result| {
                result.unwrap_or_else(|| {
                    Err(TextExtractionError::new(DoctextError::Other(
                        "Extraction task panicked".to_string(),
                    )))
                })
            })
            .collect()
    }
}

/// Extract an in-memory document asynchronously with the default extractor.
pub async fn extract_bytes_async(bytes: Vec<u8>, resource_name: Option<String>) -> ExtractionOutcome {
    default_extractor().extract_bytes_async(bytes, resource_name).await
}

/// Extract many in-memory documents concurrently with the default extractor.
pub async fn batch_extract_bytes(items: Vec<(Vec<u8>, Option<String>)>) -> Vec<ExtractionOutcome> {
    default_extractor().batch_extract_bytes(items).await
}
