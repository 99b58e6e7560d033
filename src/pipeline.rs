//! Multi-document orchestration above the synchronous core.
//!
//! Each document converts in its own task with its own registry, so
//! document-level parallelism is safe by construction. A semaphore bounds
//! concurrent conversions; the default permit count follows the machine.

use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use tokio::sync::Semaphore;
use tokio::task;
use tracing::debug;

use crate::assembler::{ConversionOutcome, DocumentConverter};
use crate::error::{CcdaError, ConversionError, Result};
use crate::types::source::SourceDocument;
use crate::validation::{ResourceValidator, ValidationPolicy};
use crate::vocab::VocabularyAdapter;

/// Async counterpart of [`DocumentConverter::convert`] for callers already
/// inside a runtime.
#[async_trait::async_trait]
pub trait AsyncDocumentConverter {
    async fn convert_async(
        &self,
        document: &SourceDocument,
        vocab: &(dyn VocabularyAdapter + Sync),
    ) -> Result<ConversionOutcome>;
}

#[async_trait::async_trait]
impl AsyncDocumentConverter for DocumentConverter {
    async fn convert_async(
        &self,
        document: &SourceDocument,
        vocab: &(dyn VocabularyAdapter + Sync),
    ) -> Result<ConversionOutcome> {
        self.convert(document, vocab)
    }
}

pub struct ConversionPipeline {
    converter: Arc<DocumentConverter>,
    vocab: Arc<dyn VocabularyAdapter + Send + Sync>,
    validator: Option<Arc<dyn ResourceValidator + Send + Sync>>,
    policy: ValidationPolicy,
    max_concurrent: usize,
}

impl ConversionPipeline {
    pub fn new(
        converter: DocumentConverter,
        vocab: Arc<dyn VocabularyAdapter + Send + Sync>,
    ) -> Self {
        Self {
            converter: Arc::new(converter),
            vocab,
            validator: None,
            policy: ValidationPolicy::default(),
            max_concurrent: num_cpus::get().max(1),
        }
    }

    pub fn with_validator(
        mut self,
        validator: Arc<dyn ResourceValidator + Send + Sync>,
        policy: ValidationPolicy,
    ) -> Self {
        self.validator = Some(validator);
        self.policy = policy;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Convert a batch of documents concurrently with backpressure. Results
    /// come back in input order; a failed document fails its own slot, not
    /// the batch.
    pub async fn convert_batch(
        &self,
        documents: Vec<SourceDocument>,
    ) -> Result<Vec<Result<ConversionOutcome>>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let tasks: Vec<_> = documents
            .into_iter()
            .map(|document| {
                let converter = Arc::clone(&self.converter);
                let vocab = Arc::clone(&self.vocab);
                let validator = self.validator.clone();
                let policy = self.policy;
                let semaphore = Arc::clone(&semaphore);

                task::spawn(async move {
                    let _permit =
                        semaphore
                            .acquire()
                            .await
                            .map_err(|e| CcdaError::Concurrency {
                                message: format!("failed to acquire conversion slot: {e}"),
                            })?;

                    let started = Instant::now();
                    let mut outcome = converter.convert(&document, vocab.as_ref())?;
                    if let Some(validator) = validator {
                        apply_validation(validator.as_ref(), policy, &mut outcome)?;
                    }
                    debug!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        resources = outcome.bundle.len(),
                        "document converted"
                    );
                    Ok(outcome)
                })
            })
            .collect();

        try_join_all(tasks)
            .await
            .map_err(|e| CcdaError::Concurrency {
                message: format!("conversion task failed: {e}"),
            })
    }
}

fn apply_validation(
    validator: &dyn ResourceValidator,
    policy: ValidationPolicy,
    outcome: &mut ConversionOutcome,
) -> Result<()> {
    match policy {
        ValidationPolicy::Strict => {
            for resource in outcome.bundle.resources() {
                if let Err(violations) = validator.validate(resource) {
                    return Err(CcdaError::Validation {
                        resource: resource.key().to_string(),
                        violations,
                    });
                }
            }
            Ok(())
        }
        ValidationPolicy::DropAndRecord => {
            let ConversionOutcome { bundle, errors, .. } = outcome;
            bundle.entry.retain(|entry| {
                match validator.validate(&entry.resource) {
                    Ok(()) => true,
                    Err(violations) => {
                        let message = violations
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join("; ");
                        errors.push(ConversionError::InvariantViolation {
                            concept: "validation",
                            entry_id: entry.resource.key().to_string(),
                            message,
                        });
                        false
                    }
                }
            });
            Ok(())
        }
    }
}

impl std::fmt::Debug for ConversionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionPipeline")
            .field("max_concurrent", &self.max_concurrent)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
