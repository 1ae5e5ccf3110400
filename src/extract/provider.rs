//! Extractor trait.
//!
//! An extractor fetches one batch of raw records from wherever the CRM data
//! currently lives. It never touches the store.

use std::future::Future;
use std::pin::Pin;

use super::types::{Extraction, ExtractorInfo, ExtractorResponse};
use crate::error::Result;

/// Trait for extractor adapters.
pub trait Extractor: Send + Sync {
    /// Adapter metadata.
    fn info(&self) -> ExtractorInfo;

    /// Fetch the raw response document.
    fn fetch(&self) -> impl Future<Output = Result<ExtractorResponse>> + Send;

    /// Fetch and validate one batch.
    fn extract(&self) -> impl Future<Output = Result<Extraction>> + Send {
        async move { self.fetch().await?.into_extraction() }
    }
}

/// Boxed extractor for runtime selection.
pub struct BoxedExtractor {
    inner: Box<dyn ExtractorBoxed>,
}

/// Object-safe version of [`Extractor`].
trait ExtractorBoxed: Send + Sync {
    fn info(&self) -> ExtractorInfo;
    fn extract_boxed(&self) -> Pin<Box<dyn Future<Output = Result<Extraction>> + Send + '_>>;
}

struct BoxedExtractorWrapper<E: Extractor + 'static>(E);

impl<E: Extractor + 'static> ExtractorBoxed for BoxedExtractorWrapper<E> {
    fn info(&self) -> ExtractorInfo {
        self.0.info()
    }

    fn extract_boxed(&self) -> Pin<Box<dyn Future<Output = Result<Extraction>> + Send + '_>> {
        Box::pin(self.0.extract())
    }
}

impl BoxedExtractor {
    pub fn new<E: Extractor + 'static>(extractor: E) -> Self {
        Self {
            inner: Box::new(BoxedExtractorWrapper(extractor)),
        }
    }

    #[must_use]
    pub fn info(&self) -> ExtractorInfo {
        self.inner.info()
    }

    /// Fetch and validate one batch.
    ///
    /// # Errors
    ///
    /// Returns `Error::Extraction` if the adapter or the response fails.
    pub async fn extract(&self) -> Result<Extraction> {
        self.inner.extract_boxed().await
    }
}

impl std::fmt::Debug for BoxedExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BoxedExtractor").field(&self.info()).finish()
    }
}
