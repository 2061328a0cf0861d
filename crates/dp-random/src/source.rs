//! Random Source
//!
//! The single entry point for shuffling. A permutation comes from the external
//! provider when one is configured and answers correctly; anything else ends in
//! the local unbiased shuffle, so [`RandomSource::permute`] never fails.

use std::sync::Arc;

use crate::error::RandomError;
use crate::provider::{HttpRandomProvider, ProviderConfig, ProviderRequest, RandomProvider};
use crate::shuffle::local_shuffle;

/// Where a permutation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermutationOrigin {
    /// Length 0 or 1, returned as-is
    Trivial,
    /// External true-random provider
    Provider,
    /// Local shuffle, no provider configured
    Local,
    /// Local shuffle after the provider failed or the request was rejected
    LocalFallback,
}

/// A permutation plus its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation<T> {
    pub items: Vec<T>,
    pub origin: PermutationOrigin,
}

/// Uniform permutations, provider first, local shuffle as fallback
#[derive(Clone)]
pub struct RandomSource {
    provider: Option<Arc<dyn RandomProvider>>,
}

impl RandomSource {
    /// Local shuffle only
    pub fn local() -> Self {
        Self { provider: None }
    }

    /// Consult `provider` first
    pub fn with_provider(provider: Arc<dyn RandomProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// HTTP provider when enabled; a client that cannot be built degrades to local
    pub fn from_config(config: &ProviderConfig) -> Self {
        if !config.enabled {
            return Self::local();
        }

        match HttpRandomProvider::new(config) {
            Ok(provider) => {
                log::info!("[RandomSource] Using provider at {}", provider.endpoint());
                Self::with_provider(Arc::new(provider))
            }
            Err(e) => {
                log::error!("[RandomSource] {}; shuffling locally", e);
                Self::local()
            }
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Uniformly random permutation of `items`
    pub async fn permute<T: Clone + Sync>(&self, items: &[T]) -> Vec<T> {
        self.permute_traced(items).await.items
    }

    /// [`permute`](Self::permute), also reporting which path produced the result
    pub async fn permute_traced<T: Clone + Sync>(&self, items: &[T]) -> Permutation<T> {
        if items.len() <= 1 {
            return Permutation {
                items: items.to_vec(),
                origin: PermutationOrigin::Trivial,
            };
        }

        let Some(provider) = &self.provider else {
            return Permutation {
                items: local_shuffle(items),
                origin: PermutationOrigin::Local,
            };
        };

        match Self::remote_indices(provider.as_ref(), items.len()).await {
            Ok(indices) => Permutation {
                // Output slot i receives items[indices[i]]
                items: indices.iter().map(|&i| items[i].clone()).collect(),
                origin: PermutationOrigin::Provider,
            },
            Err(e) => {
                log::warn!(
                    "[RandomSource] Provider '{}' failed, falling back to local shuffle: {}",
                    provider.name(),
                    e
                );
                Permutation {
                    items: local_shuffle(items),
                    origin: PermutationOrigin::LocalFallback,
                }
            }
        }
    }

    async fn remote_indices(provider: &dyn RandomProvider, len: usize) -> Result<Vec<usize>, RandomError> {
        let request = ProviderRequest::permutation(len)?;
        let batch = provider.unique_indices(request).await?;

        // Providers behind the trait are trusted no further than the wire
        let mut seen = vec![false; len];
        let is_permutation = batch.indices.len() == len
            && batch
                .indices
                .iter()
                .all(|&i| i < len && !std::mem::replace(&mut seen[i], true));
        if !is_permutation {
            return Err(RandomError::ProviderUnavailable(
                "provider returned an invalid permutation".to_string(),
            ));
        }
        Ok(batch.indices)
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::local()
    }
}
