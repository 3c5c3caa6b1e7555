//! Autoplay suggestion suppliers
//!
//! When nothing follows the current track and autoplay is on, the engine
//! asks a supplier for tracks similar to the current one and appends them
//! behind the autoplay boundary.

use crate::error::{Error, Result};
use async_trait::async_trait;
use segue_common::Track;
use tracing::debug;

#[async_trait]
pub trait AutoplaySupplier: Send + Sync {
    /// Ranked list of up to `limit` tracks similar to `track_id`
    ///
    /// May be empty. Must not include the seed itself.
    async fn fetch_similar(&self, track_id: &str, limit: usize) -> Result<Vec<Track>>;
}

/// Suggests from a fixed in-memory catalog
///
/// Ranking: same artist and same album first, then same artist, then same
/// album. Tracks sharing neither are never suggested. Ties keep catalog
/// order.
#[derive(Debug, Clone, Default)]
pub struct CatalogSupplier {
    catalog: Vec<Track>,
}

impl CatalogSupplier {
    pub fn new(catalog: Vec<Track>) -> Self {
        Self { catalog }
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    fn score(seed: &Track, candidate: &Track) -> u8 {
        fn shared(a: &Option<String>, b: &Option<String>) -> bool {
            matches!((a, b), (Some(a), Some(b)) if a == b)
        }

        let mut score = 0;
        if shared(&seed.artist_id, &candidate.artist_id) {
            score += 2;
        }
        if shared(&seed.album_id, &candidate.album_id) {
            score += 1;
        }
        score
    }
}

#[async_trait]
impl AutoplaySupplier for CatalogSupplier {
    async fn fetch_similar(&self, track_id: &str, limit: usize) -> Result<Vec<Track>> {
        let seed = self
            .catalog
            .iter()
            .find(|t| t.id == track_id)
            .ok_or_else(|| Error::Supplier(format!("Track {} not in catalog", track_id)))?;

        let mut ranked: Vec<(u8, &Track)> = self
            .catalog
            .iter()
            .filter(|t| t.id != seed.id)
            .map(|t| (Self::score(seed, t), t))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Stable: ties keep catalog order
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        let suggestions: Vec<Track> = ranked
            .into_iter()
            .take(limit)
            .map(|(_, t)| t.clone())
            .collect();

        debug!(
            "Catalog suggested {} tracks for seed {}",
            suggestions.len(),
            track_id
        );
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Track> {
        vec![
            Track::new("seed", "Seed", 100.0)
                .with_artist("artist-1")
                .with_album("album-1"),
            Track::new("other-artist", "Other", 100.0).with_artist("artist-2"),
            Track::new("same-album", "Same Album", 100.0)
                .with_artist("artist-3")
                .with_album("album-1"),
            Track::new("same-artist", "Same Artist", 100.0).with_artist("artist-1"),
            Track::new("both", "Both", 100.0)
                .with_artist("artist-1")
                .with_album("album-1"),
        ]
    }

    #[tokio::test]
    async fn test_ranking_and_seed_excluded() {
        let supplier = CatalogSupplier::new(catalog());
        let similar = supplier.fetch_similar("seed", 10).await.unwrap();
        let ids: Vec<&str> = similar.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["both", "same-artist", "same-album"]);
    }

    #[tokio::test]
    async fn test_limit_respected() {
        let supplier = CatalogSupplier::new(catalog());
        let similar = supplier.fetch_similar("seed", 1).await.unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].id, "both");
    }

    #[tokio::test]
    async fn test_unknown_seed_is_supplier_error() {
        let supplier = CatalogSupplier::new(catalog());
        let err = supplier.fetch_similar("missing", 10).await.unwrap_err();
        assert!(matches!(err, Error::Supplier(_)));
    }

    #[tokio::test]
    async fn test_no_shared_attributes_yields_empty() {
        let supplier = CatalogSupplier::new(vec![
            Track::new("a", "A", 10.0).with_artist("x"),
            Track::new("b", "B", 10.0).with_artist("y"),
        ]);
        assert!(supplier.fetch_similar("a", 10).await.unwrap().is_empty());
    }
}
