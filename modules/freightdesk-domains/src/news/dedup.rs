//! Duplicate detection for collected articles.
//!
//! Three layers, cheapest first: exact canonical URL / title hash within the
//! batch, the same keys against stored articles, then token Jaccard on
//! normalised titles against recent titles.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_cid", "mc_eid"];

/// Canonical form of an article URL used as its identity.
pub fn canonicalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut parsed) = url::Url::parse(trimmed) else {
        return trimmed.trim_end_matches('/').to_lowercase();
    };

    parsed.set_fragment(None);

    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        if let Some(bare) = host.strip_prefix("www.") {
            let bare = bare.to_string();
            // Fails only for hosts the URL grammar rejects; keep the original then.
            let _ = parsed.set_host(Some(&bare));
        }
    }

    if parsed.query().is_some() {
        let kept: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(key, _)| {
                let key = key.to_lowercase();
                !key.starts_with("utm_") && !TRACKING_PARAMS.contains(&key.as_str())
            })
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if kept.is_empty() {
            parsed.set_query(None);
        } else {
            parsed.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    let mut canonical = parsed.to_string();
    while canonical.ends_with('/') {
        canonical.pop();
    }
    canonical
}

/// Lower-case, punctuation to spaces, whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    let spaced: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// SHA-256 hex of the normalised title.
pub fn content_hash(title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_title(title).as_bytes());
    hex::encode(hasher.finalize())
}

/// Token Jaccard similarity of two already-normalised titles.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let a_tokens: HashSet<&str> = a.split_whitespace().collect();
    let b_tokens: HashSet<&str> = b.split_whitespace().collect();
    let union = a_tokens.union(&b_tokens).count();
    if union == 0 {
        return 0.0;
    }
    a_tokens.intersection(&b_tokens).count() as f64 / union as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupVerdict {
    New,
    /// Same canonical URL or title hash as something already seen.
    Exact,
    /// Title too similar to a recent one.
    NearDuplicate,
}

/// Stateful dedup over one pipeline run, seeded with stored keys and recent titles.
#[derive(Debug, Default)]
pub struct Deduplicator {
    threshold: f64,
    urls: HashSet<String>,
    hashes: HashSet<String>,
    titles: Vec<String>,
}

impl Deduplicator {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    /// Normalised titles stored within the lookback window.
    pub fn with_recent_titles(mut self, titles: impl IntoIterator<Item = String>) -> Self {
        self.titles
            .extend(titles.into_iter().map(|t| normalize_title(&t)));
        self
    }

    /// Check an item and, if new, remember it for later items in the batch.
    /// `exists_in_store` reports whether the URL/hash pair is already persisted.
    pub fn check(
        &mut self,
        canonical_url: &str,
        hash: &str,
        normalized_title: &str,
        exists_in_store: bool,
    ) -> DedupVerdict {
        if self.urls.contains(canonical_url) || self.hashes.contains(hash) || exists_in_store {
            return DedupVerdict::Exact;
        }
        if self
            .titles
            .iter()
            .any(|seen| jaccard_similarity(seen, normalized_title) >= self.threshold)
        {
            return DedupVerdict::NearDuplicate;
        }

        self.urls.insert(canonical_url.to_string());
        self.hashes.insert(hash.to_string());
        self.titles.push(normalized_title.to_string());
        DedupVerdict::New
    }
}
