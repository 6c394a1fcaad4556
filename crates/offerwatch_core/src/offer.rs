use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable identifier for one listing.
///
/// Identity is the sole key the diff operates on, so it must be stable
/// across runs for the same physical listing and must not collide across
/// distinct listings. When the site exposes a native key (e.g. a
/// `data-id` attribute) that key is preferred; otherwise the id is
/// derived from the listing content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferId(String);

impl OfferId {
    /// Wrap a site-provided key verbatim.
    pub fn native(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derive an id from listing content: SHA-256 over title, link and
    /// price (absent price hashes as the empty string), truncated to 16
    /// hex chars. A price *change* therefore changes the id; sites that
    /// reprice listings in place should configure a native key instead.
    pub fn derived(title: &str, link: &str, price: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(b"\n");
        hasher.update(link.as_bytes());
        hasher.update(b"\n");
        hasher.update(price.unwrap_or("").as_bytes());
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(16);
        for byte in digest.iter().take(8) {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OfferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One extracted listing. Display attributes are opaque to the diff;
/// only `id` participates in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_id_is_deterministic() {
        let a = OfferId::derived("Room A", "/offers/1", Some("450"));
        let b = OfferId::derived("Room A", "/offers/1", Some("450"));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 16);
    }

    #[test]
    fn derived_id_distinguishes_fields() {
        let base = OfferId::derived("Room A", "/offers/1", Some("450"));
        assert_ne!(base, OfferId::derived("Room B", "/offers/1", Some("450")));
        assert_ne!(base, OfferId::derived("Room A", "/offers/2", Some("450")));
        assert_ne!(base, OfferId::derived("Room A", "/offers/1", None));
    }

    #[test]
    fn field_separator_prevents_boundary_collisions() {
        // "ab" + "c" must not hash like "a" + "bc".
        let a = OfferId::derived("ab", "c", None);
        let b = OfferId::derived("a", "bc", None);
        assert_ne!(a, b);
    }
}
