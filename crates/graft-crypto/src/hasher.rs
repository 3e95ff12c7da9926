use graft_types::ContentHash;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g., `"graft-large-value-v1"`) that is
/// prepended to every hash computation, so identical bytes hashed for
/// different purposes produce different digests.
#[derive(Clone, Copy, Debug)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for externalized large property values.
    pub const LARGE_VALUE: Self = Self {
        domain: "graft-large-value-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentHash {
        let mut hasher = self.begin();
        hasher.update(data);
        self.finish(hasher)
    }

    /// Start an incremental hash for content that arrives in chunks.
    pub fn begin(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }

    /// Finish an incremental hash started with [`ContentHasher::begin`].
    pub fn finish(&self, hasher: blake3::Hasher) -> ContentHash {
        ContentHash::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected hash.
    pub fn verify(&self, data: &[u8], expected: &ContentHash) -> bool {
        self.hash(data) == *expected
    }
}
