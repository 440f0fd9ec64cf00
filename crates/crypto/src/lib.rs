/*!
# Crypto

Content hashing for cache keys.
Never roll your own hashing - this wraps blake3.
*/

pub struct CryptoUtils;

impl CryptoUtils {
    /// Hex blake3 digest of `data`.
    pub fn hash_content(data: &[u8]) -> String {
        blake3::hash(data).to_hex().to_string()
    }

    /// Embedding cache key for a piece of text.
    pub fn content_key(text: &str) -> String {
        Self::hash_content(text.as_bytes())
    }

    /// Result cache key built from several parts (query, model, parameters...).
    ///
    /// Each part is length-prefixed, so `["ab", "c"]` and `["a", "bc"]` hash
    /// differently.
    pub fn composite_key<S: AsRef<str>>(parts: &[S]) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            let bytes = part.as_ref().as_bytes();
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }
        hasher.finalize().to_hex().to_string()
    }
}
