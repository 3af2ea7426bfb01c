//! Client-side text embedding
//!
//! The vector store needs a vector for every record and query, but the
//! directory and log are only ever used for exact lookups and loose text
//! queries. A hashed bag-of-words keeps the service free of any embedding
//! model while still letting related text land close together.

/// Embedding dimensionality
pub const DIMENSIONS: usize = 128;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Embed text into a unit-length vector of [`DIMENSIONS`] components
pub fn embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIMENSIONS];

    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let hash = fnv1a(&token.to_lowercase());
        let index = (hash % DIMENSIONS as u64) as usize;
        let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
        vector[index] += sign;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        // Cosine distance is undefined for the zero vector.
        vector[0] = 1.0;
        return vector;
    }
    vector.iter_mut().for_each(|v| *v /= norm);
    vector
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn embedding_is_deterministic_and_normalized() {
        let a = embed("Deploy the backend service");
        let b = embed("deploy THE backend, service!");
        assert_eq!(a, b);

        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_is_not_the_zero_vector() {
        let v = embed("   ");
        assert_eq!(v.len(), DIMENSIONS);
        assert_eq!(v[0], 1.0);
    }

    #[test]
    fn shared_tokens_are_closer_than_disjoint_ones() {
        let base = embed("qa-automation run e2e suite");
        let related = embed("qa-automation finished suite");
        let unrelated = embed("design new landing page");
        assert!(cosine(&base, &related) > cosine(&base, &unrelated));
    }
}
