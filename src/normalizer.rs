//! Feature vector normalization for model inference.
//!
//! The upstream feature schema may drift in length; the model input does
//! not. Vectors are padded with zeros on the right or truncated to the
//! first `expected_len` positions. Normalization never fails.

/// How a vector was reshaped to fit the model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Input already had the expected length
    Exact,
    /// Zeros were appended
    Padded { added: usize },
    /// Trailing entries were dropped
    Truncated { dropped: usize },
}

impl Coercion {
    /// Whether the input was altered
    pub fn is_altered(&self) -> bool {
        !matches!(self, Coercion::Exact)
    }
}

/// A feature vector of exactly the model's input width.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedVector {
    values: Vec<f64>,
    original_len: usize,
    coercion: Coercion,
}

impl NormalizedVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Length of the vector before normalization
    pub fn original_len(&self) -> usize {
        self.original_len
    }

    pub fn coercion(&self) -> Coercion {
        self.coercion
    }

    /// Values as `f32`, the precision the model runs at
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }
}

/// Coerce `features` to exactly `expected_len` entries.
pub fn normalize(features: &[f64], expected_len: usize) -> NormalizedVector {
    normalize_owned(features.to_vec(), expected_len)
}

fn normalize_owned(mut values: Vec<f64>, expected_len: usize) -> NormalizedVector {
    let original_len = values.len();

    let coercion = if original_len < expected_len {
        values.resize(expected_len, 0.0);
        Coercion::Padded {
            added: expected_len - original_len,
        }
    } else if original_len > expected_len {
        values.truncate(expected_len);
        Coercion::Truncated {
            dropped: original_len - expected_len,
        }
    } else {
        Coercion::Exact
    };

    NormalizedVector {
        values,
        original_len,
        coercion,
    }
}

/// Normalizer bound to a model's input width.
#[derive(Debug, Clone, Copy)]
pub struct FeatureNormalizer {
    expected_len: usize,
}

impl FeatureNormalizer {
    pub fn new(expected_len: usize) -> Self {
        Self { expected_len }
    }

    pub fn expected_len(&self) -> usize {
        self.expected_len
    }

    /// Normalize an owned vector without copying when it already fits.
    pub fn normalize(&self, features: Vec<f64>) -> NormalizedVector {
        normalize_owned(features, self.expected_len)
    }
}

impl Default for FeatureNormalizer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FEATURE_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const K: usize = 73;

    fn random_vector(rng: &mut impl Rng, len: usize) -> Vec<f64> {
        (0..len).map(|_| rng.gen_range(-1000.0..1000.0)).collect()
    }

    #[test]
    fn test_short_vectors_are_zero_padded() {
        let mut rng = rand::thread_rng();
        for len in 0..K {
            let input = random_vector(&mut rng, len);
            let out = normalize(&input, K);

            assert_eq!(out.len(), K);
            assert_eq!(&out.as_slice()[..len], input.as_slice());
            assert!(out.as_slice()[len..].iter().all(|&v| v == 0.0));
            assert_eq!(out.coercion(), Coercion::Padded { added: K - len });
        }
    }

    #[test]
    fn test_long_vectors_keep_leading_entries() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let len = rng.gen_range(K + 1..K * 3);
            let input = random_vector(&mut rng, len);
            let out = normalize(&input, K);

            assert_eq!(out.as_slice(), &input[..K]);
            assert_eq!(out.original_len(), len);
            assert_eq!(out.coercion(), Coercion::Truncated { dropped: len - K });
        }
    }

    #[test]
    fn test_exact_length_is_identity() {
        let mut rng = rand::thread_rng();
        let input = random_vector(&mut rng, K);
        let out = FeatureNormalizer::new(K).normalize(input.clone());

        assert_eq!(out.as_slice(), input.as_slice());
        assert!(!out.coercion().is_altered());
    }

    #[test]
    fn test_empty_input_becomes_zeros() {
        let out = FeatureNormalizer::default().normalize(Vec::new());
        assert_eq!(out.into_inner(), vec![0.0; K]);
    }

    #[test]
    fn test_nan_entries_pass_through() {
        let out = normalize(&[1.0, f64::NAN], 3);
        assert!(out.as_slice()[1].is_nan());
        assert_eq!(out.to_f32()[2], 0.0);
    }
}
