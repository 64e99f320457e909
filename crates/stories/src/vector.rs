//! Vector math for cosine similarity over unit vectors.

/// Euclidean norm of a vector.
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale a vector to unit length in place.
///
/// A zero-norm vector is left untouched (all zeros) and `false` is returned.
pub fn normalize_in_place(vector: &mut [f32]) -> bool {
    let norm = l2_norm(vector);
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
        true
    } else {
        false
    }
}

/// Owned variant of [`normalize_in_place`].
pub fn normalized(mut vector: Vec<f32>) -> Vec<f32> {
    normalize_in_place(&mut vector);
    vector
}

/// Inner product of two vectors of equal length.
///
/// For unit vectors this is their cosine similarity.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_to_unit_length() {
        let v = normalized(vec![3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_stays_zero() {
        let mut v = vec![0.0, 0.0, 0.0];
        assert!(!normalize_in_place(&mut v));
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_dot_of_unit_vectors_is_cosine() {
        let a = normalized(vec![1.0, 1.0]);
        let b = normalized(vec![1.0, 0.0]);
        assert!((dot(&a, &b) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-6);
    }
}
