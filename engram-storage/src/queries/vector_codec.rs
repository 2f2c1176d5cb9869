//! Embedding vectors travel as little-endian f32 BLOBs.

/// Convert an f32 slice to bytes (little-endian).
pub fn f32_vec_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert bytes back to an f32 vec. Returns `None` when the blob does
/// not decode to exactly `expected_dims` values.
pub fn bytes_to_f32_vec(bytes: &[u8], expected_dims: usize) -> Option<Vec<f32>> {
    if bytes.len() != expected_dims * 4 {
        return None;
    }
    let mut result = Vec::with_capacity(expected_dims);
    for chunk in bytes.chunks_exact(4) {
        result.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let v = vec![0.5_f32, -1.25, 3.0];
        let bytes = f32_vec_to_bytes(&v);
        assert_eq!(bytes_to_f32_vec(&bytes, 3), Some(v));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let bytes = f32_vec_to_bytes(&[1.0, 2.0]);
        assert_eq!(bytes_to_f32_vec(&bytes, 3), None);
        assert_eq!(bytes_to_f32_vec(&bytes[..7], 2), None);
    }
}
