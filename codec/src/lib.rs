//! Byte-packing codec for multi-vector embedding sequences.
//!
//! A `(L, D)` sequence of `float32`s is packed to bytes, DEFLATEd, then re-encoded into a
//! printable (base64) alphabet so it can live as a plain string in vector-store metadata. Shape
//! travels alongside the blob as a sibling field on the caller's record — it is never embedded
//! in the blob itself, to avoid paying self-describing-format overhead on every record.

use std::io::{Read, Write};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use half::f16;
use thiserror::Error;

/// Metadata size limit treated as the store's hard ceiling (see `EmbeddingValidationError` in
/// the vector store adapter, which checks this on insert rather than relying on this default).
pub const DEFAULT_BUDGET_BYTES: usize = 2 * 1024 * 1024;

/// Errors raised while compressing or decompressing a blob.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The DEFLATE stage failed (I/O error writing to or reading from the in-memory buffer).
    #[error("deflate stream error: {0}")]
    Deflate(#[source] std::io::Error),
    /// The base64 stage failed to decode: the input is not valid output of [`compress`].
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Compressed output exceeds the configured budget.
    #[error("compressed size {actual} exceeds budget {budget} bytes")]
    BudgetExceeded {
        /// Size of the encoded string, in bytes.
        actual: usize,
        /// The budget that was exceeded.
        budget: usize,
    },
}

/// Compresses `bytes` to a printable string, enforcing [`DEFAULT_BUDGET_BYTES`].
pub fn compress(bytes: &[u8]) -> Result<String, CodecError> {
    compress_with_budget(bytes, DEFAULT_BUDGET_BYTES)
}

/// Compresses `bytes` to a printable string, failing with [`CodecError::BudgetExceeded`] if the
/// encoded output would exceed `budget_bytes`.
pub fn compress_with_budget(bytes: &[u8], budget_bytes: usize) -> Result<String, CodecError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(6));
    encoder.write_all(bytes).map_err(CodecError::Deflate)?;
    let deflated = encoder.finish().map_err(CodecError::Deflate)?;

    let encoded = BASE64.encode(deflated);
    if encoded.len() > budget_bytes {
        return Err(CodecError::BudgetExceeded {
            actual: encoded.len(),
            budget: budget_bytes,
        });
    }
    Ok(encoded)
}

/// Reverses [`compress`], reproducing the original bytes exactly.
pub fn decompress(encoded: &str) -> Result<Vec<u8>, CodecError> {
    let deflated = BASE64.decode(encoded)?;
    let mut decoder = DeflateDecoder::new(&deflated[..]);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(CodecError::Deflate)?;
    Ok(out)
}

/// Packs a flat `float32` sequence (row-major `(L, D)`) to bytes and compresses it.
///
/// Callers carry `(L, D)` alongside the returned string; this function has no notion of shape.
pub fn compress_f32(values: &[f32]) -> Result<String, CodecError> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    compress(&bytes)
}

/// Reverses [`compress_f32`]. The caller supplies the expected element count (`L * D`, known
/// from the sibling shape field) purely as a sanity check against truncated/corrupt input.
pub fn decompress_f32(encoded: &str, expected_len: usize) -> Result<Vec<f32>, CodecError> {
    let bytes = decompress(encoded)?;
    if bytes.len() != expected_len * 4 {
        return Err(CodecError::Deflate(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "expected {} bytes for {expected_len} f32 values, got {}",
                expected_len * 4,
                bytes.len()
            ),
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().expect("chunks_exact(4)")))
        .collect())
}

/// Packs a flat `float32` sequence to half-precision (`binary16`) and compresses it (spec §4.1
/// `EMBEDDING_PRECISION=fp16`). Lossy: round-tripping through [`decompress_f16`] reproduces the
/// original only within the store's 1e-3 max-abs epsilon (spec §8), not bit-exactly.
pub fn compress_f16(values: &[f32]) -> Result<String, CodecError> {
    let mut bytes = Vec::with_capacity(values.len() * 2);
    for v in values {
        bytes.extend_from_slice(&f16::from_f32(*v).to_le_bytes());
    }
    compress(&bytes)
}

/// Reverses [`compress_f16`]. See [`decompress_f32`] for the `expected_len` contract.
pub fn decompress_f16(encoded: &str, expected_len: usize) -> Result<Vec<f32>, CodecError> {
    let bytes = decompress(encoded)?;
    if bytes.len() != expected_len * 2 {
        return Err(CodecError::Deflate(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "expected {} bytes for {expected_len} f16 values, got {}",
                expected_len * 2,
                bytes.len()
            ),
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|chunk| f16::from_le_bytes(chunk.try_into().expect("chunks_exact(2)")).to_f32())
        .collect())
}

/// Packs a flat `float32` sequence to 8-bit linearly-quantized integers and compresses it (spec
/// §4.1 `EMBEDDING_PRECISION=int8`). The per-call scale factor (`max(|values|) / 127`) is
/// prepended to the packed bytes so [`decompress_i8`] needs no side channel beyond the blob
/// itself. Lossy, and coarser than [`compress_f16`].
pub fn compress_i8(values: &[f32]) -> Result<String, CodecError> {
    let max_abs = values.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
    let scale = (max_abs / i8::MAX as f32).max(f32::MIN_POSITIVE);
    let mut bytes = Vec::with_capacity(4 + values.len());
    bytes.extend_from_slice(&scale.to_le_bytes());
    for v in values {
        let quantized = (v / scale).round().clamp(i8::MIN as f32, i8::MAX as f32) as i8;
        bytes.push(quantized.to_le_bytes()[0]);
    }
    compress(&bytes)
}

/// Reverses [`compress_i8`]. See [`decompress_f32`] for the `expected_len` contract.
pub fn decompress_i8(encoded: &str, expected_len: usize) -> Result<Vec<f32>, CodecError> {
    let bytes = decompress(encoded)?;
    if bytes.len() != expected_len + 4 {
        return Err(CodecError::Deflate(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "expected {} bytes for {expected_len} i8 values, got {}",
                expected_len + 4,
                bytes.len()
            ),
        )));
    }
    let scale = f32::from_le_bytes(bytes[0..4].try_into().expect("4-byte scale prefix"));
    Ok(bytes[4..]
        .iter()
        .map(|byte| i8::from_le_bytes([*byte]) as f32 * scale)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_trips_empty_input() {
        let encoded = compress(&[]).unwrap();
        assert_eq!(decompress(&encoded).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn round_trips_f32_sequence() {
        let values: Vec<f32> = (0..768 * 20).map(|i| (i as f32) * 0.001 - 1.0).collect();
        let encoded = compress_f32(&values).unwrap();
        let decoded = decompress_f32(&encoded, values.len()).unwrap();
        assert_eq!(values, decoded);
    }

    #[test]
    fn encoded_output_is_printable_ascii() {
        let encoded = compress(b"the quick brown fox jumps over the lazy dog").unwrap();
        assert!(encoded.chars().all(|c| c.is_ascii_graphic()));
    }

    #[test]
    fn budget_exceeded_is_reported() {
        let bytes = vec![0xABu8; 4096];
        let err = compress_with_budget(&bytes, 8).unwrap_err();
        assert!(matches!(err, CodecError::BudgetExceeded { .. }));
    }

    #[test]
    fn corrupt_base64_surfaces_error() {
        let err = decompress("not valid base64 !!!").unwrap_err();
        assert!(matches!(err, CodecError::Base64(_)));
    }

    #[test]
    fn mismatched_length_surfaces_error() {
        let encoded = compress_f32(&[1.0, 2.0, 3.0]).unwrap();
        assert!(decompress_f32(&encoded, 5).is_err());
    }

    #[test]
    fn f16_round_trip_stays_within_epsilon() {
        let values: Vec<f32> = (0..768 * 20).map(|i| (i as f32) * 0.001 - 1.0).collect();
        let encoded = compress_f16(&values).unwrap();
        let decoded = decompress_f16(&encoded, values.len()).unwrap();
        for (original, recovered) in values.iter().zip(decoded.iter()) {
            assert!((original - recovered).abs() <= 1e-3, "{original} vs {recovered}");
        }
    }

    #[test]
    fn f16_mismatched_length_surfaces_error() {
        let encoded = compress_f16(&[1.0, 2.0, 3.0]).unwrap();
        assert!(decompress_f16(&encoded, 5).is_err());
    }

    #[test]
    fn i8_round_trip_stays_within_quantization_error() {
        let values: Vec<f32> = (0..256).map(|i| (i as f32) * 0.01 - 1.28).collect();
        let encoded = compress_i8(&values).unwrap();
        let decoded = decompress_i8(&encoded, values.len()).unwrap();
        let max_abs = values.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
        let tolerance = max_abs / i8::MAX as f32;
        for (original, recovered) in values.iter().zip(decoded.iter()) {
            assert!(
                (original - recovered).abs() <= tolerance + f32::EPSILON,
                "{original} vs {recovered}"
            );
        }
    }

    #[test]
    fn i8_handles_all_zero_input() {
        let values = vec![0.0f32; 8];
        let encoded = compress_i8(&values).unwrap();
        let decoded = decompress_i8(&encoded, values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    proptest! {
        #[test]
        fn compress_decompress_is_identity(bytes in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let encoded = compress(&bytes).unwrap();
            let decoded = decompress(&encoded).unwrap();
            prop_assert_eq!(bytes, decoded);
        }

        #[test]
        fn f32_round_trip_is_bit_exact(values in proptest::collection::vec(any::<f32>().prop_filter("finite", |v| v.is_finite()), 0..512)) {
            let encoded = compress_f32(&values).unwrap();
            let decoded = decompress_f32(&encoded, values.len()).unwrap();
            prop_assert_eq!(values, decoded);
        }
    }
}
