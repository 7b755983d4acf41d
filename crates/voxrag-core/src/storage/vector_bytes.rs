//! Conversion between `&[f32]` vectors and the little-endian byte runs the
//! vector store persists.

/// Converts a vector slice to a byte slice, reinterpreting the `f32`s
/// in-place (no copy). Valid because `f32` has no invalid bit patterns and
/// native endianness on all supported targets is little-endian.
#[inline]
pub(super) fn vector_to_bytes(vector: &[f32]) -> &[u8] {
    // SAFETY: f32 has no invalid bit patterns, the slice is contiguous, and
    // the returned slice borrows from `vector` so its lifetime is sound.
    unsafe {
        std::slice::from_raw_parts(vector.as_ptr().cast::<u8>(), std::mem::size_of_val(vector))
    }
}

/// Converts `dimension * 4` bytes back into an owned `Vec<f32>`.
///
/// # Panics
///
/// Panics if `bytes.len() < dimension * size_of::<f32>()`.
#[inline]
pub(super) fn bytes_to_vector(bytes: &[u8], dimension: usize) -> Vec<f32> {
    let vector_size = dimension * std::mem::size_of::<f32>();
    assert!(
        bytes.len() >= vector_size,
        "bytes_to_vector: buffer too small ({} < {})",
        bytes.len(),
        vector_size
    );

    let mut vector = vec![0.0f32; dimension];
    // SAFETY: length checked above; both sides are f32-derived byte runs.
    unsafe {
        std::ptr::copy_nonoverlapping(
            bytes.as_ptr(),
            vector.as_mut_ptr().cast::<u8>(),
            vector_size,
        );
    }
    vector
}
