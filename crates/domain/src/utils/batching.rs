//! Splitting oversized batches

use crate::constants::MAX_BATCH_SIZE;

/// Splits `items` into consecutive slices of at most [`MAX_BATCH_SIZE`]
/// elements, preserving order.
///
/// The client never splits on its own; callers that may exceed the remote
/// limit issue one call per chunk.
pub fn chunks<T>(items: &[T]) -> std::slice::Chunks<'_, T> {
    items.chunks(MAX_BATCH_SIZE)
}
