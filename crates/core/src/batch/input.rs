//! Caller input that may be absent
//!
//! Batch operations accept anything that can be viewed as a slice, plus an
//! `Option` of one so that "no input at all" stays distinguishable from an
//! empty batch.

use forcelink_domain::ArgumentError;

/// A possibly absent batch of items.
pub trait BatchInput<'a, T: 'a> {
    /// `None` when the input is absent.
    fn into_items(self) -> Option<&'a [T]>;
}

impl<'a, T: 'a> BatchInput<'a, T> for &'a [T] {
    fn into_items(self) -> Option<&'a [T]> {
        Some(self)
    }
}

impl<'a, T: 'a> BatchInput<'a, T> for &'a Vec<T> {
    fn into_items(self) -> Option<&'a [T]> {
        Some(self.as_slice())
    }
}

impl<'a, T: 'a, const N: usize> BatchInput<'a, T> for &'a [T; N] {
    fn into_items(self) -> Option<&'a [T]> {
        Some(self.as_slice())
    }
}

impl<'a, T: 'a> BatchInput<'a, T> for Option<&'a [T]> {
    fn into_items(self) -> Option<&'a [T]> {
        self
    }
}

/// Resolve `input` to a present, non-empty slice.
///
/// # Errors
/// `ArgumentError::Null` when absent, `ArgumentError::Empty` when empty.
pub fn require<'a, T: 'a>(
    input: impl BatchInput<'a, T>,
    name: &'static str,
) -> Result<&'a [T], ArgumentError> {
    match input.into_items() {
        None => Err(ArgumentError::Null(name)),
        Some([]) => Err(ArgumentError::Empty(name)),
        Some(items) => Ok(items),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_distinguishes_absent_and_empty() {
        let empty: Vec<u8> = Vec::new();
        assert_eq!(require(None::<&[u8]>, "records"), Err(ArgumentError::Null("records")));
        assert_eq!(require(&empty, "records"), Err(ArgumentError::Empty("records")));
        assert_eq!(require(&[1_u8, 2], "records"), Ok(&[1_u8, 2][..]));
        assert_eq!(require(Some(&[7_u8][..]), "ids"), Ok(&[7_u8][..]));
    }
}
