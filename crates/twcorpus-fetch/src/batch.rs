//! Grouping identifiers into lookup-sized batches.

use crate::error::FetchError;

/// Hard ceiling on identifiers per lookup request.
pub const MAX_BATCH_SIZE: usize = 100;

/// An ordered group of 1..=[`MAX_BATCH_SIZE`] identifiers sent in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    ids: Vec<String>,
}

impl Batch {
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidBatch`] for an empty batch or one holding
    /// more than [`MAX_BATCH_SIZE`] identifiers.
    pub fn new(ids: Vec<String>) -> Result<Self, FetchError> {
        if ids.is_empty() || ids.len() > MAX_BATCH_SIZE {
            return Err(FetchError::InvalidBatch {
                len: ids.len(),
                max: MAX_BATCH_SIZE,
            });
        }
        Ok(Self { ids })
    }

    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Never true for a batch built through [`Batch::new`] or [`batches`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The last identifier, used to label the batch in logs.
    #[must_use]
    pub fn last_id(&self) -> &str {
        self.ids.last().map_or("", String::as_str)
    }

    /// Comma-joined identifiers for the `ids` query parameter.
    #[must_use]
    pub fn joined(&self) -> String {
        self.ids.join(",")
    }
}

/// Lazy iterator over consecutive batches of an identifier list.
#[derive(Debug)]
pub struct Batches {
    ids: std::vec::IntoIter<String>,
    size: usize,
}

impl Iterator for Batches {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let ids: Vec<String> = self.ids.by_ref().take(self.size).collect();
        if ids.is_empty() {
            None
        } else {
            Some(Batch { ids })
        }
    }
}

/// Splits `ids` into batches of at most `size`, preserving order.
///
/// # Panics
///
/// Panics if `size` is zero or above [`MAX_BATCH_SIZE`].
#[must_use]
pub fn batches(ids: Vec<String>, size: usize) -> Batches {
    assert!(
        (1..=MAX_BATCH_SIZE).contains(&size),
        "batch size {size} outside 1..={MAX_BATCH_SIZE}"
    );
    Batches {
        ids: ids.into_iter(),
        size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| (1_000 + i).to_string()).collect()
    }

    #[test]
    fn concatenated_batches_reproduce_input() {
        for total in [0, 1, 7, 99, 100, 101, 250] {
            for size in [1, 2, 3, 10, 33, 99, 100] {
                let input = ids(total);
                let out: Vec<Batch> = batches(input.clone(), size).collect();
                assert!(out.iter().all(|b| !b.is_empty() && b.len() <= size));
                let flat: Vec<String> = out.into_iter().flat_map(|b| b.ids).collect();
                assert_eq!(flat, input, "total={total} size={size}");
            }
        }
    }

    #[test]
    fn only_last_batch_is_short() {
        let out: Vec<Batch> = batches(ids(250), 100).collect();
        let lens: Vec<usize> = out.iter().map(Batch::len).collect();
        assert_eq!(lens, vec![100, 100, 50]);
        assert_eq!(out[2].last_id(), "1249");
    }

    #[test]
    #[should_panic(expected = "outside 1..=100")]
    fn oversized_batch_size_panics() {
        let _ = batches(ids(5), 101);
    }

    #[test]
    #[should_panic(expected = "outside 1..=100")]
    fn zero_batch_size_panics() {
        let _ = batches(ids(5), 0);
    }

    #[test]
    fn new_rejects_empty_and_oversized() {
        assert!(matches!(
            Batch::new(vec![]),
            Err(FetchError::InvalidBatch { len: 0, .. })
        ));
        assert!(matches!(
            Batch::new(ids(101)),
            Err(FetchError::InvalidBatch { len: 101, max: 100 })
        ));
        assert_eq!(Batch::new(ids(100)).unwrap().len(), 100);
    }

    #[test]
    fn joined_uses_commas() {
        let batch = Batch::new(vec!["1".into(), "2".into(), "3".into()]).unwrap();
        assert_eq!(batch.joined(), "1,2,3");
    }
}
