//! Assertion functions for component outputs.

use crate::batch::{Batch, FlushTrigger};
use crate::signal::Signal;
use std::fmt::Debug;

/// Assert that two collections are equal in order and content.
///
/// # Panics
///
/// Panics if the collections differ in length or content.
///
/// # Example
///
/// ```
/// use floodgate::testing::assert_collections_equal;
///
/// assert_collections_equal(&[1, 2, 9], &[1, 2, 9]);
/// ```
pub fn assert_collections_equal<T: Debug + PartialEq>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );

    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(
            a, e,
            "Collection mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full expected: {expected:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert that batches hold exactly the expected items, batch by batch.
///
/// # Example
///
/// ```
/// use floodgate::{BatchBuffer, BatchConfig};
/// use floodgate::testing::assert_batches_equal;
///
/// let mut buffer = BatchBuffer::new(BatchConfig::default()).unwrap();
/// let mut batches: Vec<_> = (0..8).filter_map(|i| buffer.push(i)).collect();
/// batches.extend(buffer.complete());
/// assert_batches_equal(&batches, &[vec![0, 1, 2, 3, 4, 5], vec![6, 7]]);
/// ```
pub fn assert_batches_equal<T: Debug + PartialEq>(actual: &[Batch<T>], expected: &[Vec<T>]) {
    let items: Vec<&[T]> = actual.iter().map(|b| b.items.as_slice()).collect();
    assert_eq!(
        actual.len(),
        expected.len(),
        "Batch count mismatch:\n  Expected: {expected:?}\n  Actual: {items:?}"
    );

    for (i, (batch, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(
            &batch.items, e,
            "Batch {i} ({} flush) mismatch:\n  Expected: {e:?}\n  Actual: {:?}",
            batch.trigger, batch.items
        );
        assert!(!batch.items.is_empty(), "Batch {i} is empty");
    }
}

/// Assert the trigger that produced each batch.
pub fn assert_batch_triggers<T>(actual: &[Batch<T>], expected: &[FlushTrigger]) {
    let triggers: Vec<FlushTrigger> = actual.iter().map(|b| b.trigger).collect();
    assert_eq!(triggers, expected, "Flush trigger mismatch");
}

/// Assert that `output` is a subsequence of `input`: every output element
/// appears in the input, at most once, in input order.
///
/// # Example
///
/// ```
/// use floodgate::testing::assert_order_preserving_subsequence;
///
/// assert_order_preserving_subsequence(&[1, 2, 9], &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
/// ```
///
/// # Panics
///
/// Panics on the first output element that cannot be matched after the
/// previous match.
pub fn assert_order_preserving_subsequence<T: Debug + PartialEq>(output: &[T], input: &[T]) {
    let mut cursor = 0;
    for (i, item) in output.iter().enumerate() {
        match input[cursor..].iter().position(|x| x == item) {
            Some(offset) => cursor += offset + 1,
            None => panic!(
                "Output element {i} ({item:?}) is duplicated, reordered or unknown:\n  Input: {input:?}\n  Output: {output:?}"
            ),
        }
    }
}

/// Assert that a signal sequence ends with exactly one terminal signal and
/// return the `Next` payloads before it.
///
/// # Panics
///
/// Panics if there is no terminal signal, or anything follows it.
pub fn assert_terminated_once<T: Debug, E: Debug>(signals: Vec<Signal<T, E>>) -> Vec<T> {
    let terminals = signals.iter().filter(|s| s.is_terminal()).count();
    assert_eq!(terminals, 1, "Expected exactly one terminal signal in {signals:?}");
    assert!(
        signals.last().is_some_and(Signal::is_terminal),
        "Terminal signal is not last in {signals:?}"
    );
    signals.into_iter().filter_map(Signal::into_next).collect()
}

/// Assert that all elements in a collection satisfy a predicate.
///
/// # Panics
///
/// Panics if any element does not satisfy the predicate.
pub fn assert_all<T: Debug>(collection: &[T], predicate: impl Fn(&T) -> bool) {
    for (i, item) in collection.iter().enumerate() {
        assert!(
            predicate(item),
            "Predicate failed for element at index {i}:\n  Element: {item:?}\n  Collection: {collection:?}"
        );
    }
}
