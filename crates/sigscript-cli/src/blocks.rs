//! Block arithmetic for overlapping analysis windows.
//!
//! A signal of `samples` values is cut into blocks of `bsize` samples whose
//! starts are `ssize` apart. Block `i` covers `i * ssize .. i * ssize + bsize`
//! and is centered on `bsize / 2 + i * ssize`.

use std::ops::Range;

/// Index of the last block that fits entirely inside the signal.
///
/// Saturates at 0, so a signal shorter than one block still has block 0
/// (clipped by [`block_range`]).
pub fn number_of_blocks(samples: usize, bsize: usize, ssize: usize) -> usize {
    samples.saturating_sub(bsize) / ssize.max(1)
}

pub fn block_index_to_center(index: usize, bsize: usize, ssize: usize) -> f64 {
    bsize as f64 / 2.0 + (index * ssize) as f64
}

/// Block whose center is nearest to `sample`.
///
/// Clamped to 0 below and, when the signal length is known, to
/// [`number_of_blocks`] above.
pub fn sample_to_block_index(
    sample: f64,
    bsize: usize,
    ssize: usize,
    samples: Option<usize>,
) -> usize {
    let position = (sample - bsize as f64 / 2.0) / ssize.max(1) as f64;
    // Half-way rounds up.
    let index = (position + 0.5).floor().max(0.0) as usize;
    match samples {
        Some(samples) => index.min(number_of_blocks(samples, bsize, ssize)),
        None => index,
    }
}

pub fn sample_to_block_center(
    sample: f64,
    bsize: usize,
    ssize: usize,
    samples: Option<usize>,
) -> f64 {
    block_index_to_center(
        sample_to_block_index(sample, bsize, ssize, samples),
        bsize,
        ssize,
    )
}

/// Sample range of block `index`, clipped to the signal.
pub fn block_range(index: usize, bsize: usize, ssize: usize, samples: usize) -> Range<usize> {
    let start = (index * ssize).min(samples);
    let end = (start + bsize).min(samples);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_of_blocks_floors() {
        assert_eq!(number_of_blocks(1024, 256, 128), 6);
        assert_eq!(number_of_blocks(1000, 256, 128), 5);
        assert_eq!(number_of_blocks(256, 256, 128), 0);
    }

    #[test]
    fn number_of_blocks_saturates_for_short_signals() {
        assert_eq!(number_of_blocks(100, 256, 128), 0);
        assert_eq!(number_of_blocks(0, 256, 128), 0);
    }

    #[test]
    fn block_centers() {
        assert_eq!(block_index_to_center(0, 256, 128), 128.0);
        assert_eq!(block_index_to_center(3, 256, 128), 512.0);
        assert_eq!(block_index_to_center(1, 5, 2), 4.5);
    }

    #[test]
    fn sample_maps_to_nearest_block() {
        assert_eq!(sample_to_block_index(128.0, 256, 128, None), 0);
        assert_eq!(sample_to_block_index(250.0, 256, 128, None), 1);
        assert_eq!(sample_to_block_index(500.0, 256, 128, None), 3);
        // (192 - 128) / 128 = 0.5 rounds up
        assert_eq!(sample_to_block_index(192.0, 256, 128, None), 1);
    }

    #[test]
    fn sample_before_first_center_clamps_to_zero() {
        assert_eq!(sample_to_block_index(0.0, 256, 128, None), 0);
        assert_eq!(sample_to_block_index(-500.0, 256, 128, Some(1024)), 0);
    }

    #[test]
    fn sample_past_end_clamps_to_last_block() {
        assert_eq!(sample_to_block_index(10_000.0, 256, 128, Some(1024)), 6);
        assert_eq!(sample_to_block_index(10_000.0, 256, 128, None), 77);
    }

    #[test]
    fn sample_to_center_round_trips_through_index() {
        assert_eq!(sample_to_block_center(250.0, 256, 128, None), 256.0);
        assert_eq!(sample_to_block_center(10_000.0, 256, 128, Some(1024)), 896.0);
    }

    #[test]
    fn block_range_is_clipped() {
        assert_eq!(block_range(0, 256, 128, 1024), 0..256);
        assert_eq!(block_range(6, 256, 128, 1024), 768..1024);
        assert_eq!(block_range(0, 256, 128, 100), 0..100);
        assert_eq!(block_range(10, 256, 128, 1024), 1024..1024);
    }

    #[test]
    fn zero_step_does_not_divide_by_zero() {
        assert_eq!(number_of_blocks(1024, 256, 0), 768);
        assert_eq!(sample_to_block_index(300.0, 256, 0, None), 172);
    }
}
