use std::ops::Range;

/// Splits `0..width` into `workers` contiguous column ranges
///
/// Range `k` is `width * k / workers .. width * (k + 1) / workers`. The
/// worker count is capped at the width so no range is empty.
pub fn column_ranges(width: u32, workers: usize) -> Vec<Range<u32>> {
    let workers = workers.clamp(1, width.max(1) as usize) as u64;
    let width = u64::from(width);
    (0..workers)
        .map(|k| {
            let start = width * k / workers;
            let end = width * (k + 1) / workers;
            start as u32..end as u32
        })
        .collect()
}

/// Splits a column-major buffer into one disjoint mutable strip per range
///
/// `per_column` is the number of elements one column occupies. Ranges must
/// be contiguous and start at column 0.
pub fn split_columns<'a, T>(
    mut data: &'a mut [T],
    ranges: &[Range<u32>],
    per_column: usize,
) -> Vec<&'a mut [T]> {
    let mut strips = Vec::with_capacity(ranges.len());
    for range in ranges {
        let len = (range.end - range.start) as usize * per_column;
        let (strip, rest) = std::mem::take(&mut data).split_at_mut(len);
        strips.push(strip);
        data = rest;
    }
    strips
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_cover_every_column_once() {
        for width in [1u32, 2, 7, 64, 641] {
            for workers in [1usize, 2, 3, 8, 1000] {
                let ranges = column_ranges(width, workers);
                assert_eq!(ranges.first().map(|r| r.start), Some(0));
                assert_eq!(ranges.last().map(|r| r.end), Some(width));
                for pair in ranges.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                }
                assert!(ranges.iter().all(|r| r.start < r.end));
            }
        }
    }

    #[test]
    fn ranges_are_balanced() {
        let ranges = column_ranges(10, 4);
        assert_eq!(ranges, vec![0..2, 2..5, 5..7, 7..10]);
    }

    #[test]
    fn strips_follow_ranges() {
        let mut data: Vec<u32> = (0..12).collect();
        let ranges = column_ranges(4, 2);
        let strips = split_columns(&mut data, &ranges, 3);
        assert_eq!(strips.len(), 2);
        assert_eq!(&*strips[0], &[0, 1, 2, 3, 4, 5]);
        assert_eq!(&*strips[1], &[6, 7, 8, 9, 10, 11]);
    }
}
