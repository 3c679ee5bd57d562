use std::cmp::Ordering;

/// In-place heapsort, used for transaction ordering when a worst-case
/// bound matters more than the adaptive behavior of the default sort.
pub fn heapsort_by<T, F>(data: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let len = data.len();
    if len < 2 {
        return;
    }
    for start in (0..len / 2).rev() {
        sift_down(data, start, len, &mut compare);
    }
    for end in (1..len).rev() {
        data.swap(0, end);
        sift_down(data, 0, end, &mut compare);
    }
}

fn sift_down<T, F>(data: &mut [T], mut root: usize, end: usize, compare: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return;
        }
        if child + 1 < end && compare(&data[child], &data[child + 1]) == Ordering::Less {
            child += 1;
        }
        if compare(&data[root], &data[child]) != Ordering::Less {
            return;
        }
        data.swap(root, child);
        root = child;
    }
}
