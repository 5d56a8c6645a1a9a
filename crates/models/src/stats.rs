/// Median of `values`, sorting them in place. Even counts average the two
/// middle values. `None` when empty.
pub(crate) fn median_in_place(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let center = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[center])
    } else {
        Some((values[center - 1] + values[center]) / 2.0)
    }
}

/// Writes one entry per observed timestamp into `expected`.
pub(crate) fn fill_expected(
    expected: &mut common::DataSequence,
    observed: &common::DataSequence,
    values: impl IntoIterator<Item = f64>,
) {
    expected.clear();
    for (entry, v) in observed.iter().zip(values) {
        expected.push(common::Entry::new(entry.time(), v as f32));
    }
}
