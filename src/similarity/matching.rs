use crate::feature::Peak;

/// Greedy one-to-one peak pairing.
///
/// Candidate pairs are all `(query, reference)` peaks with `|Δmz| <= tolerance`.
/// They are taken in order of descending intensity product (ties: smaller m/z
/// error, then lower indices) and a pair is kept only if neither peak has been
/// used. Both inputs must be sorted by ascending m/z.
pub fn match_peaks(query: &[Peak], reference: &[Peak], tolerance: f64) -> Vec<(usize, usize)> {
    let tolerance = tolerance.max(0.0);
    let mut candidates: Vec<(f64, f64, usize, usize)> = Vec::new();

    for (i, q) in query.iter().enumerate() {
        let start = reference.partition_point(|r| r.mz < q.mz - tolerance);
        for (offset, r) in reference[start..].iter().enumerate() {
            if r.mz > q.mz + tolerance {
                break;
            }
            candidates.push((q.intensity * r.intensity, (q.mz - r.mz).abs(), i, start + offset));
        }
    }

    candidates.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then(a.1.total_cmp(&b.1))
            .then(a.2.cmp(&b.2))
            .then(a.3.cmp(&b.3))
    });

    let mut used_query = vec![false; query.len()];
    let mut used_reference = vec![false; reference.len()];
    let mut pairs = Vec::new();
    for (_, _, i, j) in candidates {
        if used_query[i] || used_reference[j] {
            continue;
        }
        used_query[i] = true;
        used_reference[j] = true;
        pairs.push((i, j));
    }
    pairs
}
