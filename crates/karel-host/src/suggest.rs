//! "Did you mean" suggestions for unresolved names.
//!
//! Uses Damerau-Levenshtein distance (optimal string alignment, so a
//! transposed pair of letters counts as one edit — the most common typo
//! learners make). A candidate is only offered when it is close relative
//! to the name's length.

/// Picks the closest candidate to `name`, if any is close enough.
///
/// Ties go to the earliest candidate, so callers control priority by
/// ordering (the capability vocabulary is listed before program-defined
/// names).
#[must_use]
pub fn did_you_mean<S: AsRef<str>>(name: &str, candidates: &[S]) -> Option<String> {
    let threshold = (name.chars().count() * 2 / 5).max(1);
    let mut best: Option<(usize, &str)> = None;
    for candidate in candidates {
        let candidate = candidate.as_ref();
        if candidate == name {
            continue;
        }
        let distance = osa_distance(name, candidate);
        if distance <= threshold && best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, candidate));
        }
    }
    best.map(|(_, candidate)| candidate.to_string())
}

/// Optimal string alignment distance: insert, delete, substitute, and
/// adjacent transposition each cost one.
fn osa_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    // Three rolling rows: two back, one back, current.
    let mut prev2 = vec![0usize; m + 1];
    let mut prev = (0..=m).collect::<Vec<usize>>();
    let mut current = vec![0usize; m + 1];

    for i in 1..=n {
        current[0] = i;
        for j in 1..=m {
            let substitution = usize::from(a[i - 1] != b[j - 1]);
            let mut cost = (prev[j] + 1)
                .min(current[j - 1] + 1)
                .min(prev[j - 1] + substitution);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                cost = cost.min(prev2[j - 2] + 1);
            }
            current[j] = cost;
        }
        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut current);
    }
    prev[m]
}
