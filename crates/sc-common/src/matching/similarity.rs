/// Longest common contiguous block of `a` and `b` as `(start_a, start_b, len)`.
///
/// Ties resolve to the block starting earliest in `a`, then earliest in `b`.
fn longest_match(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let len = prev[j] + 1;
                cur[j + 1] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            } else {
                cur[j + 1] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}

/// Characters covered by the recursive longest-block alignment (Ratcliff/Obershelp).
pub fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, len) = longest_match(&a[alo..ahi], &b[blo..bhi]);
        if len == 0 {
            continue;
        }

        matched += len;
        let (i, j) = (alo + i, blo + j);
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + len < ahi && j + len < bhi {
            pending.push((i + len, ahi, j + len, bhi));
        }
    }

    matched
}

/// `2 * M / (len(a) + len(b))` over characters, 1.0 for two empty strings.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_characters(&a, &b) as f64 / total as f64
}
