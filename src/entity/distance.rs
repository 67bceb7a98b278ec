/// Edit distance between two strings, counted in characters.
///
/// When one string contains the other the distance is the length
/// difference; otherwise this is plain Levenshtein distance.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a.contains(b) || b.contains(a) {
        return a_len.abs_diff(b_len);
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // Two rolling rows of the DP matrix.
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];
    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let substitution = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}
