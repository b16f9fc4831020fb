use hmmtag::{Dataset, Sequence};

const GRAMMAR: &[(&str, &[&str])] = &[
    ("DET", &["the", "a", "this", "every"]),
    ("ADJ", &["big", "small", "red", "quick", "lazy"]),
    ("N", &["dog", "cat", "fox", "house", "river", "tree"]),
    ("V", &["runs", "sees", "jumps", "eats", "likes"]),
    ("ADV", &["fast", "slowly", "often", "here"]),
];

/// Deterministic synthetic corpus of `n` sentences.
pub fn corpus(n: usize) -> Dataset {
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move |m: usize| {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (seed >> 33) as usize % m
    };
    (0..n)
        .map(|_| {
            let mut seq = Sequence::default();
            for _ in 0..1 + next(4) {
                for &k in &[0, 1, 2, 3, 4] {
                    // ADJ and ADV are optional.
                    if (k == 1 || k == 4) && next(2) == 0 {
                        continue;
                    }
                    let (tag, words) = GRAMMAR[k];
                    seq.push(tag, words[next(words.len())]);
                }
            }
            seq
        })
        .collect()
}
