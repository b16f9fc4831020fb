use super::model::State;

/// Work space of one Viterbi pass. Created per call, never shared.
#[derive(Debug, Default)]
pub(crate) struct DecodeState {
    /// The total number of distinct labels (L).
    num_labels: usize,

    /// The number of items (T) in the sequence.
    num_items: usize,

    /// Best scores at the current position.
    ///  This is a [L] vector whose element [j] is the score of the best
    ///  path arriving at label #j, or -inf when #j is not reachable.
    score: Vec<f64>,

    /// Scratch row for the position being computed.
    next: Vec<f64>,

    /// Labels reachable at the current position, in ascending order.
    active: Vec<usize>,

    /// Backward edges.
    ///  This is a [T][L] matrix whose element [t][j] represents the label #i
    ///  at t-1 that yields the maximum score to arrive at (t, j). Row 0 is
    ///  unused: every path at t = 0 comes from the start state.
    backward_edge: Vec<usize>,
}

impl DecodeState {
    #[allow(non_snake_case)]
    pub fn new(L: usize, T: usize) -> Self {
        Self {
            num_labels: L,
            num_items: T,
            score: vec![f64::NEG_INFINITY; L],
            next: vec![f64::NEG_INFINITY; L],
            active: Vec::with_capacity(L),
            backward_edge: vec![0; T * L],
        }
    }

    /// Labels reachable after the last call to [`DecodeState::advance`].
    pub fn active(&self) -> &[usize] {
        &self.active
    }

    /// Moves the frontier to position `t`.
    ///
    /// `successors` gives the outgoing edges of a state, or `None` when the
    /// state has none and is to be skipped. `emission` is the [L] row of
    /// emission scores for the word at `t`. Candidates are visited in
    /// ascending source then destination order and only a strictly better
    /// score replaces the current one, so the first maximum wins.
    #[allow(non_snake_case)]
    pub fn advance<'m, F>(&mut self, t: usize, successors: F, emission: &[f64])
    where
        F: Fn(State) -> Option<&'m [(usize, f64)]>,
    {
        let L = self.num_labels;
        debug_assert!(t < self.num_items);
        debug_assert_eq!(emission.len(), L);

        for x in self.next.iter_mut() {
            *x = f64::NEG_INFINITY;
        }

        if t == 0 {
            /* Every path starts at the start state with score 0. */
            if let Some(edges) = successors(State::Start) {
                for &(j, p) in edges {
                    let score = p + emission[j];
                    if self.next[j] < score {
                        self.next[j] = score;
                    }
                }
            }
        } else {
            for &i in &self.active {
                let base = self.score[i];
                if !base.is_finite() {
                    continue;
                }
                let Some(edges) = successors(State::Label(i)) else {
                    continue;
                };
                /* Transit from (t-1, i) to (t, j). */
                for &(j, p) in edges {
                    let score = base + p + emission[j];
                    if self.next[j] < score {
                        self.next[j] = score;
                        /* Backward link (#t, #j) -> (#t-1, #i). */
                        self.backward_edge[L * t + j] = i;
                    }
                }
            }
        }

        std::mem::swap(&mut self.score, &mut self.next);
        self.active.clear();
        self.active
            .extend((0..L).filter(|&j| self.score[j] > f64::NEG_INFINITY));
    }

    /// Writes the best path into `labels` and returns its score, or `None`
    /// when no label is reachable at the last position.
    #[allow(non_snake_case)]
    pub fn backtrack(&self, labels: &mut [usize]) -> Option<f64> {
        let T = self.num_items;
        let L = self.num_labels;
        debug_assert_eq!(labels.len(), T);

        /* Find the label at #T-1 with the maximum score. */
        let mut best: Option<(usize, f64)> = None;
        for &i in &self.active {
            match best {
                Some((_, max_score)) if max_score >= self.score[i] => {}
                _ => best = Some((i, self.score[i])),
            }
        }
        let (last, max_score) = best?;
        labels[T - 1] = last;

        /* Tag labels by tracing the backward links. */
        for t in (0..T - 1).rev() {
            labels[t] = self.backward_edge[L * (t + 1) + labels[t + 1]];
        }
        Some(max_score)
    }
}
