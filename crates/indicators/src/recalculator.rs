use crate::state_machine::SearchMode;
use swingpoint_core::Vertex;

/// Where an update starts replaying the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPlan {
    /// Clear everything and scan from the first bar with a full window.
    Full { start: usize },
    /// Keep the first `keep` vertices; rescan from `start`, the position of
    /// the last kept vertex, and resume the state machine in `mode`.
    Resume {
        start: usize,
        keep: usize,
        mode: SearchMode,
    },
}

impl ReplayPlan {
    pub fn start(&self) -> usize {
        match self {
            ReplayPlan::Full { start } | ReplayPlan::Resume { start, .. } => *start,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, ReplayPlan::Full { .. })
    }

    /// Number of vertices carried over unchanged.
    pub fn retained(&self) -> usize {
        match self {
            ReplayPlan::Full { .. } => 0,
            ReplayPlan::Resume { keep, .. } => *keep,
        }
    }
}

/// Picks the replay start for an update.
///
/// Walks back to the `recount_depth`-th most recent vertex, within the last
/// `max_lookback` bars. The restart vertex must be followed by a vertex that
/// was emitted before `first_changed - backstep`: candidates older than that
/// cannot be pruned by the new bars, so everything up to the restart vertex is
/// final. If the walk finds no such vertex the update rescans everything.
#[derive(Debug, Clone, Copy)]
pub struct IncrementalRecalculator {
    recount_depth: usize,
    max_lookback: usize,
    backstep: usize,
    first_index: usize,
}

impl IncrementalRecalculator {
    pub fn new(recount_depth: usize, max_lookback: usize, backstep: usize, first_index: usize) -> Self {
        Self {
            recount_depth,
            max_lookback,
            backstep,
            first_index,
        }
    }

    pub fn full(&self) -> ReplayPlan {
        ReplayPlan::Full {
            start: self.first_index,
        }
    }

    /// `first_changed` is the index of the first new or revised bar, or `None`
    /// when the previous results cannot be reused at all.
    pub fn plan(&self, vertices: &[Vertex], len: usize, first_changed: Option<usize>) -> ReplayPlan {
        let Some(first_changed) = first_changed else {
            return self.full();
        };
        let horizon = first_changed.saturating_sub(self.backstep);
        let floor = len.saturating_sub(self.max_lookback);

        let mut counted = 0;
        for index in (0..vertices.len()).rev() {
            let vertex = &vertices[index];
            if vertex.position < floor {
                break;
            }
            counted += 1;
            if counted < self.recount_depth {
                continue;
            }
            let settled = vertices
                .get(index + 1)
                .is_some_and(|next| next.origin < horizon);
            if settled {
                return ReplayPlan::Resume {
                    start: vertex.position,
                    keep: index + 1,
                    mode: SearchMode::following(vertex.kind),
                };
            }
        }
        self.full()
    }
}
