use crate::annotator::ConfirmationAnnotator;
use crate::config::ZigzagConfig;
use crate::recalculator::{IncrementalRecalculator, ReplayPlan};
use crate::scanner::{CandidateBuffer, ExtremaCandidateScanner};
use crate::state_machine::{EngineState, ZigzagStateMachine};
use crate::trimmer::NonRepaintTrimmer;
use rust_decimal::Decimal;
use swingpoint_core::{Bar, CandidateKind, ConfirmationLink, Vertex, ZigzagError};
use tracing::{debug, warn};

/// Zigzag engine for a single bar series.
///
/// Owns the candidate buffer, the vertex sequence and the search state. Each
/// call to [`ZigzagEngine::calculate`] replays only the tail of the series the
/// new bars can affect.
#[derive(Debug, Clone)]
pub struct ZigzagEngine {
    config: ZigzagConfig,
    scanner: ExtremaCandidateScanner,
    machine: ZigzagStateMachine,
    recalculator: IncrementalRecalculator,
    trimmer: NonRepaintTrimmer,
    annotator: ConfirmationAnnotator,
    candidates: CandidateBuffer,
    processed_len: usize,
    visible_len: usize,
    last_replay: Option<ReplayPlan>,
}

impl ZigzagEngine {
    pub fn new(config: ZigzagConfig, price_increment: Decimal) -> Result<Self, ZigzagError> {
        config.validate()?;
        if price_increment <= Decimal::ZERO {
            return Err(ZigzagError::invalid(
                "price_increment",
                format!("must be > 0, got {}", price_increment),
            ));
        }

        let scanner =
            ExtremaCandidateScanner::new(config.depth, config.deviation, price_increment, config.backstep);
        let recalculator = IncrementalRecalculator::new(
            config.recount_depth,
            config.max_lookback,
            config.backstep,
            scanner.first_index(),
        );
        Ok(Self {
            trimmer: NonRepaintTrimmer::new(config.backstep),
            annotator: ConfirmationAnnotator::new(),
            machine: ZigzagStateMachine::new(),
            candidates: CandidateBuffer::new(),
            processed_len: 0,
            visible_len: 0,
            last_replay: None,
            scanner,
            recalculator,
            config,
        })
    }

    pub fn config(&self) -> &ZigzagConfig {
        &self.config
    }

    /// Bring the results up to date with `bars`.
    ///
    /// `changed` is how many trailing bars are new or revised since the last
    /// call; `0` forces a full recomputation. Bars must be strictly increasing
    /// in time; an out-of-order bar rejects the update and leaves the engine
    /// as it was. Fewer than `depth` bars yields no vertices.
    pub fn calculate(&mut self, bars: &[Bar], changed: usize) -> Result<&[Vertex], ZigzagError> {
        let first_changed = self.first_changed(bars.len(), changed);
        check_order(bars, first_changed.unwrap_or(0))?;

        if first_changed.is_none() {
            self.visible_len = 0;
        }
        if bars.len() < self.config.depth {
            self.clear_buffers();
            self.visible_len = 0;
            self.processed_len = bars.len();
            self.last_replay = None;
            return Ok(self.machine.vertices());
        }

        let plan = self
            .recalculator
            .plan(self.machine.vertices(), bars.len(), first_changed);
        if plan.is_full() && first_changed.is_some() {
            warn!(bars = bars.len(), "No settled vertex in the recount window, rescanning from start");
        }

        if let Err(e) = self.replay(bars, plan) {
            warn!(error = %e, "Zigzag replay failed, engine reset");
            self.reset();
            return Err(e);
        }

        debug!(
            bars = bars.len(),
            start = plan.start(),
            full = plan.is_full(),
            vertices = self.machine.vertices().len(),
            visible = self.visible_len,
            "Zigzag updated"
        );
        self.processed_len = bars.len();
        self.last_replay = Some(plan);
        Ok(self.machine.vertices())
    }

    fn replay(&mut self, bars: &[Bar], plan: ReplayPlan) -> Result<(), ZigzagError> {
        let annotate_from = match plan {
            ReplayPlan::Full { start } => {
                self.clear_buffers();
                self.scanner.scan(bars, &mut self.candidates, start);
                self.machine.run(bars, &self.candidates, start)?;
                0
            }
            ReplayPlan::Resume { start, keep, .. } => {
                self.candidates.truncate_after(start);
                self.scanner.scan(bars, &mut self.candidates, start);
                self.machine.rewind(keep);
                self.machine.run(bars, &self.candidates, start + 1)?;
                keep - 1
            }
        };

        if self.config.annotate_confirmations {
            self.annotator
                .annotate(self.machine.vertices_mut(), annotate_from);
        }
        self.refresh_visibility(bars.len(), plan.retained());
        Ok(())
    }

    /// Once shown, a vertex stays shown; only the hidden tail is re-evaluated.
    fn refresh_visibility(&mut self, series_len: usize, retained: usize) {
        let vertices = self.machine.vertices_mut();
        let computed = self.trimmer.visible_len(vertices, series_len);
        let visible = computed
            .max(self.visible_len)
            .min(vertices.len().saturating_sub(1));
        let from = retained.min(self.visible_len).min(visible);
        for (index, vertex) in vertices.iter_mut().enumerate().skip(from) {
            vertex.confirmed = index < visible;
        }
        self.visible_len = visible;
    }

    fn first_changed(&self, len: usize, changed: usize) -> Option<usize> {
        if changed == 0 || changed >= len || self.processed_len == 0 || len < self.processed_len {
            return None;
        }
        Some((len - changed).min(self.processed_len))
    }

    fn clear_buffers(&mut self) {
        self.candidates.clear();
        self.machine.reset();
    }

    /// Forget everything; the next update recomputes from scratch.
    pub fn reset(&mut self) {
        self.clear_buffers();
        self.processed_len = 0;
        self.visible_len = 0;
        self.last_replay = None;
    }

    /// Every vertex, including the provisional tail.
    pub fn vertices(&self) -> &[Vertex] {
        self.machine.vertices()
    }

    /// The vertices a consumer should display.
    pub fn visible(&self) -> &[Vertex] {
        if self.config.non_repaint {
            &self.machine.vertices()[..self.visible_len]
        } else {
            self.machine.vertices()
        }
    }

    /// Number of leading vertices that are final.
    pub fn confirmed_len(&self) -> usize {
        self.visible_len
    }

    pub fn candidates(&self) -> &CandidateBuffer {
        &self.candidates
    }

    pub fn candidate(&self, position: usize, kind: CandidateKind) -> Option<Decimal> {
        self.candidates.get(position, kind)
    }

    pub fn state(&self) -> &EngineState {
        self.machine.state()
    }

    pub fn links(&self) -> Vec<ConfirmationLink> {
        self.annotator.links(self.machine.vertices())
    }

    /// The replay performed by the most recent update.
    pub fn last_replay(&self) -> Option<ReplayPlan> {
        self.last_replay
    }

    pub fn processed_len(&self) -> usize {
        self.processed_len
    }
}

fn check_order(bars: &[Bar], from: usize) -> Result<(), ZigzagError> {
    for position in from.max(1)..bars.len() {
        let previous = bars[position - 1].timestamp;
        let received = bars[position].timestamp;
        if received <= previous {
            return Err(ZigzagError::OutOfOrderBar {
                position,
                previous,
                received,
            });
        }
    }
    Ok(())
}
