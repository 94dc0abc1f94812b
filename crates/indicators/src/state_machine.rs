use crate::scanner::{CandidateBuffer, CandidateSlot};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use swingpoint_core::{Bar, Vertex, VertexKind, ZigzagError};
use tracing::trace;

/// What the state machine is waiting for next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SearchMode {
    /// No vertex yet.
    #[default]
    SeekFirst,
    /// Last vertex is a bottom.
    SeekPeak,
    /// Last vertex is a peak.
    SeekBottom,
}

impl SearchMode {
    /// The mode that follows a vertex of the given kind.
    pub fn following(kind: VertexKind) -> Self {
        match kind {
            VertexKind::Peak => SearchMode::SeekBottom,
            VertexKind::Bottom => SearchMode::SeekPeak,
        }
    }
}

/// Mutable search state of the zigzag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineState {
    pub search_mode: SearchMode,
    pub last_high: Option<Decimal>,
    pub last_high_pos: Option<usize>,
    pub last_low: Option<Decimal>,
    pub last_low_pos: Option<usize>,
}

impl EngineState {
    /// Rebuild the state as it stood right after the last of `vertices`.
    pub fn resume_from(vertices: &[Vertex]) -> Self {
        let mut state = Self::default();
        for vertex in vertices.iter().rev().take(2).rev() {
            state.record(vertex);
        }
        state
    }

    fn record(&mut self, vertex: &Vertex) {
        match vertex.kind {
            VertexKind::Peak => {
                self.last_high = Some(vertex.value);
                self.last_high_pos = Some(vertex.position);
            }
            VertexKind::Bottom => {
                self.last_low = Some(vertex.value);
                self.last_low_pos = Some(vertex.position);
            }
        }
        self.search_mode = SearchMode::following(vertex.kind);
    }
}

/// Ordered vertex sequence whose last slot can be replaced in place.
///
/// Every mutation checks that kinds alternate and positions strictly increase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexList {
    items: Vec<Vertex>,
}

impl VertexList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[Vertex] {
        &self.items
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Vertex] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last(&self) -> Option<&Vertex> {
        self.items.last()
    }

    pub fn push(&mut self, vertex: Vertex) -> Result<(), ZigzagError> {
        if let Some(last) = self.items.last() {
            if last.kind == vertex.kind {
                return Err(ZigzagError::InvariantViolation(format!(
                    "{:?} at {} would follow {:?} at {}",
                    vertex.kind, vertex.position, last.kind, last.position
                )));
            }
            if vertex.position <= last.position {
                return Err(ZigzagError::InvariantViolation(format!(
                    "vertex at {} does not follow vertex at {}",
                    vertex.position, last.position
                )));
            }
        }
        self.items.push(vertex);
        Ok(())
    }

    /// Move the open vertex to a better bar. The slot keeps its origin.
    pub fn replace_last(&mut self, mut vertex: Vertex) -> Result<(), ZigzagError> {
        let Some(last) = self.items.last_mut() else {
            return Err(ZigzagError::InvariantViolation(
                "retraction with no open vertex".to_string(),
            ));
        };
        if last.kind != vertex.kind {
            return Err(ZigzagError::InvariantViolation(format!(
                "cannot retract {:?} at {} into {:?}",
                last.kind, last.position, vertex.kind
            )));
        }
        if vertex.position <= last.position {
            return Err(ZigzagError::InvariantViolation(format!(
                "retraction from {} to {} does not move forward",
                last.position, vertex.position
            )));
        }
        vertex.origin = last.origin;
        *last = vertex;
        Ok(())
    }

    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Alternating peak/bottom state machine over the candidate flags.
///
/// In `SeekFirst` a high candidate wins over a low candidate on the same bar.
/// Otherwise, when a bar carries both flags, improving the open vertex takes
/// precedence over emitting the opposite kind, and at most one of the two
/// happens per bar.
#[derive(Debug, Clone, Default)]
pub struct ZigzagStateMachine {
    state: EngineState,
    vertices: VertexList,
}

impl ZigzagStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn vertices(&self) -> &[Vertex] {
        self.vertices.as_slice()
    }

    pub(crate) fn vertices_mut(&mut self) -> &mut [Vertex] {
        self.vertices.as_mut_slice()
    }

    pub fn reset(&mut self) {
        self.state = EngineState::default();
        self.vertices.clear();
    }

    /// Keep the first `keep` vertices and continue from the last kept one.
    pub fn rewind(&mut self, keep: usize) {
        self.vertices.truncate(keep);
        self.state = EngineState::resume_from(self.vertices.as_slice());
    }

    /// Feed bars `from..` through the machine.
    pub fn run(
        &mut self,
        bars: &[Bar],
        candidates: &CandidateBuffer,
        from: usize,
    ) -> Result<(), ZigzagError> {
        for (position, bar) in bars.iter().enumerate().skip(from) {
            let slot = candidates.slot(position).copied().unwrap_or_default();
            if !slot.is_empty() {
                self.step(position, bar.timestamp, slot)?;
            }
        }
        Ok(())
    }

    fn step(
        &mut self,
        position: usize,
        timestamp: DateTime<Utc>,
        slot: CandidateSlot,
    ) -> Result<(), ZigzagError> {
        match self.state.search_mode {
            SearchMode::SeekFirst => {
                if let Some(high) = slot.high {
                    self.emit(Vertex::new(position, timestamp, VertexKind::Peak, high))?;
                } else if let Some(low) = slot.low {
                    self.emit(Vertex::new(position, timestamp, VertexKind::Bottom, low))?;
                }
            }
            SearchMode::SeekPeak => {
                if let Some(low) = slot.low {
                    if self.state.last_low.is_some_and(|last| low < last) {
                        return self.retract(Vertex::new(position, timestamp, VertexKind::Bottom, low));
                    }
                }
                if let Some(high) = slot.high {
                    self.emit(Vertex::new(position, timestamp, VertexKind::Peak, high))?;
                }
            }
            SearchMode::SeekBottom => {
                if let Some(high) = slot.high {
                    if self.state.last_high.is_some_and(|last| high > last) {
                        return self.retract(Vertex::new(position, timestamp, VertexKind::Peak, high));
                    }
                }
                if let Some(low) = slot.low {
                    self.emit(Vertex::new(position, timestamp, VertexKind::Bottom, low))?;
                }
            }
        }
        Ok(())
    }

    fn emit(&mut self, vertex: Vertex) -> Result<(), ZigzagError> {
        trace!(position = vertex.position, kind = ?vertex.kind, value = %vertex.value, "Vertex emitted");
        self.state.record(&vertex);
        self.vertices.push(vertex)
    }

    fn retract(&mut self, vertex: Vertex) -> Result<(), ZigzagError> {
        trace!(position = vertex.position, kind = ?vertex.kind, value = %vertex.value, "Vertex retracted");
        self.state.record(&vertex);
        self.vertices.replace_last(vertex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::ExtremaCandidateScanner;
    use crate::test_support::bars_from_closes;
    use rust_decimal_macros::dec;

    fn run_full(depth: usize, backstep: usize, closes: &[Decimal]) -> ZigzagStateMachine {
        let bars = bars_from_closes(closes);
        let scanner = ExtremaCandidateScanner::new(depth, dec!(0), dec!(0.01), backstep);
        let mut buffer = CandidateBuffer::new();
        scanner.scan(&bars, &mut buffer, scanner.first_index());
        let mut machine = ZigzagStateMachine::new();
        machine.run(&bars, &buffer, scanner.first_index()).unwrap();
        machine
    }

    #[test]
    fn test_alternating_vertices() {
        let closes = [1, 2, 3, 2, 1, 2, 3, 4, 3, 2].map(Decimal::from);
        let machine = run_full(1, 0, &closes);
        let points: Vec<_> = machine
            .vertices()
            .iter()
            .map(|v| (v.position, v.kind, v.value))
            .collect();
        assert_eq!(
            points,
            vec![
                (2, VertexKind::Peak, dec!(3)),
                (4, VertexKind::Bottom, dec!(1)),
                (7, VertexKind::Peak, dec!(4)),
                (9, VertexKind::Bottom, dec!(2)),
            ]
        );
        assert_eq!(machine.state().search_mode, SearchMode::SeekPeak);
        assert_eq!(machine.state().last_low, Some(dec!(2)));
    }

    #[test]
    fn test_retraction_keeps_origin() {
        let closes = [1, 2, 3, 2, 1].map(Decimal::from);
        let machine = run_full(1, 0, &closes);
        let last = machine.vertices().last().unwrap();
        assert_eq!(last.kind, VertexKind::Bottom);
        assert_eq!(last.position, 4);
        assert_eq!(last.origin, 3);
        assert_eq!(machine.vertices()[0].origin, 0);
    }

    #[test]
    fn test_rewind_restores_mode() {
        let closes = [1, 2, 3, 2, 1, 2, 3, 4, 3, 2].map(Decimal::from);
        let mut machine = run_full(1, 0, &closes);
        machine.rewind(1);
        assert_eq!(machine.vertices().len(), 1);
        assert_eq!(machine.state().search_mode, SearchMode::SeekBottom);
        assert_eq!(machine.state().last_high, Some(dec!(3)));
        assert_eq!(machine.state().last_high_pos, Some(2));
    }

    #[test]
    fn test_vertex_list_rejects_same_kind() {
        let mut list = VertexList::new();
        let ts = Utc::now();
        list.push(Vertex::new(1, ts, VertexKind::Peak, dec!(5))).unwrap();
        let err = list.push(Vertex::new(2, ts, VertexKind::Peak, dec!(6))).unwrap_err();
        assert!(matches!(err, ZigzagError::InvariantViolation(_)));
        assert!(list.push(Vertex::new(1, ts, VertexKind::Bottom, dec!(4))).is_err());
        assert!(list.replace_last(Vertex::new(0, ts, VertexKind::Peak, dec!(6))).is_err());
        assert!(list.replace_last(Vertex::new(3, ts, VertexKind::Peak, dec!(6))).is_ok());
        assert_eq!(list.last().map(|v| (v.position, v.origin)), Some((3, 1)));
    }
}
