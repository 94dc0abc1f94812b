use crate::config::ZigzagConfig;
use crate::engine::ZigzagEngine;
use crate::BarIndicator;
use swingpoint_core::*;
use tracing::{info, warn};

/// A zigzag engine bound to one instrument and timeframe.
///
/// Owns the append-only bar series, feeds it to the engine and publishes
/// [`VertexEvent`]s for the final part of the sequence to subscribed
/// observers. `Surfaced` fires when a vertex becomes final; `Confirmed` fires
/// once the confirming vertex is final as well, so its position will not move.
pub struct ZigzagTracker {
    instrument: Instrument,
    timeframe: Timeframe,
    bars: Vec<Bar>,
    engine: ZigzagEngine,
    observers: Vec<Box<dyn VertexObserver>>,
    surfaced: usize,
}

impl std::fmt::Debug for ZigzagTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZigzagTracker")
            .field("instrument", &self.instrument)
            .field("timeframe", &self.timeframe)
            .field("bars", &self.bars.len())
            .field("engine", &self.engine)
            .field("observers", &self.observers.len())
            .field("surfaced", &self.surfaced)
            .finish()
    }
}

impl ZigzagTracker {
    pub fn new(
        instrument: Instrument,
        timeframe: Timeframe,
        config: ZigzagConfig,
    ) -> Result<Self, ZigzagError> {
        let engine = ZigzagEngine::new(config, instrument.tick_size)?;
        info!(
            instrument = %instrument.symbol,
            timeframe = %timeframe,
            depth = engine.config().depth,
            deviation = %engine.config().deviation,
            backstep = engine.config().backstep,
            "Zigzag tracker created"
        );
        Ok(Self {
            instrument,
            timeframe,
            bars: Vec::new(),
            engine,
            observers: Vec::new(),
            surfaced: 0,
        })
    }

    pub fn subscribe(&mut self, observer: impl VertexObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Append one closed bar and return the events it produced.
    pub fn on_bar(&mut self, bar: Bar) -> Result<Vec<VertexEvent>, ZigzagError> {
        self.extend(vec![bar])
    }

    /// Append a batch of closed bars. The batch is rejected as a whole if any
    /// bar is out of order.
    pub fn extend(&mut self, bars: Vec<Bar>) -> Result<Vec<VertexEvent>, ZigzagError> {
        if bars.is_empty() {
            return Ok(Vec::new());
        }
        let base = self.bars.len();
        let mut previous = self.bars.last().map(|b| b.timestamp);
        for (offset, bar) in bars.iter().enumerate() {
            if let Some(prev) = previous {
                if bar.timestamp <= prev {
                    warn!(
                        instrument = %self.instrument.symbol,
                        position = base + offset,
                        "Rejected out-of-order bar"
                    );
                    return Err(ZigzagError::OutOfOrderBar {
                        position: base + offset,
                        previous: prev,
                        received: bar.timestamp,
                    });
                }
            }
            previous = Some(bar.timestamp);
        }

        let added = bars.len();
        self.bars.extend(bars);
        if let Err(e) = self.engine.calculate(&self.bars, added) {
            self.bars.truncate(base);
            return Err(e);
        }
        Ok(self.publish())
    }

    fn publish(&mut self) -> Vec<VertexEvent> {
        let vertices = self.engine.vertices();
        let confirmed = self.engine.confirmed_len();
        let annotate = self.engine.config().annotate_confirmations;

        let mut events = Vec::new();
        for index in self.surfaced..confirmed {
            if let Some(prev) = index.checked_sub(1) {
                if let (true, Some(confirming_position)) = (annotate, vertices[prev].confirming_position) {
                    events.push(VertexEvent::Confirmed {
                        vertex: vertices[prev].clone(),
                        confirming_position,
                    });
                }
            }
            events.push(VertexEvent::Surfaced(vertices[index].clone()));
        }
        self.surfaced = self.surfaced.max(confirmed);

        for event in &events {
            for observer in self.observers.iter_mut() {
                observer.on_vertex_event(event);
            }
        }
        events
    }

    /// Drop all bars and results. Observers stay subscribed.
    pub fn clear(&mut self) {
        self.bars.clear();
        self.engine.reset();
        self.surfaced = 0;
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn engine(&self) -> &ZigzagEngine {
        &self.engine
    }

    pub fn vertices(&self) -> &[Vertex] {
        self.engine.vertices()
    }

    pub fn visible(&self) -> &[Vertex] {
        self.engine.visible()
    }
}

impl BarIndicator for ZigzagTracker {
    type Output = Vec<VertexEvent>;

    fn next_bar(&mut self, bar: Bar) -> Result<Self::Output, ZigzagError> {
        self.on_bar(bar)
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn period(&self) -> usize {
        self.engine.config().depth
    }

    fn is_ready(&self) -> bool {
        self.bars.len() >= self.period()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bars_from_closes;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    fn tracker() -> ZigzagTracker {
        let config = ZigzagConfig {
            depth: 1,
            deviation: dec!(0),
            backstep: 0,
            ..ZigzagConfig::classic()
        };
        ZigzagTracker::new(Instrument::new("ES", dec!(0.25)), Timeframe::Minute(5), config).unwrap()
    }

    #[test]
    fn test_events_follow_confirmation() {
        let closes = [1, 2, 3, 2, 1, 2, 3, 4, 3, 2].map(Decimal::from);
        let mut tracker = tracker();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        tracker.subscribe(move |e: &VertexEvent| sink.lock().unwrap().push(e.clone()));

        let mut returned = Vec::new();
        for bar in bars_from_closes(&closes) {
            returned.extend(tracker.next_bar(bar).unwrap());
        }

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen, returned);
        let summary: Vec<_> = seen
            .iter()
            .map(|e| match e {
                VertexEvent::Surfaced(v) => ("surfaced", v.position, None),
                VertexEvent::Confirmed {
                    vertex,
                    confirming_position,
                } => ("confirmed", vertex.position, Some(*confirming_position)),
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("surfaced", 2, None),
                ("confirmed", 2, Some(4)),
                ("surfaced", 4, None),
                ("confirmed", 4, Some(7)),
                ("surfaced", 7, None),
            ]
        );
    }

    #[test]
    fn test_rejects_out_of_order_batch() {
        let mut tracker = tracker();
        let bars = bars_from_closes(&[dec!(1), dec!(2), dec!(3)]);
        tracker.extend(bars[..2].to_vec()).unwrap();

        let err = tracker.extend(vec![bars[2].clone(), bars[1].clone()]).unwrap_err();
        assert!(matches!(err, ZigzagError::OutOfOrderBar { position: 3, .. }));
        assert_eq!(tracker.bars().len(), 2);
    }

    #[test]
    fn test_reset_clears_series() {
        let mut tracker = tracker();
        for bar in bars_from_closes(&[dec!(1), dec!(2), dec!(1)]) {
            tracker.on_bar(bar).unwrap();
        }
        assert!(tracker.is_ready());
        assert!(!tracker.vertices().is_empty());
        tracker.reset();
        assert!(tracker.bars().is_empty());
        assert!(tracker.vertices().is_empty());
        assert_eq!(tracker.period(), 1);
    }
}
