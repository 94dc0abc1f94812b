use crate::window::SeriesWindow;
use rust_decimal::Decimal;
use swingpoint_core::{Bar, CandidateKind, ExtremeCandidate, PriceField};

/// High/low candidate flags of one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateSlot {
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
}

impl CandidateSlot {
    pub fn get(&self, kind: CandidateKind) -> Option<Decimal> {
        match kind {
            CandidateKind::High => self.high,
            CandidateKind::Low => self.low,
        }
    }

    fn get_mut(&mut self, kind: CandidateKind) -> &mut Option<Decimal> {
        match kind {
            CandidateKind::High => &mut self.high,
            CandidateKind::Low => &mut self.low,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_none() && self.low.is_none()
    }
}

/// Last window extreme recorded by the scan, after a given bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ScanMemo {
    last_high: Option<Decimal>,
    last_low: Option<Decimal>,
}

/// Per-bar candidate flags plus the scan memo needed to resume mid-series.
#[derive(Debug, Clone, Default)]
pub struct CandidateBuffer {
    slots: Vec<CandidateSlot>,
    memo: Vec<ScanMemo>,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, position: usize) -> Option<&CandidateSlot> {
        self.slots.get(position)
    }

    pub fn get(&self, position: usize, kind: CandidateKind) -> Option<Decimal> {
        self.slots.get(position).and_then(|s| s.get(kind))
    }

    /// All live candidates in bar order, high before low on the same bar.
    pub fn iter(&self) -> impl Iterator<Item = ExtremeCandidate> + '_ {
        self.slots.iter().enumerate().flat_map(|(position, slot)| {
            [CandidateKind::High, CandidateKind::Low]
                .into_iter()
                .filter_map(move |kind| {
                    slot.get(kind).map(|value| ExtremeCandidate {
                        position,
                        kind,
                        value,
                    })
                })
        })
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.memo.clear();
    }

    /// Drop every entry strictly after `position`.
    pub fn truncate_after(&mut self, position: usize) {
        self.slots.truncate(position + 1);
        self.memo.truncate(position + 1);
    }

    fn resize(&mut self, len: usize) {
        self.slots.resize(len, CandidateSlot::default());
        self.memo.resize(len, ScanMemo::default());
    }
}

/// Flags bars that are local extremes of a `depth`-bar window.
///
/// A candidate is dropped when it repeats the previous window extreme or when
/// the bar has not pulled back within `deviation` increments of it. An
/// accepted candidate erases weaker same-kind candidates in the preceding
/// `backstep` bars, and it is only recorded on the bar where the extreme
/// actually printed.
#[derive(Debug, Clone)]
pub struct ExtremaCandidateScanner {
    depth: usize,
    threshold: Decimal,
    backstep: usize,
}

impl ExtremaCandidateScanner {
    pub fn new(depth: usize, deviation: Decimal, price_increment: Decimal, backstep: usize) -> Self {
        Self {
            depth,
            threshold: deviation * price_increment,
            backstep,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn backstep(&self) -> usize {
        self.backstep
    }

    /// First bar with a full `depth` window behind it.
    pub fn first_index(&self) -> usize {
        self.depth.saturating_sub(1)
    }

    /// Scan `bars[start..]`, overwriting the slots from `start` on.
    ///
    /// The dedupe memo is restored from the bar before `start`, so resuming
    /// here gives the same flags as a scan from the beginning.
    pub fn scan(&self, bars: &[Bar], buffer: &mut CandidateBuffer, start: usize) {
        buffer.resize(bars.len());
        let window = SeriesWindow::new(bars);
        let mut memo = start
            .checked_sub(1)
            .map(|prev| buffer.memo[prev])
            .unwrap_or_default();

        for position in start..bars.len() {
            let low = self.resolve(&window, bars, position, CandidateKind::Low, &mut memo.last_low, &mut buffer.slots);
            buffer.slots[position].low = low;
            let high = self.resolve(&window, bars, position, CandidateKind::High, &mut memo.last_high, &mut buffer.slots);
            buffer.slots[position].high = high;
            buffer.memo[position] = memo;
        }
    }

    fn resolve(
        &self,
        window: &SeriesWindow<'_>,
        bars: &[Bar],
        position: usize,
        kind: CandidateKind,
        last_recorded: &mut Option<Decimal>,
        slots: &mut [CandidateSlot],
    ) -> Option<Decimal> {
        let (field, extreme) = match kind {
            CandidateKind::High => (
                PriceField::High,
                window.highest_of(PriceField::High, self.depth, position),
            ),
            CandidateKind::Low => (
                PriceField::Low,
                window.lowest_of(PriceField::Low, self.depth, position),
            ),
        };
        let candidate = extreme?;

        // Same extreme as last bar: already recorded where it printed
        if *last_recorded == Some(candidate) {
            return None;
        }
        *last_recorded = Some(candidate);

        let price = bars[position].field(field);
        let excursion = match kind {
            CandidateKind::High => candidate - price,
            CandidateKind::Low => price - candidate,
        };
        if excursion > self.threshold {
            return None;
        }

        for back in 1..=self.backstep {
            let Some(earlier) = position.checked_sub(back) else {
                break;
            };
            let entry = slots[earlier].get_mut(kind);
            if let Some(existing) = *entry {
                let weaker = match kind {
                    CandidateKind::High => existing < candidate,
                    CandidateKind::Low => existing > candidate,
                };
                if weaker {
                    *entry = None;
                }
            }
        }

        (price == candidate).then_some(candidate)
    }
}
