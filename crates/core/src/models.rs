use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Instrument
// ---------------------------------------------------------------------------

/// Describes the instrument a bar series belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    /// Minimum price movement (e.g. 0.25 for ES futures, 0.00001 for EURUSD).
    pub tick_size: Decimal,
}

impl Instrument {
    pub fn new(symbol: &str, tick_size: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            tick_size,
        }
    }
}

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// A single closed OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    /// Read one field of the bar.
    pub fn field(&self, field: PriceField) -> Decimal {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume,
        }
    }
}

/// Selects which bar field a window query runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

/// Timeframe for bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Second(u32),
    Minute(u32),
    Hour(u32),
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeframe::Second(n) => write!(f, "S{}", n),
            Timeframe::Minute(n) => write!(f, "M{}", n),
            Timeframe::Hour(n) => write!(f, "H{}", n),
            Timeframe::Daily => write!(f, "D1"),
            Timeframe::Weekly => write!(f, "W1"),
            Timeframe::Monthly => write!(f, "MN1"),
        }
    }
}

// ---------------------------------------------------------------------------
// Extreme candidates
// ---------------------------------------------------------------------------

/// Which side of the range a per-bar candidate marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    High,
    Low,
}

/// A bar flagged as a local extreme by the candidate scan.
///
/// Candidates inside the `backstep` neighborhood of the series end may still
/// be erased by later bars; older ones are frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtremeCandidate {
    pub position: usize,
    pub kind: CandidateKind,
    pub value: Decimal,
}

// ---------------------------------------------------------------------------
// Vertices
// ---------------------------------------------------------------------------

/// Kind of a zigzag vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexKind {
    Peak,
    Bottom,
}

impl VertexKind {
    pub fn opposite(&self) -> Self {
        match self {
            VertexKind::Peak => VertexKind::Bottom,
            VertexKind::Bottom => VertexKind::Peak,
        }
    }

    /// The candidate kind a vertex of this kind is built from.
    pub fn candidate_kind(&self) -> CandidateKind {
        match self {
            VertexKind::Peak => CandidateKind::High,
            VertexKind::Bottom => CandidateKind::Low,
        }
    }
}

/// A zigzag point: an alternating local high (peak) or low (bottom).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    /// Bar index in the series.
    pub position: usize,
    pub timestamp: DateTime<Utc>,
    pub kind: VertexKind,
    pub value: Decimal,
    /// Bar index where this vertex slot was first emitted. Retractions move
    /// `position` forward but keep the origin.
    pub origin: usize,
    /// Set once the vertex has passed the non-repaint trimmer and is final.
    pub confirmed: bool,
    /// Position of the first following vertex of the opposite kind.
    pub confirming_position: Option<usize>,
}

impl Vertex {
    pub fn new(position: usize, timestamp: DateTime<Utc>, kind: VertexKind, value: Decimal) -> Self {
        Self {
            position,
            timestamp,
            kind,
            value,
            origin: position,
            confirmed: false,
            confirming_position: None,
        }
    }

    /// Whether two vertices describe the same point, ignoring annotations.
    pub fn same_point(&self, other: &Vertex) -> bool {
        self.position == other.position && self.kind == other.kind && self.value == other.value
    }
}

/// Maps a vertex to the opposite-kind vertex that confirmed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfirmationLink {
    pub vertex_position: usize,
    pub confirmed_by: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bar_field_selection() {
        let bar = Bar {
            instrument: "EURUSD".to_string(),
            timestamp: Utc::now(),
            open: dec!(1.1000),
            high: dec!(1.1050),
            low: dec!(1.0950),
            close: dec!(1.1020),
            volume: dec!(1500),
        };
        assert_eq!(bar.field(PriceField::High), dec!(1.1050));
        assert_eq!(bar.field(PriceField::Low), dec!(1.0950));
        assert_eq!(bar.field(PriceField::Volume), dec!(1500));
    }

    #[test]
    fn test_vertex_kind_opposite() {
        assert_eq!(VertexKind::Peak.opposite(), VertexKind::Bottom);
        assert_eq!(VertexKind::Bottom.opposite(), VertexKind::Peak);
        assert_eq!(VertexKind::Peak.candidate_kind(), CandidateKind::High);
    }

    #[test]
    fn test_vertex_serializes_snake_case_kind() {
        let vertex = Vertex::new(4, Utc::now(), VertexKind::Bottom, dec!(1.25));
        let json = serde_json::to_value(&vertex).unwrap();
        assert_eq!(json["kind"], "bottom");
        assert_eq!(json["position"], 4);
        assert_eq!(json["confirming_position"], serde_json::Value::Null);
    }

    #[test]
    fn test_timeframe_display() {
        assert_eq!(Timeframe::Minute(15).to_string(), "M15");
        assert_eq!(Timeframe::Daily.to_string(), "D1");
    }
}
