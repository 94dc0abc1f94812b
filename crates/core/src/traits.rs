use crate::events::*;
use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the zigzag engine and its configuration layer.
///
/// A series shorter than `depth` is not an error; it simply yields no vertices.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ZigzagError {
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Out-of-order bar at position {position}: {received} does not follow {previous}")]
    OutOfOrderBar {
        position: usize,
        previous: DateTime<Utc>,
        received: DateTime<Utc>,
    },
    #[error("Vertex invariant violated: {0}")]
    InvariantViolation(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl ZigzagError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ZigzagError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Observer Trait
// ---------------------------------------------------------------------------

/// Receives vertex events from a tracker (rendering, alerting, logging...).
///
/// Called synchronously from inside the update; implementations must not
/// block for long.
pub trait VertexObserver: Send {
    fn on_vertex_event(&mut self, event: &VertexEvent);
}

impl<F> VertexObserver for F
where
    F: FnMut(&VertexEvent) + Send,
{
    fn on_vertex_event(&mut self, event: &VertexEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |e: &VertexEvent| seen.push(e.vertex().position);
            let vertex = Vertex::new(7, Utc::now(), VertexKind::Peak, dec!(10));
            observer.on_vertex_event(&VertexEvent::Surfaced(vertex));
        }
        assert_eq!(seen, vec![7]);
    }

    #[test]
    fn test_error_messages() {
        let err = ZigzagError::invalid("depth", "must be >= 1");
        assert_eq!(err.to_string(), "Invalid parameter `depth`: must be >= 1");
    }
}
