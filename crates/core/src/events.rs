use crate::models::*;
use serde::{Deserialize, Serialize};

/// Events published by a zigzag tracker to its observers.
///
/// Only the visible (non-repainting) part of the vertex sequence produces
/// events, so a consumer never has to undo anything it has been told.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VertexEvent {
    /// A vertex became visible for the first time.
    Surfaced(Vertex),
    /// A visible vertex got its confirming opposite-kind vertex.
    Confirmed {
        vertex: Vertex,
        confirming_position: usize,
    },
}

impl VertexEvent {
    pub fn vertex(&self) -> &Vertex {
        match self {
            VertexEvent::Surfaced(v) => v,
            VertexEvent::Confirmed { vertex, .. } => vertex,
        }
    }
}
