use swingpoint_core::{ConfirmationLink, Vertex};

/// Links every vertex to the first later vertex of the opposite kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmationAnnotator;

impl ConfirmationAnnotator {
    pub fn new() -> Self {
        Self
    }

    /// Recompute the links of `vertices[from..]`. Earlier links only depend on
    /// vertices before `from` and are left alone.
    pub fn annotate(&self, vertices: &mut [Vertex], from: usize) {
        for index in from..vertices.len() {
            let wanted = vertices[index].kind.opposite();
            let link = vertices[index + 1..]
                .iter()
                .find(|v| v.kind == wanted)
                .map(|v| v.position);
            vertices[index].confirming_position = link;
        }
    }

    pub fn links(&self, vertices: &[Vertex]) -> Vec<ConfirmationLink> {
        vertices
            .iter()
            .map(|v| ConfirmationLink {
                vertex_position: v.position,
                confirmed_by: v.confirming_position,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use swingpoint_core::VertexKind;

    #[test]
    fn test_links_next_opposite() {
        let ts = Utc::now();
        let mut vertices = vec![
            Vertex::new(2, ts, VertexKind::Peak, dec!(3)),
            Vertex::new(4, ts, VertexKind::Bottom, dec!(1)),
            Vertex::new(7, ts, VertexKind::Peak, dec!(4)),
        ];
        let annotator = ConfirmationAnnotator::new();
        annotator.annotate(&mut vertices, 0);
        let links = annotator.links(&vertices);
        assert_eq!(links[0].confirmed_by, Some(4));
        assert_eq!(links[1].confirmed_by, Some(7));
        assert_eq!(links[2].confirmed_by, None);

        // Appending resolves the open link once the suffix is recomputed
        vertices.push(Vertex::new(9, ts, VertexKind::Bottom, dec!(2)));
        annotator.annotate(&mut vertices, 2);
        assert_eq!(vertices[2].confirming_position, Some(9));
        assert_eq!(vertices[0].confirming_position, Some(4));
    }
}
