use swingpoint_core::Vertex;

/// Decides how much of the vertex sequence is safe to show.
///
/// The last vertex is always hidden, and with fewer than three vertices the
/// second-to-last is hidden as well. A vertex is also held back until its
/// successor was emitted more than `backstep` bars before the series end;
/// until then a new bar could still prune the successor's candidate and
/// reopen the vertex.
#[derive(Debug, Clone, Copy)]
pub struct NonRepaintTrimmer {
    backstep: usize,
}

impl NonRepaintTrimmer {
    pub fn new(backstep: usize) -> Self {
        Self { backstep }
    }

    /// Number of leading vertices that may be shown.
    pub fn visible_len(&self, vertices: &[Vertex], series_len: usize) -> usize {
        if vertices.len() < 3 {
            return 0;
        }
        let mut visible = vertices.len() - 1;
        while visible > 0 && vertices[visible].origin + self.backstep >= series_len {
            visible -= 1;
        }
        visible
    }

    pub fn apply<'a>(&self, vertices: &'a [Vertex], series_len: usize) -> &'a [Vertex] {
        &vertices[..self.visible_len(vertices, series_len)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use swingpoint_core::VertexKind;

    fn zigzag(points: &[(usize, usize)]) -> Vec<Vertex> {
        let ts = Utc::now();
        points
            .iter()
            .enumerate()
            .map(|(i, &(position, origin))| {
                let kind = if i % 2 == 0 { VertexKind::Bottom } else { VertexKind::Peak };
                let mut v = Vertex::new(position, ts, kind, dec!(1));
                v.origin = origin;
                v
            })
            .collect()
    }

    #[test]
    fn test_hides_last_vertex() {
        let trimmer = NonRepaintTrimmer::new(0);
        let vertices = zigzag(&[(2, 2), (5, 5), (8, 8)]);
        assert_eq!(trimmer.visible_len(&vertices, 10), 2);
        assert_eq!(trimmer.apply(&vertices, 10).last().map(|v| v.position), Some(5));
    }

    #[test]
    fn test_hides_two_when_short() {
        let trimmer = NonRepaintTrimmer::new(0);
        assert_eq!(trimmer.visible_len(&zigzag(&[(2, 2), (5, 5)]), 10), 0);
        assert_eq!(trimmer.visible_len(&zigzag(&[(2, 2)]), 10), 0);
        assert_eq!(trimmer.visible_len(&[], 10), 0);
    }

    #[test]
    fn test_waits_for_successor_to_settle() {
        let trimmer = NonRepaintTrimmer::new(3);
        // Successor of the vertex at 5 was emitted at 8, within 3 bars of the end
        let vertices = zigzag(&[(2, 2), (5, 4), (9, 8)]);
        assert_eq!(trimmer.visible_len(&vertices, 11), 1);
        assert_eq!(trimmer.visible_len(&vertices, 12), 2);
    }
}
