use rust_decimal::Decimal;
use swingpoint_core::{Bar, PriceField};

/// Trailing-window extremes over one bar field.
///
/// A window reaching past the start of the series is truncated to the bars
/// that exist.
#[derive(Debug, Clone, Copy)]
pub struct SeriesWindow<'a> {
    bars: &'a [Bar],
}

impl<'a> SeriesWindow<'a> {
    pub fn new(bars: &'a [Bar]) -> Self {
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Highest `field` over the `count` bars ending at `end_index` inclusive.
    pub fn highest_of(&self, field: PriceField, count: usize, end_index: usize) -> Option<Decimal> {
        self.values(field, count, end_index)?.max()
    }

    /// Lowest `field` over the `count` bars ending at `end_index` inclusive.
    pub fn lowest_of(&self, field: PriceField, count: usize, end_index: usize) -> Option<Decimal> {
        self.values(field, count, end_index)?.min()
    }

    fn values(
        &self,
        field: PriceField,
        count: usize,
        end_index: usize,
    ) -> Option<impl Iterator<Item = Decimal> + 'a> {
        if count == 0 || end_index >= self.bars.len() {
            return None;
        }
        let begin = (end_index + 1).saturating_sub(count);
        Some(self.bars[begin..=end_index].iter().map(move |b| b.field(field)))
    }
}
