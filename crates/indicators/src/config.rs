use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use swingpoint_core::ZigzagError;

/// Parameters of a zigzag engine.
///
/// Missing keys fall back to the classic 12/5/3 setup when loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZigzagConfig {
    /// Lookback window (bars) used to decide local extremity. Must be >= 1.
    pub depth: usize,
    /// Minimum excursion, in price increments, for a candidate to be accepted.
    pub deviation: Decimal,
    /// Bars over which weaker same-kind candidates are pruned.
    pub backstep: usize,
    /// How many recent vertices an incremental update rewinds past.
    pub recount_depth: usize,
    /// Maximum number of trailing bars searched for the rewind point.
    pub max_lookback: usize,
    /// Hide the unconfirmed tail from the visible view.
    pub non_repaint: bool,
    /// Link each vertex to the opposite-kind vertex that confirms it.
    pub annotate_confirmations: bool,
}

impl Default for ZigzagConfig {
    fn default() -> Self {
        Self::classic()
    }
}

impl ZigzagConfig {
    /// The usual 12/5/3 zigzag.
    pub fn classic() -> Self {
        Self {
            depth: 12,
            deviation: dec!(5),
            backstep: 3,
            recount_depth: 3,
            max_lookback: 100,
            non_repaint: true,
            annotate_confirmations: true,
        }
    }

    /// A tighter setup for lower timeframes.
    pub fn fast() -> Self {
        Self {
            depth: 5,
            deviation: dec!(3),
            backstep: 2,
            ..Self::classic()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ZigzagError> {
        let config: Self = toml::from_str(s).map_err(|e| ZigzagError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ZigzagError> {
        if self.depth < 1 {
            return Err(ZigzagError::invalid("depth", "must be >= 1"));
        }
        if self.deviation < Decimal::ZERO {
            return Err(ZigzagError::invalid(
                "deviation",
                format!("must be >= 0, got {}", self.deviation),
            ));
        }
        if self.recount_depth < 1 {
            return Err(ZigzagError::invalid("recount_depth", "must be >= 1"));
        }
        if self.max_lookback < 1 {
            return Err(ZigzagError::invalid("max_lookback", "must be >= 1"));
        }
        Ok(())
    }
}
