use std::collections::BTreeMap;

use tracing::info;

use crate::simulation::engine::Cause;

/// Counts gathered over one evolution pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvolutionStatistics {
    pub land_tiles: usize,
    /// Tiles changed by their own rules (or the crop-water check).
    pub evolved: usize,
    /// Neighbors converted by spreading.
    pub spread: usize,
    pub by_cause: BTreeMap<Cause, usize>,
    pub duration_ms: f32,
}

impl EvolutionStatistics {
    pub fn new(land_tiles: usize) -> Self {
        Self {
            land_tiles,
            ..Self::default()
        }
    }

    pub fn record_evolved(&mut self, cause: Cause) {
        self.evolved += 1;
        *self.by_cause.entry(cause).or_insert(0) += 1;
    }

    pub fn record_spread(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.spread += count;
        *self.by_cause.entry(Cause::Spread).or_insert(0) += count;
    }

    /// Total diff records written.
    pub fn changed(&self) -> usize {
        self.evolved + self.spread
    }

    pub fn log_summary(&self) {
        let causes = self
            .by_cause
            .iter()
            .map(|(cause, n)| format!("{}={}", cause, n))
            .collect::<Vec<_>>()
            .join(" ");
        info!(
            land_tiles = self.land_tiles,
            evolved = self.evolved,
            spread = self.spread,
            changed = self.changed(),
            duration_ms = self.duration_ms,
            causes = %causes,
            "Evolution pass complete"
        );
    }
}
