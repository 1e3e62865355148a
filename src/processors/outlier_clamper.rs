use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::models::{AcceptableRange, MeasurementField, RangeTable, WorkingTable};

/// Out-of-range values found for one variable
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OutlierCount {
    pub below: usize,
    pub above: usize,
}

impl OutlierCount {
    pub fn total(&self) -> usize {
        self.below + self.above
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClampSummary {
    pub clamped: BTreeMap<MeasurementField, OutlierCount>,
}

impl ClampSummary {
    pub fn total(&self) -> usize {
        self.clamped.values().map(OutlierCount::total).sum()
    }
}

/// Replaces values outside a variable's acceptable range with the nearest bound
pub struct OutlierClamper {
    ranges: RangeTable,
}

impl OutlierClamper {
    pub fn new(ranges: RangeTable) -> Self {
        Self { ranges }
    }

    /// Clamp every ranged column in place. Row count is unchanged and
    /// columns without a configured range are left as they are.
    pub fn clamp(&self, table: WorkingTable) -> (WorkingTable, ClampSummary) {
        let mut summary = ClampSummary::default();

        if table.is_empty() {
            return (table, summary);
        }

        let targets: Vec<(usize, MeasurementField, AcceptableRange)> = self
            .ranges
            .iter()
            .filter_map(|(field, range)| match table.column_index(field) {
                Some(index) => Some((index, field, *range)),
                None => {
                    debug!("No {} column to check against {}", field, range);
                    None
                }
            })
            .collect();

        let (columns, mut rows) = table.into_parts();

        let counts = rows
            .par_iter_mut()
            .map(|reading| {
                let mut counts = vec![OutlierCount::default(); targets.len()];
                for (slot, (index, _, range)) in targets.iter().enumerate() {
                    if let Some(value) = reading.values[*index] {
                        if range.is_below(value) {
                            counts[slot].below += 1;
                        } else if range.is_above(value) {
                            counts[slot].above += 1;
                        } else {
                            continue;
                        }
                        reading.values[*index] = Some(range.clamp(value));
                    }
                }
                counts
            })
            .reduce(
                || vec![OutlierCount::default(); targets.len()],
                |mut acc, counts| {
                    for (total, count) in acc.iter_mut().zip(counts) {
                        total.below += count.below;
                        total.above += count.above;
                    }
                    acc
                },
            );

        for ((_, field, range), count) in targets.iter().zip(counts) {
            if count.total() > 0 {
                warn!(
                    "Outliers for variable {}: {} below and {} above {}, clamped to range",
                    field, count.below, count.above, range
                );
                summary.clamped.insert(*field, count);
            }
        }

        info!("Clamped {} outlier values", summary.total());

        (WorkingTable::new(columns, rows), summary)
    }
}

impl Default for OutlierClamper {
    fn default() -> Self {
        Self::new(RangeTable::standard())
    }
}
