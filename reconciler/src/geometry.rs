use std::collections::HashSet;
use wheel_shared::constants::FULL_CIRCLE_DEG;
use wheel_shared::Segment;

use crate::error::ReconcileError;

/// Angular extent of one segment, in wheel-local degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentArc {
    pub start: f64,
    pub sweep: f64,
}

impl SegmentArc {
    pub fn end(&self) -> f64 {
        self.start + self.sweep
    }

    pub fn contains(&self, local_angle: f64) -> bool {
        local_angle >= self.start && local_angle < self.end()
    }
}

/// Layout of a wheel: the circle split among segments proportionally to
/// weight, in order, starting at wheel-local 0°.
///
/// A displayed rotation `r` puts wheel-local angle
/// `(r - pointer_offset) mod 360` under the pointer.
#[derive(Debug, Clone)]
pub struct WheelGeometry {
    segments: Vec<Segment>,
    arcs: Vec<SegmentArc>,
    pointer_offset: f64,
}

impl WheelGeometry {
    pub fn new(segments: Vec<Segment>, pointer_offset: f64) -> Result<Self, ReconcileError> {
        if segments.is_empty() {
            return Err(ReconcileError::EmptySegments);
        }

        let mut seen = HashSet::with_capacity(segments.len());
        for segment in &segments {
            if !segment.weight.is_finite() || segment.weight < 0.0 {
                return Err(ReconcileError::InvalidWeight {
                    id: segment.id.clone(),
                    weight: segment.weight,
                });
            }
            if !seen.insert(segment.id.as_str()) {
                return Err(ReconcileError::DuplicateSegmentId(segment.id.clone()));
            }
        }

        let total: f64 = segments.iter().map(|s| s.weight).sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(ReconcileError::ZeroTotalWeight);
        }

        let mut arcs = Vec::with_capacity(segments.len());
        let mut cumulative = 0.0;
        let last = segments.len() - 1;
        for (i, segment) in segments.iter().enumerate() {
            let start = cumulative / total * FULL_CIRCLE_DEG;
            cumulative += segment.weight;
            // The last arc closes the circle exactly.
            let end = if i == last {
                FULL_CIRCLE_DEG
            } else {
                cumulative / total * FULL_CIRCLE_DEG
            };
            arcs.push(SegmentArc { start, sweep: end - start });
        }

        log::debug!(
            "Wheel geometry: {} segments, total weight {}, pointer offset {}",
            segments.len(),
            total,
            pointer_offset
        );

        Ok(Self {
            segments,
            arcs,
            pointer_offset: pointer_offset.rem_euclid(FULL_CIRCLE_DEG),
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn arcs(&self) -> &[SegmentArc] {
        &self.arcs
    }

    pub fn arc(&self, index: usize) -> Option<SegmentArc> {
        self.arcs.get(index).copied()
    }

    pub fn pointer_offset(&self) -> f64 {
        self.pointer_offset
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Zero-weight segments are drawn with no width and can never be landed on.
    pub fn is_landable(&self, index: usize) -> bool {
        self.arcs.get(index).map_or(false, |arc| arc.sweep > 0.0)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.segments.iter().position(|s| s.id == id)
    }

    pub fn losing_index(&self) -> Option<usize> {
        self.segments
            .iter()
            .enumerate()
            .position(|(i, s)| s.is_losing_segment && self.is_landable(i))
    }

    pub fn first_landable_index(&self) -> Option<usize> {
        (0..self.arcs.len()).find(|&i| self.is_landable(i))
    }

    /// Wheel-local angle currently under the pointer.
    pub fn local_angle(&self, rotation: f64) -> f64 {
        (rotation - self.pointer_offset).rem_euclid(FULL_CIRCLE_DEG)
    }

    /// Displayed rotation residue (in [0, 360)) that puts `local_angle` under the pointer.
    pub fn rotation_for(&self, local_angle: f64) -> f64 {
        (local_angle + self.pointer_offset).rem_euclid(FULL_CIRCLE_DEG)
    }

    /// Index of the segment under the pointer at `rotation`.
    pub fn segment_at(&self, rotation: f64) -> usize {
        let local = self.local_angle(rotation);
        // Among arcs sharing a start the last one is the non-empty one,
        // except a trailing empty arc at 360 which no local angle reaches.
        let after = self.arcs.partition_point(|arc| arc.start <= local);
        after.saturating_sub(1)
    }

    /// Inset sub-range of a segment that a landing point may be drawn from.
    pub fn landing_range(&self, index: usize, margin_ratio: f64, margin_cap: f64) -> Option<(f64, f64)> {
        let arc = self.arc(index)?;
        let margin = (arc.sweep * margin_ratio).min(margin_cap).max(0.0);
        Some((arc.start + margin, arc.end() - margin))
    }
}
