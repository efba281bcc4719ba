//! Route geometry: a polyline precomputed into cumulative-arclength segments.
//!
//! Units never pathfind. They carry a scalar distance travelled along the
//! route and ask the [`PathProfile`] where that distance lands on the map.

use crate::error::{GameError, Result};
use crate::math::{sqrt_wide, Fixed, Vec2Fixed};

/// Fractional bits of [`Fixed`].
const FRAC_BITS: u32 = 32;

/// Consecutive points closer than this are treated as duplicates.
const MIN_SEGMENT_LENGTH: Fixed = Fixed::from_bits(1 << 12);

/// One non-degenerate piece of the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    start: Vec2Fixed,
    end: Vec2Fixed,
    length: Fixed,
    /// Unit direction from `start` to `end`.
    direction: Vec2Fixed,
    /// Cumulative route length at `start`.
    start_distance: Fixed,
    /// Cumulative route length at `end`.
    end_distance: Fixed,
}

/// Result of sampling the route at a distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePosition {
    /// Map position.
    pub position: Vec2Fixed,
    /// Whether the sampled distance is at or past the end of the route.
    pub reached_end: bool,
}

/// Immutable, precomputed route used for the whole match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathProfile {
    segments: Vec<Segment>,
    total_length: Fixed,
}

impl PathProfile {
    /// Build a profile from an ordered list of route points.
    ///
    /// Zero-length steps between duplicate consecutive points are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidPath`] if fewer than two points are given,
    /// if every consecutive pair coincides, or if the route is too long to
    /// measure in [`Fixed`].
    pub fn new(points: &[Vec2Fixed]) -> Result<Self> {
        if points.len() < 2 {
            return Err(GameError::InvalidPath(format!(
                "need at least 2 points, got {}",
                points.len()
            )));
        }

        let mut segments = Vec::with_capacity(points.len() - 1);
        let mut accumulated = Fixed::ZERO;

        for pair in points.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let length = sqrt_wide(start.distance_squared(end))
                .ok_or_else(|| GameError::InvalidPath("segment is too long".to_string()))?;
            if length < MIN_SEGMENT_LENGTH {
                continue;
            }

            let direction = Vec2Fixed::new(
                (end.x - start.x) / length,
                (end.y - start.y) / length,
            );
            let end_distance = accumulated
                .checked_add(length)
                .ok_or_else(|| GameError::InvalidPath("route is too long".to_string()))?;

            segments.push(Segment {
                start,
                end,
                length,
                direction,
                start_distance: accumulated,
                end_distance,
            });
            accumulated = end_distance;
        }

        if segments.is_empty() {
            return Err(GameError::InvalidPath(
                "all segments have zero length".to_string(),
            ));
        }

        Ok(Self {
            segments,
            total_length: accumulated,
        })
    }

    /// Sum of all segment lengths.
    #[must_use]
    pub const fn total_length(&self) -> Fixed {
        self.total_length
    }

    /// Number of non-degenerate segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// First point of the route.
    #[must_use]
    pub fn start(&self) -> Vec2Fixed {
        self.segments[0].start
    }

    /// Last point of the route.
    #[must_use]
    pub fn end(&self) -> Vec2Fixed {
        self.segments[self.segments.len() - 1].end
    }

    /// Position on the route after travelling `distance`.
    ///
    /// Distances at or below zero map to the first point; distances at or past
    /// [`total_length`](Self::total_length) map to the last point with
    /// `reached_end` set.
    #[must_use]
    pub fn position_at_distance(&self, distance: Fixed) -> RoutePosition {
        if distance <= Fixed::ZERO {
            return RoutePosition {
                position: self.start(),
                reached_end: false,
            };
        }

        if distance >= self.total_length {
            return RoutePosition {
                position: self.end(),
                reached_end: true,
            };
        }

        // Segments are sorted by cumulative distance; pick the first whose end
        // is at or beyond the requested distance.
        let index = self
            .segments
            .partition_point(|segment| segment.end_distance < distance);
        let segment = &self.segments[index.min(self.segments.len() - 1)];

        let local = distance - segment.start_distance;
        RoutePosition {
            position: segment.start + segment.direction.scale(local),
            reached_end: false,
        }
    }

    /// Minimum Euclidean distance from `point` to any segment of the route.
    #[must_use]
    pub fn distance_to_route(&self, point: Vec2Fixed) -> Fixed {
        let best = self
            .segments
            .iter()
            .map(|segment| distance_squared_to_segment(point, segment))
            .min()
            .unwrap_or(u128::MAX);
        sqrt_wide(best).unwrap_or(Fixed::MAX)
    }

    /// Whether `point` lies within `radius` of the route (inclusive).
    ///
    /// Used for the no-build zone around the road.
    #[must_use]
    pub fn is_within_radius(&self, point: Vec2Fixed, radius: Fixed) -> bool {
        self.distance_to_route(point) <= radius
    }
}

/// Squared distance from `point` to the closest point of `segment`, in the
/// units of [`Vec2Fixed::distance_squared`].
///
/// The projection onto the segment is done on raw bits in 128-bit integers.
fn distance_squared_to_segment(point: Vec2Fixed, segment: &Segment) -> u128 {
    let offset_x = i128::from(point.x.to_bits()) - i128::from(segment.start.x.to_bits());
    let offset_y = i128::from(point.y.to_bits()) - i128::from(segment.start.y.to_bits());
    let along = (offset_x * i128::from(segment.direction.x.to_bits())
        + offset_y * i128::from(segment.direction.y.to_bits()))
        >> FRAC_BITS;
    if along <= 0 {
        return point.distance_squared(segment.start);
    }
    if along >= i128::from(segment.length.to_bits()) {
        return point.distance_squared(segment.end);
    }
    // Strictly inside the segment, so `along` fits in `Fixed`.
    let along = Fixed::from_bits(i64::try_from(along).unwrap_or(i64::MAX));

    let closest = Vec2Fixed::new(
        segment
            .start
            .x
            .saturating_add(segment.direction.x.saturating_mul(along)),
        segment
            .start
            .y
            .saturating_add(segment.direction.y.saturating_mul(along)),
    );
    point.distance_squared(closest)
}
