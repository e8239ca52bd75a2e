//! Path geometry for enemy traversal
//!
//! The path is an ordered polyline of grid waypoints. A path position is a
//! segment index plus a fraction along that segment:
//! - `point_at(i, f)` = lerp(waypoint[i], waypoint[i + 1], f)
//! - segments are axis-aligned on the standard map, which `is_on_path` relies on

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A cell coordinate on the map grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell coordinate in path-grid units
    #[inline]
    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

/// Error building a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A path needs at least a start and an end
    TooFewWaypoints { found: usize },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::TooFewWaypoints { found } => {
                write!(f, "path needs at least 2 waypoints, found {}", found)
            }
        }
    }
}

impl std::error::Error for PathError {}

/// Waypoints of the standard map (12x12 grid)
const STANDARD_WAYPOINTS: [GridPos; 8] = [
    GridPos::new(0, 5),
    GridPos::new(3, 5),
    GridPos::new(3, 2),
    GridPos::new(8, 2),
    GridPos::new(8, 8),
    GridPos::new(5, 8),
    GridPos::new(5, 11),
    GridPos::new(11, 11),
];

/// Immutable polyline enemies walk along
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    waypoints: Vec<GridPos>,
}

impl Path {
    pub fn new(waypoints: Vec<GridPos>) -> Result<Self, PathError> {
        if waypoints.len() < 2 {
            return Err(PathError::TooFewWaypoints {
                found: waypoints.len(),
            });
        }
        Ok(Self { waypoints })
    }

    /// The map every session is played on
    pub fn standard() -> Self {
        Self {
            waypoints: STANDARD_WAYPOINTS.to_vec(),
        }
    }

    pub fn waypoints(&self) -> &[GridPos] {
        &self.waypoints
    }

    /// Index of the last waypoint; reaching it means reaching the base
    #[inline]
    pub fn final_index(&self) -> usize {
        self.waypoints.len() - 1
    }

    /// Interpolated coordinate at `fraction` along segment `segment`.
    ///
    /// Out-of-range segments clamp to the last waypoint, and a segment whose
    /// end is missing returns its start waypoint.
    pub fn point_at(&self, segment: usize, fraction: f32) -> Vec2 {
        let start = self.waypoints[segment.min(self.final_index())].as_vec2();
        match self.waypoints.get(segment + 1) {
            Some(end) => start.lerp(end.as_vec2(), fraction),
            None => start,
        }
    }

    /// True if the cell lies on any axis-aligned segment (endpoints inclusive)
    pub fn is_on_path(&self, x: i32, y: i32) -> bool {
        self.waypoints.windows(2).any(|pair| {
            let (a, b) = (pair[0], pair[1]);
            let vertical = a.x == b.x && x == a.x && y >= a.y.min(b.y) && y <= a.y.max(b.y);
            let horizontal = a.y == b.y && y == a.y && x >= a.x.min(b.x) && x <= a.x.max(b.x);
            vertical || horizontal
        })
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::standard()
    }
}
