//! Tile geometry for area-of-effect targeting.
//!
//! Square tiles, Chebyshev distance, eight facing directions. North is `+y`
//! and East is `+x`. Every shape is a pure function of its inputs: the same
//! origin, direction, method and range always produce the same tiles in the
//! same order, and the output never contains duplicates or tiles outside the
//! battlefield.

mod shapes;

use crate::action::TargetMethod;
use crate::config::EngineConfig;
use crate::state::{Battlefield, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// Clockwise order starting at North.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::NorthEast => (1, 1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, -1),
            Direction::South => (0, -1),
            Direction::SouthWest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, 1),
        }
    }

    fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::NorthEast => 1,
            Direction::East => 2,
            Direction::SouthEast => 3,
            Direction::South => 4,
            Direction::SouthWest => 5,
            Direction::West => 6,
            Direction::NorthWest => 7,
        }
    }

    /// Rotates clockwise by `steps` eighth-turns (negative turns counter-clockwise).
    pub fn rotate(self, steps: i32) -> Direction {
        let index = (self.index() as i32 + steps).rem_euclid(8) as usize;
        Self::ALL[index]
    }

    pub fn is_diagonal(self) -> bool {
        let (dx, dy) = self.delta();
        dx != 0 && dy != 0
    }

    /// Facing from `from` towards `to`, snapped to the nearest of the eight
    /// directions. `None` when both tiles coincide.
    ///
    /// Snapping uses integer arithmetic: a component counts as zero when it
    /// is below `tan(22.5°) ≈ 0.4142` of the other one.
    pub fn towards(from: Position, to: Position) -> Option<Direction> {
        let dx = i64::from(to.x - from.x);
        let dy = i64::from(to.y - from.y);
        if dx == 0 && dy == 0 {
            return None;
        }
        let (ax, ay) = (dx.abs(), dy.abs());
        let step_x = if ax * 10_000 <= ay * 4_142 { 0 } else { dx.signum() };
        let step_y = if ay * 10_000 <= ax * 4_142 { 0 } else { dy.signum() };
        let delta = (step_x as i32, step_y as i32);
        Self::ALL.iter().copied().find(|d| d.delta() == delta)
    }
}

/// Inputs of a tile-set resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Targeting {
    /// The caster's tile.
    pub origin: Position,
    /// The aimed tile; also fixes the facing for directional shapes.
    pub target: Position,
    pub method: TargetMethod,
    pub range: u32,
    /// Radius of circle shots and half-length of walls.
    pub blast_radius: u32,
}

impl Targeting {
    pub const DEFAULT_BLAST_RADIUS: u32 = 1;

    pub fn at(origin: Position, target: Position, method: TargetMethod, range: u32) -> Self {
        Self {
            origin,
            target,
            method,
            range,
            blast_radius: Self::DEFAULT_BLAST_RADIUS,
        }
    }

    /// Aims `range` tiles away from the origin in `direction`.
    pub fn facing(origin: Position, direction: Direction, method: TargetMethod, range: u32) -> Self {
        let (dx, dy) = direction.delta();
        let reach = range.clamp(1, EngineConfig::MAX_BATTLEFIELD_SIDE) as i32;
        Self::at(origin, origin.offset(dx * reach, dy * reach), method, range)
    }

    pub fn with_blast_radius(mut self, blast_radius: u32) -> Self {
        self.blast_radius = blast_radius;
        self
    }

    pub fn direction(&self) -> Option<Direction> {
        Direction::towards(self.origin, self.target)
    }

    /// Resolves the affected tiles, clipped to the battlefield.
    ///
    /// Range and blast radius are capped at the battlefield's longest side;
    /// nothing past it can land on the field from a tile on it.
    pub fn tiles(&self, battlefield: &Battlefield) -> Vec<Position> {
        let reach = battlefield.width.max(battlefield.height);
        let range = self.range.min(reach);
        let blast_radius = self.blast_radius.min(reach);
        let raw = match self.method {
            TargetMethod::Single => vec![self.target],
            TargetMethod::All => battlefield.tiles().collect(),
            TargetMethod::AoeLineShoot => match self.direction() {
                Some(direction) => shapes::line(self.origin, direction, range),
                None => Vec::new(),
            },
            TargetMethod::AoeWallShoot => {
                let facing = self.direction().unwrap_or(Direction::North);
                shapes::wall(self.target, facing, blast_radius)
            }
            TargetMethod::AoeCircleShoot => shapes::square(self.target, blast_radius),
            TargetMethod::AoeCircleSpawn => {
                let mut tiles = shapes::square(self.origin, range);
                tiles.retain(|tile| *tile != self.origin);
                tiles
            }
            TargetMethod::AoeSpiralShoot => {
                let facing = self.direction().unwrap_or(Direction::East);
                shapes::spiral(self.origin, facing, range)
            }
        };
        raw.into_iter()
            .filter(|tile| battlefield.contains(*tile))
            .collect()
    }
}
