//! Grid directions and dimensionality.
//!
//! Directions are indexed North, East, South, West, Up, Down (0..6). A planar
//! grid uses the first four, a volumetric grid all six.
//!
//! Axis conventions:
//! - Planar: North = +Y, East = +X (Z is always 0)
//! - Volumetric: North = +Z, East = +X, Up = +Y

use bevy_math::IVec3;
use serde::{Deserialize, Serialize};

/// One of the six unit directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
    Up,
    Down,
}

impl Direction {
    /// All six directions in index order.
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    /// The four horizontal directions in index order.
    pub const PLANAR: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Index 0..6 of this direction.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The direction pointing the other way.
    ///
    /// North <-> South, East <-> West, Up <-> Down.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Lowercase name, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

/// Whether the grid is a 2-D plane or a 3-D volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimensionality {
    #[default]
    Planar,
    Volumetric,
}

impl Dimensionality {
    /// Directions used for neighbor lookup in this dimensionality.
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Dimensionality::Planar => &Direction::PLANAR,
            Dimensionality::Volumetric => &Direction::ALL,
        }
    }

    /// Unit offset of `direction` in this dimensionality.
    ///
    /// Up/Down have no meaning on a plane and map to zero there.
    pub fn offset(self, direction: Direction) -> IVec3 {
        match self {
            Dimensionality::Planar => match direction {
                Direction::North => IVec3::new(0, 1, 0),
                Direction::East => IVec3::new(1, 0, 0),
                Direction::South => IVec3::new(0, -1, 0),
                Direction::West => IVec3::new(-1, 0, 0),
                Direction::Up | Direction::Down => IVec3::ZERO,
            },
            Dimensionality::Volumetric => match direction {
                Direction::North => IVec3::new(0, 0, 1),
                Direction::East => IVec3::new(1, 0, 0),
                Direction::South => IVec3::new(0, 0, -1),
                Direction::West => IVec3::new(-1, 0, 0),
                Direction::Up => IVec3::new(0, 1, 0),
                Direction::Down => IVec3::new(0, -1, 0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_involution() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
        assert_eq!(Direction::North.opposite(), Direction::South);
        assert_eq!(Direction::East.opposite(), Direction::West);
        assert_eq!(Direction::Up.opposite(), Direction::Down);
    }

    #[test]
    fn test_offsets_cancel_with_opposite() {
        for dims in [Dimensionality::Planar, Dimensionality::Volumetric] {
            for &dir in dims.directions() {
                let sum = dims.offset(dir) + dims.offset(dir.opposite());
                assert_eq!(sum, IVec3::ZERO);
                assert_ne!(dims.offset(dir), IVec3::ZERO);
            }
        }
    }

    #[test]
    fn test_axis_conventions() {
        assert_eq!(
            Dimensionality::Planar.offset(Direction::North),
            IVec3::new(0, 1, 0)
        );
        assert_eq!(
            Dimensionality::Volumetric.offset(Direction::North),
            IVec3::new(0, 0, 1)
        );
        assert_eq!(
            Dimensionality::Volumetric.offset(Direction::Up),
            IVec3::new(0, 1, 0)
        );
    }

    #[test]
    fn test_direction_counts() {
        assert_eq!(Dimensionality::Planar.directions().len(), 4);
        assert_eq!(Dimensionality::Volumetric.directions().len(), 6);
    }
}
