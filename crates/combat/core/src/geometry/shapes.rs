//! Raw shape walkers. Callers clip the output to the battlefield.

use super::Direction;
use crate::state::Position;

/// Ray from `origin` (exclusive) for `range` steps.
pub(super) fn line(origin: Position, direction: Direction, range: u32) -> Vec<Position> {
    let (dx, dy) = direction.delta();
    (1..=range as i32)
        .map(|step| origin.offset(dx * step, dy * step))
        .collect()
}

/// Line through `center` perpendicular to `facing`, `half_length` tiles to
/// each side.
pub(super) fn wall(center: Position, facing: Direction, half_length: u32) -> Vec<Position> {
    let (dx, dy) = facing.rotate(-2).delta();
    let half = half_length as i32;
    (-half..=half)
        .map(|step| center.offset(dx * step, dy * step))
        .collect()
}

/// Every tile within Chebyshev `radius` of `center`, row-major.
pub(super) fn square(center: Position, radius: u32) -> Vec<Position> {
    let r = radius as i32;
    (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| center.offset(dx, dy)))
        .collect()
}

/// Square spiral walk around `origin`, turning counter-clockwise with leg
/// lengths 1, 1, 2, 2, 3, 3, ... until every tile within `range` has been
/// visited. The first leg points along `facing` (diagonals snap
/// counter-clockwise to a cardinal direction). Tiles beyond `range` that the
/// walk crosses are skipped.
pub(super) fn spiral(origin: Position, facing: Direction, range: u32) -> Vec<Position> {
    let side = 2 * u64::from(range) + 1;
    let wanted = (side * side - 1) as usize;
    let mut heading = if facing.is_diagonal() {
        facing.rotate(-1)
    } else {
        facing
    };
    let mut tiles = Vec::with_capacity(wanted);
    let mut cursor = origin;
    let mut leg = 1;

    while tiles.len() < wanted {
        // two legs per length
        for _ in 0..2 {
            let (dx, dy) = heading.delta();
            for _ in 0..leg {
                cursor = cursor.offset(dx, dy);
                if cursor.distance(origin) <= range {
                    tiles.push(cursor);
                }
                if tiles.len() == wanted {
                    return tiles;
                }
            }
            heading = heading.rotate(-2);
        }
        leg += 1;
    }
    tiles
}
