//! Ordered walk along a one-pixel-wide skeleton.

use std::collections::HashSet;

use crate::domain::{BinaryMask, PixelCoord, PointChain};
use crate::error::PanoError;

/// Neighbor offsets `(dx, dy)` in the order they are tried: the four direct
/// neighbors first, then the diagonals.
pub const WALK_OFFSETS: [(isize, isize); 8] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
];

/// Walk the skeleton from its first raster pixel.
///
/// At each step the first in-bounds, unvisited foreground neighbor (in
/// `WALK_OFFSETS` order) is appended. The walk stops at the first pixel with
/// no such neighbor, so branches and loops end it early.
pub fn walk_skeleton(skeleton: &BinaryMask) -> Result<PointChain, PanoError> {
    let start = skeleton.first_foreground().ok_or(PanoError::EmptyArcade)?;

    let mut visited: HashSet<PixelCoord> = HashSet::new();
    visited.insert(start);
    let mut points = vec![start];
    let mut current = start;

    loop {
        let next = WALK_OFFSETS
            .iter()
            .filter_map(|&(dx, dy)| current.offset(dx, dy))
            .find(|p| skeleton.get(p.x, p.y) && !visited.contains(p));

        match next {
            Some(p) => {
                visited.insert(p);
                points.push(p);
                current = p;
            }
            None => break,
        }
    }

    log::debug!(
        "skeleton walk: {} of {} pixels visited",
        points.len(),
        skeleton.count()
    );
    Ok(PointChain::from_points(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_path_is_visited_exactly_once() {
        let mask = BinaryMask::from_ascii(&[
            "..........",
            ".#......#.",
            "..#....#..",
            "...#..#...",
            "....##....",
        ]);
        let chain = walk_skeleton(&mask).unwrap();
        assert_eq!(chain.len(), mask.count());

        let unique: HashSet<_> = chain.points().iter().copied().collect();
        assert_eq!(unique.len(), chain.len());
        assert_eq!(chain.points()[0], PixelCoord::new(1, 1));
        assert_eq!(*chain.points().last().unwrap(), PixelCoord::new(8, 1));
    }

    #[test]
    fn direct_neighbors_take_priority_over_diagonals() {
        // From (0,0) both (1,0) and (1,1) are foreground; (1,0) is tried first.
        let mask = BinaryMask::from_ascii(&["##", ".#"]);
        let chain = walk_skeleton(&mask).unwrap();
        assert_eq!(
            chain.points(),
            &[PixelCoord::new(0, 0), PixelCoord::new(1, 0), PixelCoord::new(1, 1)]
        );
    }

    #[test]
    fn start_pixel_is_never_revisited() {
        let mask = BinaryMask::from_ascii(&["###", "#.#", "###"]);
        let chain = walk_skeleton(&mask).unwrap();
        assert_eq!(chain.len(), 8);
        assert_eq!(chain.points()[0], PixelCoord::new(0, 0));
    }

    #[test]
    fn empty_skeleton_is_empty_arcade() {
        assert_eq!(
            walk_skeleton(&BinaryMask::new(4, 4)),
            Err(PanoError::EmptyArcade)
        );
    }

    #[test]
    fn walk_can_use_first_row_and_column() {
        let mask = BinaryMask::from_ascii(&["#..", "#..", "###"]);
        let chain = walk_skeleton(&mask).unwrap();
        assert_eq!(chain.len(), 5);
    }
}
