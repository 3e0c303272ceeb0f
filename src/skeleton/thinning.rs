//! Topology-preserving thinning (Guo–Hall rules).
//!
//! Neighbors are numbered counter-clockwise starting east:
//!
//! ```text
//! P3 P2 P1
//! P4 .  P0
//! P5 P6 P7
//! ```
//!
//! Each sub-iteration marks candidates on the current mask, then removes them
//! one at a time, re-checking on the updated mask that the pixel is still a
//! simple point and not an end point. Removing only simple points keeps every
//! 8-connected component connected and never removes a component's last
//! pixel, so a non-empty mask always thins to a non-empty skeleton.

use crate::domain::BinaryMask;

const RING: [(isize, isize); 8] = [
    (1, 0),   // P0 east
    (1, -1),  // P1
    (0, -1),  // P2 north
    (-1, -1), // P3
    (-1, 0),  // P4 west
    (-1, 1),  // P5
    (0, 1),   // P6 south
    (1, 1),   // P7
];

/// Thin `mask` to a one-pixel-wide skeleton.
pub fn thin(mask: &BinaryMask) -> BinaryMask {
    let mut current = mask.clone();
    loop {
        let removed_first = sub_iteration(&mut current, Pass::First);
        let removed_second = sub_iteration(&mut current, Pass::Second);
        if removed_first + removed_second == 0 {
            return current;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    First,
    Second,
}

fn ring(mask: &BinaryMask, x: usize, y: usize) -> [bool; 8] {
    RING.map(|(dx, dy)| mask.get_signed(x as isize + dx, y as isize + dy))
}

/// Hilditch crossing number: 8-connected foreground runs around the pixel.
fn crossing_number(p: &[bool; 8]) -> usize {
    [0, 2, 4, 6]
        .into_iter()
        .filter(|&i| !p[i] && (p[i + 1] || p[(i + 2) % 8]))
        .count()
}

fn is_simple_point(p: &[bool; 8]) -> bool {
    crossing_number(p) == 1
}

fn candidate(p: &[bool; 8], pass: Pass) -> bool {
    if !is_simple_point(p) {
        return false;
    }

    let (mut n1, mut n2) = (0, 0);
    for k in [1, 3, 5, 7] {
        n1 += usize::from(p[k] || p[k - 1]);
        n2 += usize::from(p[k] || p[(k + 1) % 8]);
    }
    if !(2..=3).contains(&n1.min(n2)) {
        return false;
    }

    match pass {
        Pass::First => !((p[1] || p[2] || !p[7]) && p[0]),
        Pass::Second => !((p[5] || p[6] || !p[3]) && p[4]),
    }
}

fn sub_iteration(mask: &mut BinaryMask, pass: Pass) -> usize {
    let mut marked = Vec::new();
    for y in 0..mask.height() {
        for x in 0..mask.width() {
            if mask.get(x, y) && candidate(&ring(mask, x, y), pass) {
                marked.push((x, y));
            }
        }
    }

    let mut removed = 0;
    for (x, y) in marked {
        let p = ring(mask, x, y);
        let neighbors = p.iter().filter(|&&v| v).count();
        if neighbors >= 2 && is_simple_point(&p) {
            mask.set(x, y, false);
            removed += 1;
        }
    }
    removed
}
