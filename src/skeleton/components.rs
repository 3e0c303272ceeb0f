//! 8-connected component labeling (two-pass union-find).
//!
//! Labels are compacted so that label `1` is the component whose first pixel
//! comes first in raster order, label `2` the next one, and so on. Label `0`
//! is background.

use crate::domain::BinaryMask;

#[derive(Debug, Clone)]
pub struct ComponentLabels {
    width: usize,
    height: usize,
    labels: Vec<u32>,
    /// `sizes[l - 1]` is the pixel count of label `l`.
    sizes: Vec<usize>,
}

impl ComponentLabels {
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    pub fn label_at(&self, x: usize, y: usize) -> u32 {
        self.labels[y * self.width + x]
    }

    pub fn size_of(&self, label: u32) -> usize {
        label
            .checked_sub(1)
            .and_then(|i| self.sizes.get(i as usize))
            .copied()
            .unwrap_or(0)
    }

    /// Label with the most pixels; ties go to the label assigned first.
    pub fn largest(&self) -> Option<u32> {
        let mut best: Option<(u32, usize)> = None;
        for (i, &size) in self.sizes.iter().enumerate() {
            if best.is_none_or(|(_, s)| size > s) {
                best = Some((i as u32 + 1, size));
            }
        }
        best.map(|(label, _)| label)
    }

    /// Mask keeping only the pixels of `label`.
    pub fn mask_of(&self, label: u32) -> BinaryMask {
        BinaryMask::from_fn(self.width, self.height, |x, y| {
            label != 0 && self.labels[y * self.width + x] == label
        })
    }
}

struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        // Index 0 is a placeholder so provisional labels start at 1.
        Self { parent: vec![0] }
    }

    fn make(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut a: u32) -> u32 {
        while self.parent[a as usize] != a {
            let grand = self.parent[self.parent[a as usize] as usize];
            self.parent[a as usize] = grand;
            a = grand;
        }
        a
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi as usize] = lo;
        }
    }
}

/// Label the 8-connected foreground components of `mask`.
pub fn label_components(mask: &BinaryMask) -> ComponentLabels {
    let (w, h) = (mask.width(), mask.height());
    let mut labels = vec![0u32; w * h];
    let mut uf = UnionFind::new();

    // Already-visited neighbors in raster order: W, NW, N, NE.
    const PRIOR: [(isize, isize); 4] = [(-1, 0), (-1, -1), (0, -1), (1, -1)];

    for y in 0..h {
        for x in 0..w {
            if !mask.get(x, y) {
                continue;
            }
            let mut current = 0u32;
            for (dx, dy) in PRIOR {
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                if nx < 0 || ny < 0 || nx >= w as isize {
                    continue;
                }
                let l = labels[ny as usize * w + nx as usize];
                if l == 0 {
                    continue;
                }
                if current == 0 {
                    current = l;
                } else {
                    uf.union(current, l);
                }
            }
            if current == 0 {
                current = uf.make();
            }
            labels[y * w + x] = current;
        }
    }

    // Second pass: resolve roots and compact in first-seen (raster) order.
    let mut compact = vec![0u32; uf.parent.len()];
    let mut sizes = Vec::new();
    for l in labels.iter_mut() {
        if *l == 0 {
            continue;
        }
        let root = uf.find(*l) as usize;
        if compact[root] == 0 {
            sizes.push(0);
            compact[root] = sizes.len() as u32;
        }
        *l = compact[root];
        sizes[*l as usize - 1] += 1;
    }

    ComponentLabels {
        width: w,
        height: h,
        labels,
        sizes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_pixels_are_connected() {
        let mask = BinaryMask::from_ascii(&["#...", ".#..", "..#.", "...."]);
        let labels = label_components(&mask);
        assert_eq!(labels.count(), 1);
        assert_eq!(labels.size_of(1), 3);
    }

    #[test]
    fn u_shape_merges_into_one_label() {
        // The two arms only meet on the last row; union-find must merge them.
        let mask = BinaryMask::from_ascii(&["#...#", "#...#", "#####"]);
        let labels = label_components(&mask);
        assert_eq!(labels.count(), 1);
        assert_eq!(labels.label_at(0, 0), labels.label_at(4, 0));
        assert_eq!(labels.size_of(1), 9);
    }

    #[test]
    fn largest_component_wins_and_ties_go_to_first_label() {
        let mask = BinaryMask::from_ascii(&["##..#", "....#", "###..", "....."]);
        let labels = label_components(&mask);
        assert_eq!(labels.count(), 3);
        // Raster order of first pixels: (0,0) -> 1, (4,0) -> 2, (0,2) -> 3.
        assert_eq!(labels.size_of(1), 2);
        assert_eq!(labels.size_of(2), 2);
        assert_eq!(labels.size_of(3), 3);
        assert_eq!(labels.largest(), Some(3));

        let tie = BinaryMask::from_ascii(&["##..##"]);
        assert_eq!(label_components(&tie).largest(), Some(1));
    }

    #[test]
    fn empty_mask_has_no_components() {
        let labels = label_components(&BinaryMask::new(3, 3));
        assert_eq!(labels.count(), 0);
        assert_eq!(labels.largest(), None);
        assert_eq!(labels.size_of(0), 0);
    }

    #[test]
    fn mask_of_selects_single_component() {
        let mask = BinaryMask::from_ascii(&["#..#", "#..#"]);
        let labels = label_components(&mask);
        let only = labels.mask_of(2);
        assert_eq!(only.count(), 2);
        assert!(only.get(3, 0) && !only.get(0, 0));
    }
}
