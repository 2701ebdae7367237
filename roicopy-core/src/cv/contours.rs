// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::im::Plane;

type PointKey = (u64, u64);

fn key(point: &[f64; 2]) -> PointKey {
    (point[0].to_bits(), point[1].to_bits())
}

/// Find iso-valued contours in a 2D plane using marching squares
///
/// Contours are returned as ordered (row, col) points with sub-pixel
/// precision. Closed contours repeat their first point at the end. Saddle
/// squares are resolved by joining the low-valued corners, and segments
/// are assembled in row-major scan order so the output is deterministic.
///
/// # Arguments
///
/// * `width` - Width of plane
/// * `height` - Height of plane
/// * `values` - A row-major plane buffer
/// * `level` - Iso-value at which contours are traced
///
/// # Examples
///
/// ```
/// use roicopy_core::cv::find_contours;
///
/// let values = vec![
///     0., 0., 0.,
///     0., 1., 0.,
///     0., 0., 0.,
/// ];
///
/// let contours = find_contours(3, 3, &values, 0.5);
///
/// assert_eq!(
///     contours,
///     [[[1.5, 1.0], [1.0, 0.5], [0.5, 1.0], [1.0, 1.5], [1.5, 1.0]]]
/// );
/// ```
pub fn find_contours(width: usize, height: usize, values: &[f64], level: f64) -> Vec<Vec<[f64; 2]>> {
    if width < 2 || height < 2 || values.len() != width * height {
        return Vec::new();
    }

    let at = |r: usize, c: usize| values[r * width + c];

    let mut segments: Vec<([f64; 2], [f64; 2])> = Vec::new();

    for r0 in 0..height - 1 {
        for c0 in 0..width - 1 {
            let (r1, c1) = (r0 + 1, c0 + 1);

            let ul = at(r0, c0);
            let ur = at(r0, c1);
            let ll = at(r1, c0);
            let lr = at(r1, c1);

            if ul.is_nan() || ur.is_nan() || ll.is_nan() || lr.is_nan() {
                continue;
            }

            let case = (ul > level) as u8
                | ((ur > level) as u8) << 1
                | ((ll > level) as u8) << 2
                | ((lr > level) as u8) << 3;

            if case == 0 || case == 15 {
                continue;
            }

            let (r0, c0, r1, c1) = (r0 as f64, c0 as f64, r1 as f64, c1 as f64);

            let top = [r0, c0 + fraction(ul, ur, level)];
            let bottom = [r1, c0 + fraction(ll, lr, level)];
            let left = [r0 + fraction(ul, ll, level), c0];
            let right = [r0 + fraction(ur, lr, level), c1];

            match case {
                1 => segments.push((top, left)),
                2 => segments.push((right, top)),
                3 => segments.push((right, left)),
                4 => segments.push((left, bottom)),
                5 => segments.push((top, bottom)),
                6 => {
                    segments.push((right, top));
                    segments.push((left, bottom));
                }
                7 => segments.push((right, bottom)),
                8 => segments.push((bottom, right)),
                9 => {
                    segments.push((top, left));
                    segments.push((bottom, right));
                }
                10 => segments.push((bottom, top)),
                11 => segments.push((bottom, left)),
                12 => segments.push((left, right)),
                13 => segments.push((top, right)),
                14 => segments.push((left, top)),
                _ => {}
            }
        }
    }

    assemble_contours(segments)
}

/// Find iso-valued contours in a composited plane
pub fn find_plane_contours(plane: &Plane, level: f64) -> Vec<Vec<[f64; 2]>> {
    find_contours(plane.width(), plane.height(), plane.as_raw(), level)
}

/// Select the contour with the most points
///
/// Ties keep the earliest contour. Returns `None` if there are no contours.
///
/// # Examples
///
/// ```
/// use roicopy_core::cv::longest_contour;
///
/// let contours = vec![vec![[0.0, 0.0]; 7], vec![[1.0, 1.0]; 12]];
/// assert_eq!(longest_contour(&contours).unwrap().len(), 12);
/// ```
pub fn longest_contour(contours: &[Vec<[f64; 2]>]) -> Option<&Vec<[f64; 2]>> {
    contours.iter().fold(None, |longest, contour| match longest {
        Some(best) if best.len() >= contour.len() => Some(best),
        _ => Some(contour),
    })
}

/// Position of the level crossing between two corner values
fn fraction(from: f64, to: f64, level: f64) -> f64 {
    if to == from {
        return 0.0;
    }

    (level - from) / (to - from)
}

/// Join directed segments into ordered contours
///
/// Contours are kept in order of creation, so the first contour found in
/// scan order is first in the output.
fn assemble_contours(segments: Vec<([f64; 2], [f64; 2])>) -> Vec<Vec<[f64; 2]>> {
    let mut contours: BTreeMap<usize, VecDeque<[f64; 2]>> = BTreeMap::new();
    let mut starts: HashMap<PointKey, usize> = HashMap::new();
    let mut ends: HashMap<PointKey, usize> = HashMap::new();
    let mut next_index = 0;

    for (from, to) in segments {
        if from == to {
            continue;
        }

        let tail = starts.remove(&key(&to));
        let head = ends.remove(&key(&from));

        match (tail, head) {
            (Some(tail_idx), Some(head_idx)) if tail_idx == head_idx => {
                if let Some(contour) = contours.get_mut(&head_idx) {
                    contour.push_back(to);
                }
            }
            (Some(tail_idx), Some(head_idx)) if tail_idx > head_idx => {
                // Tail was created later, append it to head
                let tail = contours.remove(&tail_idx).unwrap_or_default();
                if let Some(head) = contours.get_mut(&head_idx) {
                    head.extend(tail);
                    if let (Some(first), Some(last)) = (head.front(), head.back()) {
                        starts.insert(key(first), head_idx);
                        ends.insert(key(last), head_idx);
                    }
                }
            }
            (Some(tail_idx), Some(head_idx)) => {
                // Head was created later, prepend it to tail
                let head = contours.remove(&head_idx).unwrap_or_default();
                if let Some(first) = head.front() {
                    starts.remove(&key(first));
                }
                if let Some(tail) = contours.get_mut(&tail_idx) {
                    for point in head.into_iter().rev() {
                        tail.push_front(point);
                    }
                    if let (Some(first), Some(last)) = (tail.front(), tail.back()) {
                        starts.insert(key(first), tail_idx);
                        ends.insert(key(last), tail_idx);
                    }
                }
            }
            (None, None) => {
                contours.insert(next_index, VecDeque::from(vec![from, to]));
                starts.insert(key(&from), next_index);
                ends.insert(key(&to), next_index);
                next_index += 1;
            }
            (Some(tail_idx), None) => {
                if let Some(tail) = contours.get_mut(&tail_idx) {
                    tail.push_front(from);
                }
                starts.insert(key(&from), tail_idx);
            }
            (None, Some(head_idx)) => {
                if let Some(head) = contours.get_mut(&head_idx) {
                    head.push_back(to);
                }
                ends.insert(key(&to), head_idx);
            }
        }
    }

    contours
        .into_values()
        .map(|contour| contour.into_iter().collect())
        .collect()
}
