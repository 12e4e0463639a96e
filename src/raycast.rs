//! Grid line tracing.
use crate::point::GridPoint;

/// Cells visited by a 3D Bresenham line from `from` to `to`, both ends included.
///
/// The axis with the largest delta advances by one cell each step while the other two
/// follow their error terms, so consecutive cells are always 26-adjacent. Cells are
/// produced lazily, so callers that stop at the first blocked cell never walk the rest.
///
/// # Example
///
/// ```
/// use bevy_voxelnav::prelude::*;
/// use bevy_voxelnav::raycast::bresenham_line;
///
/// let line: Vec<GridPoint> = bresenham_line(GridPoint::new(0, 0, 0), GridPoint::new(4, 2, 0)).collect();
/// assert_eq!(line.len(), 5);
/// assert_eq!(line[0], GridPoint::new(0, 0, 0));
/// assert_eq!(line[4], GridPoint::new(4, 2, 0));
/// ```
pub fn bresenham_line(from: GridPoint, to: GridPoint) -> BresenhamLine {
    BresenhamLine::new(from, to)
}

/// Iterator returned by [`bresenham_line`].
///
/// Deltas and error terms are kept in `i64` so lines between any two `i32` cells
/// are traced without overflow.
#[derive(Debug, Clone)]
pub struct BresenhamLine {
    position: [i32; 3],
    end: [i32; 3],
    step: [i32; 3],
    delta: [i64; 3],
    error: [i64; 3],
    major: usize,
    done: bool,
}

impl BresenhamLine {
    fn new(from: GridPoint, to: GridPoint) -> Self {
        let position = [from.x, from.y, from.z];
        let end = [to.x, to.y, to.z];

        let mut step = [0; 3];
        let mut delta = [0; 3];
        for axis in 0..3 {
            let d = i64::from(end[axis]) - i64::from(position[axis]);
            step[axis] = d.signum() as i32;
            delta[axis] = d.abs() << 1;
        }

        let major = if delta[0] >= delta[1].max(delta[2]) {
            0
        } else if delta[1] >= delta[2] {
            1
        } else {
            2
        };

        let mut error = [0; 3];
        for axis in 0..3 {
            error[axis] = delta[axis] - (delta[major] >> 1);
        }

        BresenhamLine {
            position,
            end,
            step,
            delta,
            error,
            major,
            done: false,
        }
    }

    fn remaining(&self) -> u64 {
        if self.done {
            return 0;
        }
        (i64::from(self.end[self.major]) - i64::from(self.position[self.major])).unsigned_abs() + 1
    }
}

impl Iterator for BresenhamLine {
    type Item = GridPoint;

    fn next(&mut self) -> Option<GridPoint> {
        if self.done {
            return None;
        }

        let [x, y, z] = self.position;
        let current = GridPoint::new(x, y, z);

        let major = self.major;
        if self.position[major] == self.end[major] {
            self.done = true;
            return Some(current);
        }

        for axis in (0..3).filter(|a| *a != major) {
            if self.error[axis] >= 0 {
                self.position[axis] += self.step[axis];
                self.error[axis] -= self.delta[major];
            }
            self.error[axis] += self.delta[axis];
        }
        self.position[major] += self.step[major];

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).ok();
        (remaining.unwrap_or(usize::MAX), remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_contiguous(line: &[GridPoint]) {
        assert!(line.windows(2).all(|w| w[0].chebyshev_distance(&w[1]) == 1));
    }

    #[test]
    fn test_single_point() {
        let p = GridPoint::new(3, -2, 7);
        assert_eq!(bresenham_line(p, p).collect::<Vec<_>>(), vec![p]);
    }

    #[test]
    fn test_axis_aligned() {
        let line: Vec<_> = bresenham_line(GridPoint::new(0, 0, 0), GridPoint::new(0, 0, -4)).collect();
        assert_eq!(
            line,
            (0..=4).map(|i| GridPoint::new(0, 0, -i)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_diagonal() {
        let line: Vec<_> = bresenham_line(GridPoint::new(0, 0, 0), GridPoint::new(3, 3, 3)).collect();
        assert_eq!(
            line,
            (0..=3).map(|i| GridPoint::new(i, i, i)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_dominant_axes() {
        for (from, to) in [
            (GridPoint::new(0, 0, 0), GridPoint::new(9, 4, -2)),
            (GridPoint::new(2, 1, 0), GridPoint::new(-3, 12, 5)),
            (GridPoint::new(5, 5, 5), GridPoint::new(4, 0, 20)),
        ] {
            let line: Vec<_> = bresenham_line(from, to).collect();
            let steps = (to.as_ivec3() - from.as_ivec3()).abs().max_element() as usize;

            assert_eq!(line.len(), steps + 1);
            assert_eq!(line[0], from);
            assert_eq!(*line.last().unwrap(), to);
            assert_contiguous(&line);
        }
    }

    #[test]
    fn test_reversed_covers_same_length() {
        let a = GridPoint::new(1, 8, 2);
        let b = GridPoint::new(6, 0, 4);
        assert_eq!(bresenham_line(a, b).count(), bresenham_line(b, a).count());
    }

    #[test]
    fn test_extreme_endpoints_do_not_overflow() {
        let from = GridPoint::new(i32::MIN, 0, i32::MAX);
        let to = GridPoint::new(i32::MAX, 0, i32::MIN);

        let mut line = bresenham_line(from, to);
        assert_eq!(line.size_hint().1, usize::try_from(u32::MAX as u64 + 1).ok());
        assert_eq!(line.next(), Some(from));
        let second = line.next().unwrap();
        assert_eq!(second.chebyshev_distance(&from), 1);
        assert_eq!(line.take(10).count(), 10);
    }

    #[test]
    fn test_lazy_size_hint() {
        let mut line = bresenham_line(GridPoint::new(0, 0, 0), GridPoint::new(2, 7, 1));
        assert_eq!(line.size_hint(), (8, Some(8)));
        line.next();
        assert_eq!(line.size_hint(), (7, Some(7)));
        assert_eq!(line.by_ref().count(), 7);
        assert_eq!(line.next(), None);
    }
}
