//! Exact-color pixel search over a captured frame.

use crate::capture::Frame;
use crate::mouse::Point;

/// A pixel position in a frame. `row` is the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchCoordinate {
    pub row: u32,
    pub col: u32,
}

impl MatchCoordinate {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Screen point for the pointer: x is the column, y the row.
    pub fn to_point(self) -> Point {
        Point::new(self.col as i32, self.row as i32)
    }
}

/// Lazily yields every pixel equal to `color`, top-to-bottom then left-to-right.
///
/// Walks the raw RGB buffer once; no per-pixel bounds checks.
pub fn locate_iter(frame: &Frame, color: [u8; 3]) -> impl Iterator<Item = MatchCoordinate> + '_ {
    let width = frame.width() as usize;
    frame
        .as_raw()
        .chunks_exact(3)
        .enumerate()
        .filter(move |(_, px)| px[..] == color[..])
        .map(move |(i, _)| MatchCoordinate::new((i / width) as u32, (i % width) as u32))
}

/// All matches in row-major order. Empty when nothing matches.
pub fn locate(frame: &Frame, color: [u8; 3]) -> Vec<MatchCoordinate> {
    locate_iter(frame, color).collect()
}

/// First match in row-major order; stops scanning as soon as one is found.
pub fn first_match(frame: &Frame, color: [u8; 3]) -> Option<MatchCoordinate> {
    locate_iter(frame, color).next()
}
