use serde::{Deserialize, Serialize};

/// A dense row-major 2D grid with fixed dimensions.
///
/// Grids are produced whole by one generation stage and treated as read-only
/// afterwards; a regeneration replaces them rather than editing in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    /// Row-major cell values, `width * height` long.
    pub data: Vec<T>,
    pub width: usize,
    pub height: usize,
}

impl<T: Clone> Grid<T> {
    /// Create a grid filled with the given value.
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self { data: vec![fill; width * height], width, height }
    }
}

impl<T> Grid<T> {
    /// Wrap an existing row-major buffer.
    ///
    /// # Panics
    /// Panics if `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), width * height, "grid buffer does not match {width}x{height}");
        Self { data, width, height }
    }

    /// Build a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for r in 0..height {
            for c in 0..width {
                data.push(f(r, c));
            }
        }
        Self { data, width, height }
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: T) {
        let idx = self.index(row, col);
        self.data[idx] = val;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Apply `f` to every cell, producing a grid of the same shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid { data: self.data.iter().map(f).collect(), width: self.width, height: self.height }
    }
}

impl<T: Copy> Grid<T> {
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.width + col]
    }
}

impl Grid<f64> {
    pub fn min_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Linearly stretch the field so it spans `[lo, hi]`.
    ///
    /// Returns `false` and leaves the grid untouched when the field is flat.
    pub fn stretch_to(&mut self, lo: f64, hi: f64) -> bool {
        let min_v = self.min_value();
        let max_v = self.max_value();
        let range = max_v - min_v;
        if range.is_nan() || range <= 0.0 {
            return false;
        }
        for v in &mut self.data {
            *v = (*v - min_v) / range * (hi - lo) + lo;
        }
        true
    }

    pub fn clamp_all(&mut self, lo: f64, hi: f64) {
        for v in &mut self.data {
            *v = v.clamp(lo, hi);
        }
    }
}
