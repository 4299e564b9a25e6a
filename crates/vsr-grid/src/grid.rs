use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Key {
    pub x: i32,
    pub y: i32,
}

impl Key {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Orthogonal neighbours in the fixed order N, E, S, W.
    pub fn neighbours(self) -> [Key; 4] {
        [
            self.translated(0, 1),
            self.translated(1, 0),
            self.translated(0, -1),
            self.translated(-1, 0),
        ]
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Fixed-size `w × h` array of optional cells.
///
/// `y` grows upwards. Every iteration is x-major: all of column 0 bottom to
/// top, then column 1, and so on.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Grid<T> {
    w: usize,
    h: usize,
    cells: Vec<Option<T>>,
}

impl<T> Grid<T> {
    pub fn new(w: usize, h: usize) -> Self {
        Self::from_fn(w, h, |_| None)
    }

    pub fn from_fn(w: usize, h: usize, mut f: impl FnMut(Key) -> Option<T>) -> Self {
        let mut cells = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                cells.push(f(Key::new(x as i32, y as i32)));
            }
        }
        Self { w, h, cells }
    }

    pub fn w(&self) -> usize {
        self.w
    }

    pub fn h(&self) -> usize {
        self.h
    }

    pub fn in_bounds(&self, key: Key) -> bool {
        key.x >= 0 && key.y >= 0 && (key.x as usize) < self.w && (key.y as usize) < self.h
    }

    fn idx(&self, key: Key) -> Option<usize> {
        if !self.in_bounds(key) {
            return None;
        }
        Some(key.y as usize * self.w + key.x as usize)
    }

    /// The value at `key`, or `None` if the cell is empty or out of bounds.
    pub fn get(&self, key: Key) -> Option<&T> {
        self.idx(key).and_then(|i| self.cells[i].as_ref())
    }

    pub fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        let i = self.idx(key)?;
        self.cells[i].as_mut()
    }

    pub fn is_occupied(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    /// Store `value` at `key`, returning the previous value. Out-of-bounds
    /// writes are dropped.
    pub fn set(&mut self, key: Key, value: Option<T>) -> Option<T> {
        let i = self.idx(key)?;
        std::mem::replace(&mut self.cells[i], value)
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> {
        let (w, h) = (self.w, self.h);
        (0..w).flat_map(move |x| (0..h).map(move |y| Key::new(x as i32, y as i32)))
    }

    /// Every cell, empty ones included.
    pub fn entries(&self) -> impl Iterator<Item = (Key, Option<&T>)> + '_ {
        self.keys().map(move |k| (k, self.get(k)))
    }

    /// Occupied cells only.
    pub fn occupied(&self) -> impl Iterator<Item = (Key, &T)> + '_ {
        self.keys().filter_map(move |k| self.get(k).map(|v| (k, v)))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.occupied().map(|(_, v)| v)
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.w == other.w && self.h == other.h
    }

    pub fn map<U>(&self, mut f: impl FnMut(Key, &T) -> Option<U>) -> Grid<U> {
        Grid::from_fn(self.w, self.h, |k| self.get(k).and_then(|v| f(k, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_x_major() {
        let grid: Grid<()> = Grid::new(2, 3);
        let keys: Vec<(i32, i32)> = grid.keys().map(|k| (k.x, k.y)).collect();
        assert_eq!(keys, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn out_of_bounds_is_empty() {
        let mut grid = Grid::from_fn(2, 2, |k| Some(k.x + k.y));
        assert_eq!(grid.get(Key::new(1, 1)), Some(&2));
        assert_eq!(grid.get(Key::new(-1, 0)), None);
        assert_eq!(grid.get(Key::new(0, 2)), None);
        assert_eq!(grid.set(Key::new(5, 5), Some(9)), None);
        assert_eq!(grid.count(), 4);
    }
}
