//! Named body layouts.

use core::fmt;

use crate::{Grid, GridError, Key};

/// Names accepted by [`GridShape::parse`], each followed by `-WxH`.
pub const SHAPE_NAMES: [&str; 6] = ["box", "worm", "biped", "tripod", "comb", "t"];

/// Most cells a named shape may ask for.
pub const MAX_SHAPE_CELLS: usize = 1 << 20;

/// Occupancy layout of a grid body.
#[derive(Debug, Clone, PartialEq)]
pub struct GridShape {
    name: String,
    cells: Grid<()>,
}

impl GridShape {
    /// Parse `name-WxH` (see [`SHAPE_NAMES`]) or a free-form layout of `#`
    /// (occupied) and `.` (empty), rows separated by `/` or newlines, top
    /// row first.
    pub fn parse(s: &str) -> Result<Self, GridError> {
        let s = s.trim();
        if s.contains('#') {
            return Self::from_layout(s);
        }
        let (name, size) = s
            .rsplit_once('-')
            .ok_or_else(|| GridError::UnknownShape(s.to_string()))?;
        if !SHAPE_NAMES.contains(&name) {
            return Err(GridError::UnknownShape(s.to_string()));
        }
        let (w, h) = parse_size(s, size)?;
        let occupied: Box<dyn Fn(usize, usize) -> bool> = match name {
            "box" | "worm" => Box::new(|_, _| true),
            // Legs at both ends of the bottom row.
            "biped" => Box::new(move |x, y| y > 0 || x == 0 || x == w - 1),
            "tripod" => Box::new(move |x, y| y > 0 || x == 0 || x == w / 2 || x == w - 1),
            // Teeth on even columns below a full top row.
            "comb" => Box::new(move |x, y| y == h - 1 || x % 2 == 0),
            "t" => Box::new(move |x, y| y == h - 1 || x == w / 2),
            _ => return Err(GridError::UnknownShape(s.to_string())),
        };
        let cells = Grid::from_fn(w, h, |k| occupied(k.x as usize, k.y as usize).then_some(()));
        Ok(Self {
            name: s.to_string(),
            cells,
        })
    }

    fn from_layout(s: &str) -> Result<Self, GridError> {
        let rows: Vec<&str> = s
            .split(|c| c == '/' || c == '\n')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .collect();
        let w = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if w == 0 {
            return Err(invalid(s, "empty layout"));
        }
        if rows.iter().any(|r| r.chars().count() != w) {
            return Err(invalid(s, "rows have different lengths"));
        }
        if let Some(c) = rows.iter().flat_map(|r| r.chars()).find(|c| *c != '#' && *c != '.') {
            return Err(invalid(s, &format!("unexpected character {c:?}")));
        }
        let h = rows.len();
        let cells = Grid::from_fn(w, h, |k| {
            let row = rows[h - 1 - k.y as usize];
            (row.chars().nth(k.x as usize) == Some('#')).then_some(())
        });
        Ok(Self {
            name: s.to_string(),
            cells,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn w(&self) -> usize {
        self.cells.w()
    }

    pub fn h(&self) -> usize {
        self.cells.h()
    }

    pub fn is_occupied(&self, key: Key) -> bool {
        self.cells.is_occupied(key)
    }

    pub fn cells(&self) -> &Grid<()> {
        &self.cells
    }
}

impl fmt::Display for GridShape {
    /// Layout form, top row first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..self.h()).rev() {
            for x in 0..self.w() {
                let c = if self.is_occupied(Key::new(x as i32, y as i32)) { '#' } else { '.' };
                write!(f, "{c}")?;
            }
            if y > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

fn invalid(shape: &str, reason: &str) -> GridError {
    GridError::InvalidShape {
        shape: shape.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_size(shape: &str, size: &str) -> Result<(usize, usize), GridError> {
    let (w, h) = size
        .split_once('x')
        .ok_or_else(|| invalid(shape, "size must be WxH"))?;
    let w: usize = w.parse().map_err(|_| invalid(shape, "width is not a number"))?;
    let h: usize = h.parse().map_err(|_| invalid(shape, "height is not a number"))?;
    if w == 0 || h == 0 {
        return Err(invalid(shape, "size must be positive"));
    }
    if w.checked_mul(h).map_or(true, |cells| cells > MAX_SHAPE_CELLS) {
        return Err(invalid(shape, &format!("more than {MAX_SHAPE_CELLS} cells")));
    }
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn biped_has_two_legs() {
        let shape = GridShape::parse("biped-4x3").unwrap();
        assert_eq!(shape.to_string(), "####\n####\n#..#");
        assert_eq!(shape.cells().count(), 10);
    }

    #[test]
    fn oversized_named_shapes_are_rejected() {
        assert!(matches!(
            GridShape::parse("box-100000x100000"),
            Err(GridError::InvalidShape { .. })
        ));
        assert!(matches!(
            GridShape::parse("worm-18446744073709551615x2"),
            Err(GridError::InvalidShape { .. })
        ));
        assert_eq!(GridShape::parse("worm-1024x1024").unwrap().w(), 1024);
    }

    #[test]
    fn layout_is_top_row_first() {
        let shape = GridShape::parse("##./#..").unwrap();
        assert!(shape.is_occupied(Key::new(0, 0)));
        assert!(shape.is_occupied(Key::new(1, 1)));
        assert!(!shape.is_occupied(Key::new(1, 0)));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(GridShape::parse("blob-2x2"), Err(GridError::UnknownShape(_))));
        assert!(matches!(GridShape::parse("box-0x2"), Err(GridError::InvalidShape { .. })));
        assert!(matches!(GridShape::parse("##/#"), Err(GridError::InvalidShape { .. })));
    }
}
