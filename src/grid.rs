use rand::Rng;
use std::fmt;

/// Largest board side length
pub const MAX_SIZE: usize = 27;

/// A display-ready RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Sample each channel uniformly over 0-255
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen(), rng.gen(), rng.gen())
    }

    /// `#rrggbb` form
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Perceived brightness (0-255), used to pick readable text on a swatch
    pub fn luma(&self) -> u8 {
        ((self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114) / 1000) as u8
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Identity of a cell: which grid generation it belongs to and its position in it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId {
    pub generation: u64,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub id: CellId,
    pub color: Rgb,
}

/// Square board of cells stored row-major
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Grid with no cells (size 0)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }
}

/// Build a `size` x `size` grid with independently random colors.
///
/// `generation` is stamped into every cell id; callers bump it per call so ids
/// never repeat between grids.
pub fn generate<R: Rng + ?Sized>(size: usize, generation: u64, rng: &mut R) -> Grid {
    let cells = (0..size * size)
        .map(|i| Cell {
            id: CellId {
                generation,
                index: i as u32,
            },
            color: Rgb::random(rng),
        })
        .collect();
    Grid { size, cells }
}

/// Uniformly pick a cell index. The grid must not be empty.
pub fn pick_target<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> usize {
    debug_assert!(!grid.is_empty(), "pick_target on an empty grid");
    rng.gen_range(0..grid.len())
}
