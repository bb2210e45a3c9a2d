//! Board store: the grid of cells and their occupants.

use serde::{Deserialize, Serialize};

/// A coordinate on the board.
///
/// Coordinates are signed so that rays and neighbours can step off the grid;
/// the board decides what such a location resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Row (grows southwards).
    pub row: i32,
    /// Column (grows eastwards).
    pub col: i32,
}

impl Location {
    /// Create a new location.
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// The neighbouring location one step in `dir`.
    #[must_use]
    pub const fn step(self, dir: Direction) -> Self {
        self.offset(dir, 1)
    }

    /// The location `distance` steps away in `dir`.
    #[must_use]
    pub const fn offset(self, dir: Direction, distance: i32) -> Self {
        let (dr, dc) = dir.delta();
        Self {
            row: self.row + dr * distance,
            col: self.col + dc * distance,
        }
    }

    /// Chebyshev (king-move) distance to another location.
    #[must_use]
    pub fn chebyshev(self, other: Self) -> u32 {
        self.row
            .abs_diff(other.row)
            .max(self.col.abs_diff(other.col))
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One of the eight compass directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// North.
    N,
    /// North-east.
    NE,
    /// East.
    E,
    /// South-east.
    SE,
    /// South.
    S,
    /// South-west.
    SW,
    /// West.
    W,
    /// North-west.
    NW,
}

impl Direction {
    /// All eight directions, clockwise from north.
    pub const ALL: [Self; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    /// Unit `(row, col)` delta for this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::N => (-1, 0),
            Self::NE => (-1, 1),
            Self::E => (0, 1),
            Self::SE => (1, 1),
            Self::S => (1, 0),
            Self::SW => (1, -1),
            Self::W => (0, -1),
            Self::NW => (-1, -1),
        }
    }

    /// The direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::N => Self::S,
            Self::NE => Self::SW,
            Self::E => Self::W,
            Self::SE => Self::NW,
            Self::S => Self::N,
            Self::SW => Self::NE,
            Self::W => Self::E,
            Self::NW => Self::SE,
        }
    }

    /// Best single-step direction from `from` towards `to`, if they differ.
    #[must_use]
    pub fn towards(from: Location, to: Location) -> Option<Self> {
        let dr = (to.row - from.row).signum();
        let dc = (to.col - from.col).signum();
        Self::ALL.into_iter().find(|dir| dir.delta() == (dr, dc))
    }
}

/// How coordinates outside `[0, size)` are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Addressing {
    /// Off-grid coordinates resolve to a wall.
    #[default]
    Clip,
    /// Coordinates wrap around modulo the board size.
    Wrap,
}

/// What a cell holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Occupant {
    /// Nothing.
    #[default]
    Empty,
    /// A mine dealing the given raw damage.
    Mine(u32),
    /// A tank, by name.
    Tank(String),
    /// Outside the grid under clipped addressing. Never stored.
    Wall,
}

impl Occupant {
    /// Whether the cell holds nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The coarse classification of this occupant, or `None` for empty cells.
    #[must_use]
    pub const fn kind(&self) -> Option<OccupantKind> {
        match self {
            Self::Empty => None,
            Self::Mine(_) => Some(OccupantKind::Mine),
            Self::Tank(_) => Some(OccupantKind::Tank),
            Self::Wall => Some(OccupantKind::Wall),
        }
    }
}

/// Occupant classification exposed to sensors and renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupantKind {
    /// A tank.
    Tank,
    /// A mine.
    Mine,
    /// The edge of the world.
    Wall,
}

impl std::fmt::Display for OccupantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Tank => "tank",
            Self::Mine => "mine",
            Self::Wall => "wall",
        };
        f.write_str(name)
    }
}

/// The arena grid.
#[derive(Debug, Clone)]
pub struct Board {
    /// Side length of the square board.
    size: u16,
    /// Off-grid handling.
    addressing: Addressing,
    /// Cells stored in row-major order. Never holds `Occupant::Wall`.
    cells: Vec<Occupant>,
}

impl Board {
    /// Create an empty board.
    ///
    /// Returns `None` if `size` is smaller than 2.
    #[must_use]
    pub fn new(size: u16, addressing: Addressing) -> Option<Self> {
        if size < 2 {
            return None;
        }

        let count = usize::from(size) * usize::from(size);
        Some(Self {
            size,
            addressing,
            cells: vec![Occupant::Empty; count],
        })
    }

    /// Side length of the board.
    #[must_use]
    pub const fn size(&self) -> u16 {
        self.size
    }

    /// Addressing mode of the board.
    #[must_use]
    pub const fn addressing(&self) -> Addressing {
        self.addressing
    }

    /// Resolve a location to its canonical on-grid form.
    ///
    /// Under wrapping every location resolves; under clipping off-grid
    /// locations resolve to `None`.
    #[must_use]
    pub fn resolve(&self, loc: Location) -> Option<Location> {
        let size = i32::from(self.size);
        match self.addressing {
            Addressing::Wrap => Some(Location::new(
                loc.row.rem_euclid(size),
                loc.col.rem_euclid(size),
            )),
            Addressing::Clip => {
                let inside = (0..size).contains(&loc.row) && (0..size).contains(&loc.col);
                inside.then_some(loc)
            }
        }
    }

    /// Chebyshev distance between two locations on this board.
    ///
    /// Under wrapping each axis takes the shorter way round, so every
    /// spelling of a cell is the same distance away.
    #[must_use]
    pub fn distance(&self, a: Location, b: Location) -> u32 {
        match self.addressing {
            Addressing::Clip => a.chebyshev(b),
            Addressing::Wrap => {
                let size = i32::from(self.size);
                let axis = |x: i32, y: i32| {
                    let d = (x.rem_euclid(size) - y.rem_euclid(size)).rem_euclid(size);
                    d.min(size - d).unsigned_abs()
                };
                axis(a.row, b.row).max(axis(a.col, b.col))
            }
        }
    }

    /// Index into the cell vector.
    fn index(&self, loc: Location) -> Option<usize> {
        self.resolve(loc).and_then(|loc| {
            let row = usize::try_from(loc.row).ok()?;
            let col = usize::try_from(loc.col).ok()?;
            Some(row * usize::from(self.size) + col)
        })
    }

    /// What occupies `loc`. Off-grid locations under clipping are walls.
    #[must_use]
    pub fn occupant_at(&self, loc: Location) -> &Occupant {
        const WALL: &Occupant = &Occupant::Wall;
        self.index(loc)
            .and_then(|idx| self.cells.get(idx))
            .unwrap_or(WALL)
    }

    /// Put an occupant on `loc`, replacing whatever was there.
    ///
    /// Returns `false` if `loc` is off-grid or `occupant` is a wall.
    pub fn place(&mut self, loc: Location, occupant: Occupant) -> bool {
        if occupant == Occupant::Wall {
            return false;
        }
        match self.index(loc).and_then(|idx| self.cells.get_mut(idx)) {
            Some(cell) => {
                *cell = occupant;
                true
            }
            None => false,
        }
    }

    /// Empty `loc`, returning what was there.
    pub fn clear(&mut self, loc: Location) -> Occupant {
        self.index(loc)
            .and_then(|idx| self.cells.get_mut(idx))
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Iterate over every on-grid location and its occupant, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Location, &Occupant)> {
        let size = usize::from(self.size);
        self.cells.iter().enumerate().map(move |(idx, cell)| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let loc = Location::new((idx / size) as i32, (idx % size) as i32);
            (loc, cell)
        })
    }

    /// Every empty on-grid location.
    #[must_use]
    pub fn empty_cells(&self) -> Vec<Location> {
        self.iter()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(loc, _)| loc)
            .collect()
    }
}
