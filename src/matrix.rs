//! Module matrix and symbol metadata.
//!
//! The matrix is a flat, row-major arena of dark/light flags. Every later
//! phase refers to cells by their flat index (`row * size + col`) instead of
//! holding references, so clusters and contours never own cells.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::basics::{PointD, RectD};
use crate::error::{Error, Result};

// ============================================================================
// Symbol version
// ============================================================================

/// Declared symbol version, used to derive the expected side length and the
/// positions of the structural regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolVersion {
    /// Full-size QR symbol, versions 1 through 40 (`17 + 4v` modules).
    Qr(u8),
    /// Micro QR symbol, versions M1 through M4 (`9 + 2v` modules).
    Micro(u8),
    /// Any square matrix without structural regions; every cell is data.
    Plain,
}

impl SymbolVersion {
    /// Expected side length, or `None` for [`Plain`](Self::Plain).
    pub fn size(&self) -> Result<Option<usize>> {
        match *self {
            SymbolVersion::Qr(v) if (1..=40).contains(&v) => Ok(Some(17 + 4 * v as usize)),
            SymbolVersion::Micro(v) if (1..=4).contains(&v) => Ok(Some(9 + 2 * v as usize)),
            SymbolVersion::Plain => Ok(None),
            _ => Err(Error::InvalidVersion {
                version: self.to_string(),
            }),
        }
    }

    /// Check that `matrix` has the side length this version declares.
    pub fn validate(&self, matrix: &ModuleMatrix) -> Result<()> {
        if let Some(expected) = self.size()? {
            if matrix.size() != expected {
                return Err(Error::SizeMismatch {
                    version: self.to_string(),
                    expected,
                    actual: matrix.size(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for SymbolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolVersion::Qr(v) => write!(f, "QR version {v}"),
            SymbolVersion::Micro(v) => write!(f, "Micro QR version M{v}"),
            SymbolVersion::Plain => write!(f, "plain matrix"),
        }
    }
}

// ============================================================================
// Module matrix
// ============================================================================

/// Immutable N×N grid of modules; `true` is dark.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleMatrix {
    size: usize,
    cells: Vec<bool>,
}

impl ModuleMatrix {
    /// Build a matrix from rows. Every row must be as long as there are rows.
    pub fn from_rows<R: AsRef<[bool]>>(rows: &[R]) -> Result<Self> {
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);
        for (row, r) in rows.iter().enumerate() {
            let r = r.as_ref();
            if r.len() != size {
                return Err(Error::NotSquare {
                    row,
                    expected: size,
                    actual: r.len(),
                });
            }
            cells.extend_from_slice(r);
        }
        Ok(Self { size, cells })
    }

    /// Build a matrix from a flat row-major buffer of `size * size` cells.
    pub fn from_flat(size: usize, cells: Vec<bool>) -> Result<Self> {
        if cells.len() != size * size {
            return Err(Error::NotSquare {
                row: cells.len() / size.max(1),
                expected: size,
                actual: cells.len() % size.max(1),
            });
        }
        Ok(Self { size, cells })
    }

    /// Parse an ASCII picture, one line per row. `#`, `X` and `1` are dark;
    /// anything else is light. Blank lines and leading indentation are
    /// ignored, so pictures can be written inline in indented code.
    pub fn from_ascii(text: &str) -> Result<Self> {
        let rows: Vec<Vec<bool>> = text
            .lines()
            .map(|l| l.trim_end())
            .filter(|l| !l.trim().is_empty())
            .map(|l| {
                l.trim_start()
                    .chars()
                    .map(|c| matches!(c, '#' | 'X' | '1'))
                    .collect()
            })
            .collect();
        Self::from_rows(&rows)
    }

    /// An all-light matrix.
    pub fn light(size: usize) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Module state; out-of-bounds coordinates read as light.
    #[inline]
    pub fn get(&self, row: isize, col: isize) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= self.size || col >= self.size {
            return false;
        }
        self.cells[row * self.size + col]
    }

    /// Module state by flat index.
    #[inline]
    pub fn is_dark(&self, idx: usize) -> bool {
        self.cells[idx]
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.size + col
    }

    #[inline]
    pub fn coords(&self, idx: usize) -> (usize, usize) {
        (idx / self.size, idx % self.size)
    }

    pub fn dark_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.cells
    }

    /// Return a copy with one module changed. Used by tests and tooling that
    /// stamp patterns into a matrix.
    pub fn with(mut self, row: usize, col: usize, dark: bool) -> Self {
        let idx = self.index(row, col);
        self.cells[idx] = dark;
        self
    }
}

impl fmt::Display for ModuleMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.size.max(1)) {
            for &dark in row {
                f.write_str(if dark { "#" } else { "." })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

// ============================================================================
// Frame
// ============================================================================

/// Maps module coordinates to output coordinates: each module is `pitch`
/// units square and the symbol is offset by a quiet zone of `quiet_zone`
/// modules on every side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pitch: f64,
    quiet_zone: usize,
}

impl Frame {
    pub fn new(pitch: f64, quiet_zone: usize) -> Result<Self> {
        if !pitch.is_finite() || pitch <= 0.0 {
            return Err(Error::InvalidPitch { value: pitch });
        }
        Ok(Self { pitch, quiet_zone })
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn quiet_zone(&self) -> usize {
        self.quiet_zone
    }

    /// Output position of grid corner `(x, y)`, where `x` counts columns
    /// and `y` counts rows.
    #[inline]
    pub fn corner(&self, x: f64, y: f64) -> PointD {
        let q = self.quiet_zone as f64;
        PointD::new((x + q) * self.pitch, (y + q) * self.pitch)
    }

    /// Output rectangle covered by one module.
    pub fn cell_rect(&self, row: usize, col: usize) -> RectD {
        let tl = self.corner(col as f64, row as f64);
        RectD::new(tl.x, tl.y, tl.x + self.pitch, tl.y + self.pitch)
    }

    /// Full output extent of a `size`-module symbol including the quiet zone.
    pub fn extent(&self, size: usize) -> RectD {
        let side = (size + 2 * self.quiet_zone) as f64 * self.pitch;
        RectD::new(0.0, 0.0, side, side)
    }
}
