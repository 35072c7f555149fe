//! Structural role detection.
//!
//! Assigns every module a [`ModuleRole`] from the symbol version alone:
//! finder patterns, their separators, timing lines, alignment patterns,
//! format and version information areas, the fixed dark module, and the
//! free data region. The matrix contents are not inspected; only its size is
//! checked against the declared version.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matrix::{ModuleMatrix, SymbolVersion};

/// Structural role of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleRole {
    Finder,
    Separator,
    Timing,
    Alignment,
    Format,
    Version,
    DarkModule,
    Data,
}

impl ModuleRole {
    pub const ALL: [ModuleRole; 8] = [
        ModuleRole::Finder,
        ModuleRole::Separator,
        ModuleRole::Timing,
        ModuleRole::Alignment,
        ModuleRole::Format,
        ModuleRole::Version,
        ModuleRole::DarkModule,
        ModuleRole::Data,
    ];

    /// `true` for every role except [`Data`](Self::Data).
    pub fn is_structural(self) -> bool {
        self != ModuleRole::Data
    }

    pub fn name(self) -> &'static str {
        match self {
            ModuleRole::Finder => "finder",
            ModuleRole::Separator => "separator",
            ModuleRole::Timing => "timing",
            ModuleRole::Alignment => "alignment",
            ModuleRole::Format => "format",
            ModuleRole::Version => "version",
            ModuleRole::DarkModule => "dark_module",
            ModuleRole::Data => "data",
        }
    }
}

impl fmt::Display for ModuleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Alignment pattern centres
// ============================================================================

/// Row/column coordinates of alignment pattern centres, indexed by
/// `version - 2`.
#[rustfmt::skip]
static ALIGNMENT_POSITIONS: [&[usize]; 39] = [
    &[6, 18], &[6, 22], &[6, 26], &[6, 30], &[6, 34],
    &[6, 22, 38], &[6, 24, 42], &[6, 26, 46], &[6, 28, 50], &[6, 30, 54],
    &[6, 32, 58], &[6, 34, 62],
    &[6, 26, 46, 66], &[6, 26, 48, 70], &[6, 26, 50, 74], &[6, 30, 54, 78],
    &[6, 30, 56, 82], &[6, 30, 58, 86], &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94], &[6, 26, 50, 74, 98], &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106], &[6, 32, 58, 84, 110], &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122], &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130], &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138], &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150], &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158], &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166], &[6, 30, 58, 86, 114, 142, 170],
];

/// Alignment pattern centres `(row, col)` for a full-size QR version,
/// excluding the three positions covered by finder patterns.
pub fn alignment_centers(version: u8) -> Vec<(usize, usize)> {
    if !(2..=40).contains(&version) {
        return Vec::new();
    }
    let pos = ALIGNMENT_POSITIONS[version as usize - 2];
    let first = pos[0];
    let last = pos[pos.len() - 1];
    let mut out = Vec::with_capacity(pos.len() * pos.len());
    for &r in pos {
        for &c in pos {
            let on_finder = (r == first && c == first)
                || (r == first && c == last)
                || (r == last && c == first);
            if !on_finder {
                out.push((r, c));
            }
        }
    }
    out
}

// ============================================================================
// Role map
// ============================================================================

/// Per-module roles, indexed like the matrix they were detected from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMap {
    size: usize,
    roles: Vec<ModuleRole>,
}

impl RoleMap {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn role(&self, row: usize, col: usize) -> ModuleRole {
        self.roles[row * self.size + col]
    }

    #[inline]
    pub fn role_at(&self, idx: usize) -> ModuleRole {
        self.roles[idx]
    }

    pub fn count(&self, role: ModuleRole) -> usize {
        self.roles.iter().filter(|&&r| r == role).count()
    }

    pub fn as_slice(&self) -> &[ModuleRole] {
        &self.roles
    }
}

/// Classify every module of `matrix` according to `version`.
///
/// Fails with [`Error::SizeMismatch`](crate::Error::SizeMismatch) when the
/// matrix side does not match the version.
pub fn detect(matrix: &ModuleMatrix, version: SymbolVersion) -> Result<RoleMap> {
    version.validate(matrix)?;
    let n = matrix.size();
    let mut roles = vec![ModuleRole::Data; n * n];
    match version {
        SymbolVersion::Qr(v) => mark_qr(&mut roles, n, v),
        SymbolVersion::Micro(_) => mark_micro(&mut roles, n),
        SymbolVersion::Plain => {}
    }
    Ok(RoleMap { size: n, roles })
}

fn mark_qr(roles: &mut [ModuleRole], n: usize, version: u8) {
    let centers = alignment_centers(version);
    for r in 0..n {
        for c in 0..n {
            roles[r * n + c] = qr_role(r, c, n, version, &centers);
        }
    }
}

fn qr_role(r: usize, c: usize, n: usize, version: u8, centers: &[(usize, usize)]) -> ModuleRole {
    let in_corner = |size: usize| {
        (r < size && c < size) || (r < size && c >= n - size) || (r >= n - size && c < size)
    };
    if in_corner(7) {
        return ModuleRole::Finder;
    }
    if in_corner(8) {
        return ModuleRole::Separator;
    }
    if centers
        .iter()
        .any(|&(cr, cc)| r.abs_diff(cr) <= 2 && c.abs_diff(cc) <= 2)
    {
        return ModuleRole::Alignment;
    }
    if r == 6 || c == 6 {
        return ModuleRole::Timing;
    }
    if r == n - 8 && c == 8 {
        return ModuleRole::DarkModule;
    }
    if (r == 8 && (c <= 8 || c >= n - 8)) || (c == 8 && (r <= 8 || r >= n - 7)) {
        return ModuleRole::Format;
    }
    let version_band = n - 11..n - 8;
    if version >= 7
        && ((r < 6 && version_band.contains(&c)) || (c < 6 && version_band.contains(&r)))
    {
        return ModuleRole::Version;
    }
    ModuleRole::Data
}

fn mark_micro(roles: &mut [ModuleRole], n: usize) {
    for r in 0..n {
        for c in 0..n {
            let role = if r < 7 && c < 7 {
                ModuleRole::Finder
            } else if r < 8 && c < 8 {
                ModuleRole::Separator
            } else if r == 0 || c == 0 {
                ModuleRole::Timing
            } else if (r == 8 && (1..=8).contains(&c)) || (c == 8 && (1..=8).contains(&r)) {
                ModuleRole::Format
            } else {
                ModuleRole::Data
            };
            roles[r * n + c] = role;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn qr(version: u8) -> RoleMap {
        let n = 17 + 4 * version as usize;
        detect(&ModuleMatrix::light(n), SymbolVersion::Qr(version)).unwrap()
    }

    #[test]
    fn test_version1_counts() {
        let map = qr(1);
        assert_eq!(map.count(ModuleRole::Finder), 3 * 49);
        assert_eq!(map.count(ModuleRole::Separator), 3 * 15);
        assert_eq!(map.count(ModuleRole::Timing), 2 * 5);
        assert_eq!(map.count(ModuleRole::Alignment), 0);
        assert_eq!(map.count(ModuleRole::DarkModule), 1);
        assert_eq!(map.count(ModuleRole::Format), 30);
        assert_eq!(map.count(ModuleRole::Version), 0);
        // 441 total minus function patterns leaves the 208 data modules of version 1.
        assert_eq!(map.count(ModuleRole::Data), 208);
    }

    #[test]
    fn test_version2_has_single_alignment_pattern() {
        let map = qr(2);
        assert_eq!(alignment_centers(2), vec![(18, 18)]);
        assert_eq!(map.count(ModuleRole::Alignment), 25);
        assert_eq!(map.role(18, 18), ModuleRole::Alignment);
        assert_eq!(map.role(16, 16), ModuleRole::Alignment);
        assert_eq!(map.role(15, 15), ModuleRole::Data);
    }

    #[test]
    fn test_version7_has_version_blocks() {
        let map = qr(7);
        assert_eq!(map.count(ModuleRole::Version), 36);
        assert_eq!(map.role(0, 45 - 11), ModuleRole::Version);
        assert_eq!(map.role(45 - 9, 5), ModuleRole::Version);
        // Alignment patterns on the timing lines win over timing.
        assert_eq!(map.role(6, 22), ModuleRole::Alignment);
        assert_eq!(alignment_centers(7).len(), 6);
    }

    #[test]
    fn test_dark_module_position() {
        let map = qr(3);
        let n = 29;
        assert_eq!(map.role(n - 8, 8), ModuleRole::DarkModule);
        assert_eq!(map.role(8, 6), ModuleRole::Timing);
        assert_eq!(map.role(8, 7), ModuleRole::Format);
    }

    #[test]
    fn test_micro_layout() {
        let map = detect(&ModuleMatrix::light(11), SymbolVersion::Micro(1)).unwrap();
        assert_eq!(map.count(ModuleRole::Finder), 49);
        assert_eq!(map.count(ModuleRole::Separator), 15);
        assert_eq!(map.count(ModuleRole::Timing), 6);
        assert_eq!(map.count(ModuleRole::Format), 15);
        assert_eq!(map.role(0, 10), ModuleRole::Timing);
        assert_eq!(map.role(10, 10), ModuleRole::Data);
    }

    #[test]
    fn test_plain_is_all_data() {
        let map = detect(&ModuleMatrix::light(6), SymbolVersion::Plain).unwrap();
        assert_eq!(map.count(ModuleRole::Data), 36);
        assert!(ModuleRole::ALL.iter().filter(|r| r.is_structural()).count() == 7);
    }

    #[test]
    fn test_size_mismatch_is_structural_error() {
        let err = detect(&ModuleMatrix::light(22), SymbolVersion::Qr(1)).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { expected: 21, actual: 22, .. }));
    }

    #[test]
    fn test_detection_is_deterministic() {
        assert_eq!(qr(10), qr(10));
    }
}
