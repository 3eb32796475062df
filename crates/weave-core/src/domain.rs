//! Domains: handles to an integer field-element count (spec §3 "Domain").
//!
//! Created by identity-capability blocks (`DomainN`, `GridDomain`,
//! `SVGSampleDomain`) during pass6 block lowering and referenced by field
//! expressions and broadcast nodes. A domain is nothing more than an
//! element count plus an optional sampler describing how element `i` maps
//! to a position (used by `GridDomain` and friends); the count is what
//! `FieldOp::Broadcast`/`Map`/`Zip` actually need to allocate a buffer.

/// A domain descriptor: an element count plus optional layout metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainDesc {
    /// Number of elements in this domain.
    pub count: u32,
    /// Human-readable layout hint for debug dumps (e.g. `"grid 5x5"`).
    pub layout: DomainLayout,
}

/// How a domain's elements are laid out in space, if at all.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainLayout {
    /// No particular spatial layout (a plain `DomainN`).
    Flat,
    /// A row-major 2D grid with the given `(rows, cols, spacing, origin)`.
    Grid {
        /// Number of rows.
        rows: u32,
        /// Number of columns.
        cols: u32,
        /// Spacing between adjacent grid points, in local units.
        spacing: f32,
        /// World-space origin of the grid's top-left element.
        origin: (f32, f32),
    },
}

impl DomainDesc {
    /// Builds a flat domain of `count` elements with no spatial layout.
    #[must_use]
    pub const fn flat(count: u32) -> Self {
        Self { count, layout: DomainLayout::Flat }
    }

    /// Builds a row-major grid domain; `count = rows * cols`.
    #[must_use]
    pub const fn grid(rows: u32, cols: u32, spacing: f32, origin: (f32, f32)) -> Self {
        Self { count: rows * cols, layout: DomainLayout::Grid { rows, cols, spacing, origin } }
    }

    /// Returns the `(x, y)` position of element `index` for a `Grid` layout,
    /// or `None` for a `Flat` layout (nothing to sample from).
    #[must_use]
    pub fn grid_position(&self, index: u32) -> Option<(f32, f32)> {
        match self.layout {
            DomainLayout::Flat => None,
            DomainLayout::Grid { cols, spacing, origin, .. } => {
                let row = index / cols;
                let col = index % cols;
                Some((
                    origin.0 + (col as f32) * spacing,
                    origin.1 + (row as f32) * spacing,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_5x5_has_25_elements() {
        let d = DomainDesc::grid(5, 5, 60.0, (400.0, 300.0));
        assert_eq!(d.count, 25);
    }

    #[test]
    fn grid_position_maps_row_major() {
        let d = DomainDesc::grid(5, 5, 60.0, (400.0, 300.0));
        assert_eq!(d.grid_position(0), Some((400.0, 300.0)));
        assert_eq!(d.grid_position(1), Some((460.0, 300.0)));
        assert_eq!(d.grid_position(5), Some((400.0, 360.0)));
    }

    #[test]
    fn flat_domain_has_no_grid_position() {
        let d = DomainDesc::flat(10);
        assert_eq!(d.grid_position(0), None);
    }
}
