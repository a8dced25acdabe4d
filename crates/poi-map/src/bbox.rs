use std::fmt::Display;

use geo_types::Coord;
use serde::{Deserialize, Serialize};

use crate::{geodesy, map::MapSurface};

/// Side length in metres of the box built around a location.
pub const DEFAULT_SIDE: f64 = 1500.;

/// Bearing from the centre towards the south-west corner.
const SW_BEARING: f64 = 225.;
/// Bearing from the centre towards the north-east corner.
const NE_BEARING: f64 = 45.;

/// Geographic box given by its south-west and north-east corners.
///
/// The west edge may lie east of the east edge when the box straddles the
/// antimeridian.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    south_west: Coord,
    north_east: Coord,
}

impl BoundingBox {
    pub fn new(south_west: Coord, north_east: Coord) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Approximate square of side `side` metres centred on `center`.
    ///
    /// The corners are destination points at bearings 225° and 45° and distance
    /// `side·√2/2`, so the diagonal measures `side·√2`.
    pub fn around(center: Coord, side: f64) -> Self {
        let half_diagonal = std::f64::consts::SQRT_2 * side / 2.;
        Self {
            south_west: geodesy::destination_point(center, half_diagonal, SW_BEARING),
            north_east: geodesy::destination_point(center, half_diagonal, NE_BEARING),
        }
    }

    pub fn south_west(&self) -> Coord {
        self.south_west
    }

    pub fn north_east(&self) -> Coord {
        self.north_east
    }

    pub fn south(&self) -> f64 {
        self.south_west.y
    }

    pub fn west(&self) -> f64 {
        self.south_west.x
    }

    pub fn north(&self) -> f64 {
        self.north_east.y
    }

    pub fn east(&self) -> f64 {
        self.north_east.x
    }

    /// Great-circle length of the SW–NE diagonal in metres.
    pub fn diagonal(&self) -> f64 {
        geodesy::distance(self.south_west, self.north_east)
    }

    pub fn contains(&self, coord: Coord) -> bool {
        let in_lat = (self.south()..=self.north()).contains(&coord.y);
        let in_lon = if self.west() <= self.east() {
            (self.west()..=self.east()).contains(&coord.x)
        } else {
            coord.x >= self.west() || coord.x <= self.east()
        };
        in_lat && in_lon
    }
}

/// Overpass bbox filter: `(south,west,north,east)`.
impl Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{},{},{})",
            self.south(),
            self.west(),
            self.north(),
            self.east()
        )
    }
}

/// How the query box for a location is derived.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum BboxMode {
    /// Square of `side` metres around the location.
    Centered { side: f64 },
    /// Whatever the map currently shows.
    Viewport,
}

impl Default for BboxMode {
    fn default() -> Self {
        Self::Centered { side: DEFAULT_SIDE }
    }
}

impl BboxMode {
    /// Box around `center`. Only meaningful for [`BboxMode::Centered`].
    pub fn centered(&self, center: Coord) -> Option<BoundingBox> {
        match self {
            Self::Centered { side } => Some(BoundingBox::around(center, *side)),
            Self::Viewport => None,
        }
    }

    /// Visible bounds of `surface`. Only meaningful for [`BboxMode::Viewport`].
    pub fn from_viewport(&self, surface: &impl MapSurface) -> Option<BoundingBox> {
        match self {
            Self::Viewport => surface.viewport(),
            Self::Centered { .. } => None,
        }
    }
}
