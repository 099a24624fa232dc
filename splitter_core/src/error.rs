/*
This file is part of the AOI Splitter
Copyright (C) 2022 Novel-T

The AOI Splitter is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/
use thiserror::Error;

/// One variant per failure kind named in the pipeline's error handling design.
#[derive(Error, Debug)]
pub enum SplitError {
    #[error("AOI geometry is invalid or empty: {0}")]
    InvalidInputGeometry(String),

    #[error("no building-tagged features found inside the AOI")]
    EmptyFeatureSet,

    #[error("no linear splitters intersect the AOI; proceeding with a single SubPolygon")]
    NoLinearSplitters,

    #[error("voronoi computation failed after {attempts} attempt(s) at segmentize length {last_segmentize_deg}: {source}")]
    VoronoiNumericFailure {
        attempts: u32,
        last_segmentize_deg: f64,
        #[source]
        source: geos::Error,
    },

    #[error("geometry backend communication failure: {0}")]
    BackendCommunicationFailure(#[from] geos::Error),

    #[error("straight-skeleton negative-space fill is not implemented; this core uses Voronoi only")]
    StraightSkeletonUnimplemented,
}

pub type Result<T> = std::result::Result<T, SplitError>;
