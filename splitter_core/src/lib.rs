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
//! Feature-aware AOI splitting: partitions an Area of Interest polygon into
//! task polygons bounded by linear splitters and sized to a target feature
//! count per task. See [`pipeline::run`] for the entry point.
pub mod adjacency;
pub mod config;
pub mod error;
pub mod geom;
pub mod pipeline;
pub mod tags;
pub mod types;

pub use config::SplitConfig;
pub use error::{Result, SplitError};
pub use pipeline::run;
pub use types::{Aoi, Feature, RunMetadata, SplitLine, SplitResult, TaskPolygon};
