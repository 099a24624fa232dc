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
//! Tags arrive as a heterogeneous key-value mapping whose values may be
//! scalar or nested; the core only ever reads a flat
//! `HashMap<String, String>`.
use serde_json::Value;

use crate::types::Tags;

/// Flattens a `serde_json::Value` object into the core's flat tag map. Scalar
/// values (string/number/bool/null) become their natural string form; any
/// array or nested object is JSON-encoded into its string.
pub fn normalize_tags(value: &Value) -> Tags {
    let mut out = Tags::new();
    let Value::Object(map) = value else {
        return out;
    };
    for (k, v) in map {
        let flattened = match v {
            Value::String(s) => s.clone(),
            Value::Null => continue, // absent tag, not an empty string
            Value::Bool(_) | Value::Number(_) => v.to_string(),
            Value::Array(_) | Value::Object(_) => v.to_string(),
        };
        out.insert(k.clone(), flattened);
    }
    out
}

/// `tags.building IS NOT NULL`, the Feature retention rule.
pub fn has_building_tag(tags: &Tags) -> bool {
    tags.get("building").map(|v| !v.is_empty()).unwrap_or(false)
}
