// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Parsing of provider data source strings.
//!
//! Database providers describe their source as a list of `key=value`
//! options, e.g.
//!
//! ```text
//! dbname='gis' host=db port=5432 srid=2056 type=Polygon table="public"."parcels" (geom) sql=
//! ```
//!
//! File based providers of multi layer containers append the layer as an
//! option instead (`/data/survey.gpkg|layername=parcels`).

use indexmap::IndexMap;

#[cfg(test)]
#[path = "./datasource_test.rs"]
mod datasource_test;

/// Marker in file based provider strings that introduces the layer name.
pub const LAYERNAME_MARKER: &str = "layername=";

/// A parsed database connection string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSourceUri {
    /// Schema of the table, if qualified.
    pub schema: Option<String>,
    /// Unqualified table name.
    pub table: Option<String>,
    /// Geometry column given in parentheses after the table.
    pub geometry_column: Option<String>,
    /// Trailing filter expression (`sql=`), if not empty.
    pub sql: Option<String>,
    /// All remaining options in their original order.
    pub params: IndexMap<String, String>,
}

impl DataSourceUri {
    /// Parse a connection string. Unknown or malformed parts are skipped.
    pub fn parse(uri: &str) -> Self {
        let mut parsed = Self::default();
        let mut rest = uri.trim_start();

        while let Some(eq) = rest.find('=') {
            let key = rest[..eq].trim();
            rest = &rest[eq + 1..];

            match key {
                // sql is always last and may contain anything
                "sql" => {
                    let sql = rest.trim();
                    if !sql.is_empty() {
                        parsed.sql = Some(sql.to_string());
                    }
                    break;
                }
                "table" => {
                    let (first, remaining) = take_value(rest);
                    rest = remaining;
                    if let Some(qualified) = rest.strip_prefix('.') {
                        let (table, remaining) = take_value(qualified);
                        rest = remaining;
                        parsed.schema = Some(first).filter(|s| !s.is_empty());
                        parsed.table = Some(table);
                    } else {
                        parsed.table = Some(first);
                    }

                    let trimmed = rest.trim_start();
                    if let Some(column) = trimmed.strip_prefix('(') {
                        if let Some(end) = column.find(')') {
                            let geometry = column[..end].trim();
                            if !geometry.is_empty() {
                                parsed.geometry_column = Some(geometry.to_string());
                            }
                            rest = &column[end + 1..];
                        }
                    }
                }
                _ => {
                    let (value, remaining) = take_value(rest);
                    rest = remaining;
                    if !key.is_empty() {
                        parsed.params.insert(key.to_string(), value);
                    }
                }
            }
            rest = rest.trim_start();
        }

        parsed
    }

    /// Look up a plain option such as `dbname` or `host`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Read one value, either quoted (`'...'` or `"..."`) or up to the next
/// whitespace, returning it and the unconsumed input.
fn take_value(input: &str) -> (String, &str) {
    let mut chars = input.char_indices().peekable();
    let quote = match chars.peek() {
        Some((_, q @ ('\'' | '"'))) => *q,
        _ => {
            let end = input
                .find(|c: char| c.is_whitespace())
                .unwrap_or(input.len());
            return (input[..end].to_string(), &input[end..]);
        }
    };
    chars.next();

    let mut value = String::new();
    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            if let Some((_, escaped)) = chars.next() {
                value.push(escaped);
            }
        } else if c == quote {
            if matches!(chars.peek(), Some((_, next)) if *next == quote) {
                value.push(quote);
                chars.next();
            } else {
                return (value, &input[idx + c.len_utf8()..]);
            }
        } else {
            value.push(c);
        }
    }
    // unterminated quote swallows the rest
    (value, "")
}

/// Extract the layer name of a multi layer container source string.
///
/// Returns the text after [`LAYERNAME_MARKER`] up to the next `|` option
/// separator, or `None` when the marker is absent or empty.
pub fn layer_name_from_uri(uri: &str) -> Option<String> {
    let (_, after) = uri.split_once(LAYERNAME_MARKER)?;
    let name = after.split('|').next().unwrap_or_default().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
