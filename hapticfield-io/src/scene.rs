//! Line-oriented scene format
//!
//! A scene is a text file with one obstacle per record. Each record starts
//! with a two character tag (`v ` in OBJ vertex lists) followed by at least
//! three whitespace separated numbers `x y z`; extra fields are ignored. Blank
//! lines and `#` comments are skipped.
//!
//! Records are parsed in a single streaming pass and appended to an
//! [`ObstacleSetBuilder`] that applies the scene transform, so the resulting
//! set always has exactly as many obstacles as there were records.

use crate::{ObstacleReader, Result, SceneError};
use hapticfield_core::{ObstacleSet, ObstacleSetBuilder, Point3d, SceneConfig};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::{debug, info};

/// Width of the tag that precedes the coordinates of a record
const RECORD_TAG_WIDTH: usize = 2;

/// OBJ vertex tag
const VERTEX_TAG: &str = "v ";

/// Scene reader implementation
pub struct SceneReader;

impl SceneReader {
    /// Read a scene file into a frozen obstacle set
    pub fn read_obstacles<P: AsRef<Path>>(path: P, config: &SceneConfig) -> Result<ObstacleSet> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SceneError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => SceneError::Io(e),
        })?;

        let obstacles = Self::read_from(BufReader::new(file), config)?;
        if obstacles.is_empty() && config.require_obstacles {
            return Err(SceneError::Empty {
                path: path.display().to_string(),
            });
        }

        info!("Loaded {} obstacles from {}", obstacles.len(), path.display());
        Ok(obstacles)
    }

    /// Read scene records from any buffered source
    pub fn read_from<R: BufRead>(reader: R, config: &SceneConfig) -> Result<ObstacleSet> {
        let mut builder = ObstacleSetBuilder::new().with_transform(config.transform());
        for record in SceneRecords::new(reader, config.vertex_records_only) {
            builder.push(record?);
        }
        Ok(builder.freeze())
    }

    /// Parse the coordinates of a single record, untransformed
    pub fn parse_record(line: &str, line_number: usize) -> Result<Point3d> {
        let fields = match line.char_indices().nth(RECORD_TAG_WIDTH) {
            Some((offset, _)) => &line[offset..],
            None => {
                return Err(SceneError::Parse {
                    line: line_number,
                    message: format!("record {:?} is too short", line),
                })
            }
        };

        let mut coords = [0.0f64; 3];
        let mut parts = fields.split_whitespace();
        for (axis, coord) in ["x", "y", "z"].iter().zip(coords.iter_mut()) {
            let part = parts.next().ok_or_else(|| SceneError::Parse {
                line: line_number,
                message: format!("missing {} coordinate", axis),
            })?;
            let value = part.parse::<f64>().map_err(|_| SceneError::Parse {
                line: line_number,
                message: format!("invalid {} coordinate {:?}", axis, part),
            })?;
            if !value.is_finite() {
                return Err(SceneError::Parse {
                    line: line_number,
                    message: format!("non-finite {} coordinate {:?}", axis, part),
                });
            }
            *coord = value;
        }

        Ok(Point3d::from(coords))
    }
}

impl ObstacleReader for SceneReader {
    fn read_obstacles(&self, path: &Path, config: &SceneConfig) -> Result<ObstacleSet> {
        Self::read_obstacles(path, config)
    }

    fn can_read(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
            matches!(ext.to_lowercase().as_str(), "obj" | "txt" | "xyz")
        } else {
            false
        }
    }

    fn format_name(&self) -> &'static str {
        "scene"
    }
}

/// Streaming iterator over the records of a scene
pub struct SceneRecords<R> {
    lines: Lines<R>,
    line_number: usize,
    vertex_records_only: bool,
    skipped: usize,
}

impl<R: BufRead> SceneRecords<R> {
    pub fn new(reader: R, vertex_records_only: bool) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            vertex_records_only,
            skipped: 0,
        }
    }

    /// Number of non-vertex records skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for SceneRecords<R> {
    type Item = Result<Point3d>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(SceneError::Io(e))),
            };
            self.line_number += 1;

            let record = line.trim_end();
            if record.trim_start().is_empty() || record.trim_start().starts_with('#') {
                continue;
            }
            if self.vertex_records_only && !record.starts_with(VERTEX_TAG) {
                self.skipped += 1;
                debug!("Skipping non-vertex record on line {}", self.line_number);
                continue;
            }

            return Some(SceneReader::parse_record(record, self.line_number));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::{Cursor, Write};

    fn config() -> SceneConfig {
        SceneConfig::default()
    }

    #[test]
    fn test_records_are_transformed_in_order() {
        let content = "v 1.0 2.0 3.0\nv -0.5 0.0 4.5\nv 0 0 0\n";
        let set = SceneReader::read_from(Cursor::new(content), &config()).unwrap();

        assert_eq!(set.len(), 3);
        assert_relative_eq!(set[0], Point3d::new(10.0, -5.0, 20.0), epsilon = 1e-12);
        assert_relative_eq!(set[1], Point3d::new(-5.0, 10.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(set[2], Point3d::new(0.0, -35.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_extra_fields_and_whitespace_are_tolerated() {
        let content = "v  1 2 3 1.0\r\n\n# comment\nv\t4 5 6\n";
        let set = SceneReader::read_from(Cursor::new(content), &config()).unwrap();
        assert_eq!(set.len(), 2);
        assert_relative_eq!(set[1], Point3d::new(40.0, 25.0, 50.0), epsilon = 1e-12);
    }

    #[test]
    fn test_missing_coordinate_reports_line() {
        let content = "v 1 2 3\nv 4 5\n";
        let err = SceneReader::read_from(Cursor::new(content), &config()).unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(err.to_string().contains("missing z"));
    }

    #[test]
    fn test_garbage_coordinate_reports_line() {
        let content = "v 1 2 3\n\nv 4 five 6\n";
        let err = SceneReader::read_from(Cursor::new(content), &config()).unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_non_finite_coordinate_is_rejected() {
        let err = SceneReader::parse_record("v 1 inf 3", 9).unwrap_err();
        assert_eq!(err.line(), Some(9));
    }

    #[test]
    fn test_short_record_is_rejected() {
        assert!(SceneReader::parse_record("v", 1).is_err());
    }

    #[test]
    fn test_non_vertex_records_fail_by_default() {
        // Any two character tag is accepted, so "f 1 2 3" still parses as three numbers
        let content = "v 1 2 3\nf 1 2 3\no curve\n";
        let err = SceneReader::read_from(Cursor::new(content), &config()).unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_vertex_records_only_skips_other_tags() {
        let mut config = config();
        config.vertex_records_only = true;
        let content = "o curve\nv 1 2 3\nvn 0 1 0\nf 1 1 1\nv 0 0 0\n";

        let mut records = SceneRecords::new(Cursor::new(content), true);
        let points: Vec<_> = records.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(points, vec![Point3d::new(1.0, 2.0, 3.0), Point3d::origin()]);
        assert_eq!(records.skipped(), 3);

        let set = SceneReader::read_from(Cursor::new(content), &config).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_k_lines_yield_k_obstacles() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        let k = 250;
        for i in 0..k {
            writeln!(file, "v {} {} {}", i as f64 * 0.1, -(i as f64), 0.5).unwrap();
        }
        file.flush().unwrap();

        let set = SceneReader::read_obstacles(file.path(), &config()).unwrap();
        assert_eq!(set.len(), k);
        for (i, obstacle) in set.iter().enumerate() {
            let (x, y, z) = (i as f64 * 0.1, -(i as f64), 0.5);
            assert_relative_eq!(*obstacle, Point3d::new(10.0 * x, 10.0 * z - 35.0, 10.0 * y), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_missing_file() {
        let err = SceneReader::read_obstacles("no/such/scene.obj", &config()).unwrap_err();
        assert!(matches!(err, SceneError::FileNotFound { .. }));
    }

    #[test]
    fn test_empty_scene_policy() {
        let file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();

        let err = SceneReader::read_obstacles(file.path(), &config()).unwrap_err();
        assert!(matches!(err, SceneError::Empty { .. }));

        let mut lenient = config();
        lenient.require_obstacles = false;
        let set = SceneReader::read_obstacles(file.path(), &lenient).unwrap();
        assert!(set.is_empty());
    }
}
