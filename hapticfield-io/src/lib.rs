//! Scene loading for hapticfield
//!
//! This crate turns scene descriptions into frozen [`ObstacleSet`]s. Loading
//! happens once, before the servo loop starts; any error here aborts startup.

pub mod scene;
pub mod error;

pub use error::*;
pub use scene::{SceneReader, SceneRecords};

use hapticfield_core::{ObstacleSet, SceneConfig};
use std::path::Path;

/// Result type for scene loading
pub type Result<T> = std::result::Result<T, SceneError>;

/// Trait for readers that produce obstacle sets from files
pub trait ObstacleReader {
    /// Read the obstacles stored at `path`
    fn read_obstacles(&self, path: &Path, config: &SceneConfig) -> Result<ObstacleSet>;

    /// Check whether this reader handles `path`
    fn can_read(&self, path: &Path) -> bool;

    /// Short name of the format
    fn format_name(&self) -> &'static str;
}

/// Auto-detect format and read obstacles
pub fn read_obstacles<P: AsRef<Path>>(path: P, config: &SceneConfig) -> Result<ObstacleSet> {
    let path = path.as_ref();
    let readers: [&dyn ObstacleReader; 1] = [&SceneReader];

    match readers.iter().find(|reader| reader.can_read(path)) {
        Some(reader) => reader.read_obstacles(path, config),
        None => Err(SceneError::UnsupportedFormat {
            format: format!("{:?}", path.extension()),
        }),
    }
}

/// Read the obstacles named by the scene section of a configuration
pub fn load_scene(config: &SceneConfig) -> Result<ObstacleSet> {
    read_obstacles(&config.path, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unsupported_extension() {
        let err = read_obstacles("scene.ply", &SceneConfig::default()).unwrap_err();
        assert!(matches!(err, SceneError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_load_scene_from_config() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "v 0 0 0\nv 1 1 1").unwrap();
        file.flush().unwrap();

        let config = SceneConfig {
            path: file.path().to_path_buf(),
            ..SceneConfig::default()
        };
        let set = load_scene(&config).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_registry_traits() {
        let reader = SceneReader;
        assert_eq!(reader.format_name(), "scene");
        assert!(reader.can_read(Path::new("curves.obj")));
        assert!(reader.can_read(Path::new("curves.OBJ")));
        assert!(reader.can_read(Path::new("points.xyz")));
        assert!(!reader.can_read(Path::new("mesh.ply")));
        assert!(!reader.can_read(Path::new("no_extension")));
    }

    #[test]
    fn test_scene_error_converts_to_core_error() {
        let err: hapticfield_core::Error = SceneError::Empty { path: "a.obj".into() }.into();
        assert!(matches!(err, hapticfield_core::Error::Scene(_)));
    }
}
