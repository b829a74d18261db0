//! Scene file I/O

use std::fs;
use std::path::Path;

use log::debug;

use super::SceneFile;
use crate::error::RenderResult;

/// Load and validate a scene from a RON file
pub fn load_scene<P: AsRef<Path>>(path: P) -> RenderResult<SceneFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let scene = load_scene_from_str(&contents)?;
    debug!("loaded scene {:?}: {} models", path.as_ref(), scene.models.len());
    Ok(scene)
}

/// Save a scene to a RON file
pub fn save_scene<P: AsRef<Path>>(scene: &SceneFile, path: P) -> RenderResult<()> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(5)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(scene, config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load a scene from a RON string (for embedded scenes or testing)
pub fn load_scene_from_str(s: &str) -> RenderResult<SceneFile> {
    let scene: SceneFile = ron::from_str(s)?;
    scene.validate()?;
    Ok(scene)
}
