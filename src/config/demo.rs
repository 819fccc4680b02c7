use crate::error::{Result, TrackerError};
use crate::overlay::OverlayOptions;
use crate::tracker::TrackerConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where to write the emitted regions and cycle reports.
    pub json_out: Option<PathBuf>,
    /// Directory for per-frame overlay PNGs.
    pub overlay_dir: Option<PathBuf>,
    pub overlay: OverlayOptions,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DemoConfig {
    /// Template (secondary) image.
    pub template: PathBuf,
    /// Live (primary) frames, processed in order.
    pub frames: Vec<PathBuf>,
    /// Timestamp step between consecutive frames.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: i64,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

fn default_frame_interval_ms() -> i64 {
    33
}

/// Read and validate the demo configuration at `path`.
pub fn load_config(path: &Path) -> Result<DemoConfig> {
    let contents = read(path)?;
    let config: DemoConfig = serde_json::from_str(&contents)?;
    config.tracker.validate()?;
    if config.frames.is_empty() {
        return Err(TrackerError::Config(format!(
            "{}: frames must list at least one image",
            path.display()
        )));
    }
    Ok(config)
}

/// Read and validate a tracker configuration at `path`.
pub fn load_tracker_config(path: &Path) -> Result<TrackerConfig> {
    let contents = read(path)?;
    let config: TrackerConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        TrackerError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config {}: {e}", path.display()),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "planar-tracker-{}-{name}",
            std::process::id()
        ));
        fs::write(&path, contents).expect("write temp config");
        path
    }

    #[test]
    fn loads_demo_config_with_defaults() {
        let path = write_temp(
            "demo.json",
            r#"{
                "template": "template.png",
                "frames": ["f0.png", "f1.png"],
                "tracker": { "matcher": { "kind": "lsh" } }
            }"#,
        );
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.frames.len(), 2);
        assert_eq!(cfg.frame_interval_ms, 33);
        assert!(cfg.output.json_out.is_none());
        assert!(cfg.output.overlay_dir.is_none());
        assert_eq!(cfg.output.overlay.opacity, 1.0);
        assert!(matches!(
            cfg.tracker.matcher,
            crate::matching::MatcherConfig::Lsh(_)
        ));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn invalid_tracker_options_fail_to_load() {
        let path = write_temp(
            "bad.json",
            r#"{ "session": { "worker_pool_size": 0 } }"#,
        );
        assert!(matches!(
            load_tracker_config(&path),
            Err(TrackerError::Config(_))
        ));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn overlay_output_is_parsed() {
        let path = write_temp(
            "overlay.json",
            r#"{
                "template": "t.png",
                "frames": ["f.png"],
                "output": { "overlay_dir": "out/overlays", "overlay": { "opacity": 0.5 } }
            }"#,
        );
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.output.overlay_dir, Some(PathBuf::from("out/overlays")));
        assert_eq!(cfg.output.overlay.opacity, 0.5);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_tracker_config(Path::new("/nonexistent/tracker.json"))
            .expect_err("missing");
        assert!(matches!(err, TrackerError::Io(_)));
    }
}
