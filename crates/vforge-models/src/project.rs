//! Per-project settings: asset paths and branding.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Music bed paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicPaths {
    /// Background music under the chapters (the "A-roll" bed).
    pub a_roll_background: PathBuf,
    /// Music under the b-roll intro/outro (the "B-roll" bed).
    pub b_roll_background: PathBuf,
}

/// Branding text substituted into the title overlay.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Branding {
    #[serde(default)]
    pub title_line1: String,
    #[serde(default)]
    pub title_line2: String,
}

/// Optional per-project overrides for template volume levels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioLevels {
    #[serde(default)]
    pub b_roll_music_volume: Option<f64>,
    #[serde(default)]
    pub background_music_volume: Option<f64>,
    #[serde(default)]
    pub voice_volume: Option<f64>,
}

/// Overlay asset paths supplied by the project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlayPaths {
    #[serde(default)]
    pub title_svg_template: Option<PathBuf>,
    #[serde(default)]
    pub logo: Option<PathBuf>,
    #[serde(default)]
    pub bottom_logo: Option<PathBuf>,
    #[serde(default)]
    pub subscribe: Option<PathBuf>,
}

/// Per-project configuration, loaded once at process start and treated
/// as immutable input by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Assembly template file name; the default template applies when
    /// absent.
    #[serde(default)]
    pub assembly_template: Option<String>,

    /// B-roll source video, trimmed for intro and outro filler.
    pub b_roll_video: PathBuf,

    /// Talking-head intro clip and its voice track.
    pub intro_video: PathBuf,
    pub intro_voice: PathBuf,

    /// Talking-head outro clip and its voice track.
    pub outro_video: PathBuf,
    pub outro_voice: PathBuf,

    /// Directory holding `chapter_N` video/voice pairs.
    #[serde(default = "default_chapters_dir")]
    pub chapters_dir: PathBuf,

    pub music: MusicPaths,

    #[serde(default)]
    pub branding: Branding,

    #[serde(default)]
    pub audio_levels: AudioLevels,

    #[serde(default)]
    pub overlays: OverlayPaths,
}

fn default_chapters_dir() -> PathBuf {
    PathBuf::from("chapters")
}

impl ProjectConfig {
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Resolve every relative path against the project directory.
    pub fn resolve_paths(&mut self, base: &Path) {
        fn resolve(path: &mut PathBuf, base: &Path) {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        fn resolve_opt(path: &mut Option<PathBuf>, base: &Path) {
            if let Some(p) = path {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        }

        resolve(&mut self.b_roll_video, base);
        resolve(&mut self.intro_video, base);
        resolve(&mut self.intro_voice, base);
        resolve(&mut self.outro_video, base);
        resolve(&mut self.outro_voice, base);
        resolve(&mut self.chapters_dir, base);
        resolve(&mut self.music.a_roll_background, base);
        resolve(&mut self.music.b_roll_background, base);
        resolve_opt(&mut self.overlays.title_svg_template, base);
        resolve_opt(&mut self.overlays.logo, base);
        resolve_opt(&mut self.overlays.bottom_logo, base);
        resolve_opt(&mut self.overlays.subscribe, base);
    }
}
