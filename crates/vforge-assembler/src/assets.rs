//! Project asset loading: configuration, templates, chapter
//! discovery, and overlay preparation.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};
use vforge_models::{
    Anchor, AnchorPoint, Asset, AssemblyTemplate, AudioLevels, Branding, Chapter, OverlayTemplate,
    OverlayWindow, ProjectConfig, SectionId,
};
use vforge_timeline::OverlaySpec;

use crate::error::{AssemblerError, AssemblerResult};

const PROJECT_CONFIG_FILE: &str = "project-config.json";

/// Voice and video extensions tried for `chapter_N` pairs, in order.
const VOICE_EXTENSIONS: [&str; 2] = ["wav", "mp3"];
const VIDEO_EXTENSIONS: [&str; 2] = ["mov", "mp4"];

/// Load the project config and resolve its paths against the project
/// directory.
pub fn load_project(project_dir: &Path) -> AssemblerResult<ProjectConfig> {
    let path = project_dir.join(PROJECT_CONFIG_FILE);
    let raw = std::fs::read_to_string(&path).map_err(|e| AssemblerError::read_file(&path, e))?;
    let mut config = ProjectConfig::from_json(&raw)?;
    config.resolve_paths(project_dir);
    Ok(config)
}

/// Load the assembly template named by the project, or the standard
/// one, and apply the project's audio level overrides.
pub fn load_template(
    project_dir: &Path,
    project: &ProjectConfig,
) -> AssemblerResult<AssemblyTemplate> {
    let mut template = match &project.assembly_template {
        Some(name) => {
            let path = project_dir.join(name);
            let raw =
                std::fs::read_to_string(&path).map_err(|e| AssemblerError::read_file(&path, e))?;
            AssemblyTemplate::from_json(&raw)?
        }
        None => AssemblyTemplate::default(),
    };
    apply_audio_levels(&mut template, &project.audio_levels);
    Ok(template)
}

/// Project-level volume overrides on top of the template.
fn apply_audio_levels(template: &mut AssemblyTemplate, levels: &AudioLevels) {
    if let Some(volume) = levels.b_roll_music_volume {
        template.music_sections.beginning_music.volume = volume;
        template.music_sections.end_music.volume = volume;
    }
    if let Some(volume) = levels.background_music_volume {
        template.music_sections.chapters_music.volume = volume;
    }
}

/// Discover `chapter_N` voice/video pairs, contiguous from 1.
pub fn discover_chapters(chapters_dir: &Path) -> AssemblerResult<Vec<Chapter>> {
    let mut chapters = Vec::new();
    let mut index = 1u32;
    loop {
        let Some(voice) = find_with_extensions(chapters_dir, index, &VOICE_EXTENSIONS) else {
            break;
        };
        let video = find_with_extensions(chapters_dir, index, &VIDEO_EXTENSIONS).ok_or_else(
            || {
                AssemblerError::Chapters(format!(
                    "chapter {index} has a voice track but no video in {}",
                    chapters_dir.display()
                ))
            },
        )?;
        debug!(chapter = index, voice = %voice.display(), video = %video.display(), "discovered");
        chapters.push(Chapter::new(index, Asset::new(voice), Asset::new(video)));
        index += 1;
    }

    if chapters.is_empty() {
        return Err(AssemblerError::Chapters(format!(
            "no chapter_1 voice track found in {}",
            chapters_dir.display()
        )));
    }
    info!(count = chapters.len(), "chapters discovered");
    Ok(chapters)
}

fn find_with_extensions(dir: &Path, index: u32, extensions: &[&str]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| dir.join(format!("chapter_{index}.{ext}")))
        .find(|p| p.exists())
}

/// Substitute branding into the title SVG template and rasterize it.
///
/// Rasterization uses `rsvg-convert` when present; otherwise a
/// pre-rendered PNG sitting next to the SVG template is used.
pub async fn prepare_title_overlay(
    work_dir: &Path,
    svg_template: &Path,
    branding: &Branding,
) -> AssemblerResult<PathBuf> {
    let raw = std::fs::read_to_string(svg_template)
        .map_err(|e| AssemblerError::read_file(svg_template, e))?;
    let substituted = raw
        .replace("{{TITLE_LINE1}}", &branding.title_line1)
        .replace("{{TITLE_LINE2}}", &branding.title_line2);

    let svg_out = work_dir.join("title.svg");
    tokio::fs::write(&svg_out, substituted).await?;

    if which::which("rsvg-convert").is_ok() {
        let png_out = work_dir.join("title.png");
        let output = Command::new("rsvg-convert")
            .arg("-o")
            .arg(&png_out)
            .arg(&svg_out)
            .stdin(Stdio::null())
            .output()
            .await?;
        if !output.status.success() {
            return Err(AssemblerError::OverlayUnavailable {
                name: "title".to_string(),
                reason: format!(
                    "rsvg-convert failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                ),
            });
        }
        return Ok(png_out);
    }

    let fallback = svg_template.with_extension("png");
    if fallback.exists() {
        warn!(
            png = %fallback.display(),
            "rsvg-convert not found, using pre-rendered title (branding not substituted)"
        );
        return Ok(fallback);
    }
    Err(AssemblerError::OverlayUnavailable {
        name: "title".to_string(),
        reason: "rsvg-convert not in PATH and no pre-rendered PNG next to the template".to_string(),
    })
}

/// Build the overlay list from the template slots and project paths.
///
/// `title_png` is the rasterized title, prepared beforehand when the
/// project carries an SVG template.
pub fn build_overlays(
    template: &AssemblyTemplate,
    project: &ProjectConfig,
    title_png: Option<PathBuf>,
) -> Vec<OverlaySpec> {
    let slots = &template.overlay_sections;
    let mut overlays = Vec::new();

    let mut push = |name: &str,
                    slot: &Option<OverlayTemplate>,
                    project_source: Option<PathBuf>,
                    default_position: &str,
                    default_window: OverlayWindow| {
        let slot_defaults = OverlayTemplate::default();
        let slot = slot.as_ref().unwrap_or(&slot_defaults);
        let Some(source) = project_source.or_else(|| slot.source.clone()) else {
            return;
        };
        let position = if slot.position == slot_defaults.position {
            default_position.to_string()
        } else {
            slot.position.clone()
        };
        overlays.push(OverlaySpec {
            name: name.to_string(),
            source,
            position,
            scale: slot.scale,
            window: slot.window.clone().unwrap_or(default_window),
        });
    };

    push(
        "title",
        &slots.title,
        title_png,
        "(W-w)/2:60",
        section_window(SectionId::Beginning),
    );
    push(
        "logo",
        &slots.logo,
        project.overlays.logo.clone(),
        "W-w-20:20",
        section_window(SectionId::Beginning),
    );
    push(
        "bottom_logo",
        &slots.bottom_logo,
        project.overlays.bottom_logo.clone(),
        "20:H-h-20",
        section_window(SectionId::End),
    );
    push(
        "subscribe",
        &slots.subscribe,
        project.overlays.subscribe.clone(),
        "W-w-20:H-h-20",
        // The outro b-roll tail, after the goodbye voice.
        OverlayWindow {
            start: AnchorPoint::at(Anchor::VoiceEnd {
                section: SectionId::End,
            }),
            end: AnchorPoint::at(Anchor::SectionEnd {
                section: SectionId::End,
            }),
        },
    );

    overlays
}

fn section_window(section: SectionId) -> OverlayWindow {
    OverlayWindow {
        start: AnchorPoint::at(Anchor::SectionStart { section }),
        end: AnchorPoint::at(Anchor::SectionEnd { section }),
    }
}
