//! The assembly pipeline: probe and match in parallel, then lay out,
//! mix, emit, and render.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::info;
use url::Url;
use vforge_media::{
    ChapterMatcher, CloudTimelineBackend, FfmpegRunner, LocalFfmpegBackend, MatchError,
    MatchedVideo, ProbeCache, RenderBackend,
};
use vforge_models::{
    Asset, AssemblyTemplate, Chapter, ProjectConfig, Section, SectionId, Segment, SegmentKind,
};
use vforge_timeline::{emit, layout, mix, MixSources, VideoSources};

use crate::assets;
use crate::config::AssemblerConfig;
use crate::error::{AssemblerError, AssemblerResult};
use crate::logging::RunLogger;

/// Which renderer receives the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Cloud,
}

/// One assembly invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub project_dir: PathBuf,
    pub output: PathBuf,
    pub backend: BackendKind,
    /// Write the render plan JSON to `output` instead of rendering.
    pub emit_plan: bool,
}

pub struct Assembler {
    config: AssemblerConfig,
    logger: RunLogger,
}

impl Assembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self {
            config,
            logger: RunLogger::new(),
        }
    }

    pub async fn run(&self, options: &RunOptions) -> AssemblerResult<()> {
        let log = self.logger.stage("load");
        log.start(&format!("project {}", options.project_dir.display()));
        let project = assets::load_project(&options.project_dir)?;
        let template = assets::load_template(&options.project_dir, &project)?;
        let chapters = assets::discover_chapters(&project.chapters_dir)?;

        // Per-run scratch directory so parallel runs never collide.
        let work_dir = PathBuf::from(&self.config.work_dir).join(self.logger.run_id());
        tokio::fs::create_dir_all(&work_dir).await?;

        let probes = Arc::new(ProbeCache::new(
            self.config.probe_timeout.as_secs(),
            self.config.probe_retry,
        ));

        // Probe the talking heads and match every chapter. The chapter
        // pool is bounded; all in-flight work finishes before anything
        // downstream runs, even when some of it failed.
        let log = self.logger.stage("probe_match");
        log.start(&format!("{} chapters", chapters.len()));
        let matcher = Arc::new(ChapterMatcher::new(
            probes.clone(),
            FfmpegRunner::new().with_timeout(self.config.ffmpeg_timeout.as_secs()),
            template.conversion_settings.clone(),
            work_dir.clone(),
        ));

        let (intro_duration, outro_duration, match_results) = tokio::join!(
            probes.duration(&project.intro_voice),
            probes.duration(&project.outro_voice),
            self.match_chapters(matcher.clone(), &chapters),
        );
        let intro_duration = intro_duration?;
        let outro_duration = outro_duration?;
        let matched = collect_matched(match_results).map_err(|err| {
            log.failure(&err.to_string());
            err
        })?;
        log.completion(&format!("{} chapters matched", matched.len()));

        // Chapter voice durations come from the same cache the matcher
        // filled, so these never probe again.
        let mut measured_chapters = Vec::with_capacity(chapters.len());
        for chapter in &chapters {
            let duration = probes.duration(&chapter.voice.path).await?;
            measured_chapters.push(Chapter::new(
                chapter.index,
                Asset::measured(&chapter.voice.path, duration),
                chapter.video.clone(),
            ));
        }

        let log = self.logger.stage("layout");
        let sections = build_sections(
            &template,
            Asset::measured(&project.intro_voice, intro_duration),
            Asset::measured(&project.outro_voice, outro_duration),
        );
        let timeline = layout(&sections, &measured_chapters, template.min_filler_duration)?;
        log.completion(&format!(
            "total {:.3}s across {} segments",
            timeline.total_duration,
            timeline.segments.len()
        ));

        let layers = mix::plan(
            &timeline,
            &template.music_sections,
            &mix_sources(&project, &measured_chapters),
        );

        let title_png = match &project.overlays.title_svg_template {
            Some(svg) => Some(
                assets::prepare_title_overlay(&work_dir, svg, &project.branding).await?,
            ),
            None => None,
        };
        let overlays = assets::build_overlays(&template, &project, title_png);

        let video = video_sources(&project, &sections, &matched);
        let plan = emit(
            &timeline,
            &layers,
            &template.conversion_settings,
            &video,
            &overlays,
        )?;
        plan.validate().map_err(AssemblerError::InvalidPlan)?;

        if options.emit_plan {
            tokio::fs::write(&options.output, plan.to_json()?).await?;
            info!(path = %options.output.display(), "render plan written");
            return Ok(());
        }

        let log = self.logger.stage("render");
        log.start(&format!("{:?} backend", options.backend));
        let backend = self.backend(options.backend)?;
        backend.render(&plan, &options.output).await?;
        log.completion(&format!("output {}", options.output.display()));
        Ok(())
    }

    async fn match_chapters(
        &self,
        matcher: Arc<ChapterMatcher>,
        chapters: &[Chapter],
    ) -> Vec<Result<MatchedVideo, MatchError>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_chapters));
        let futures = chapters.iter().map(|chapter| {
            let matcher = matcher.clone();
            let semaphore = semaphore.clone();
            let log = self.logger.stage("probe_match");
            async move {
                let _permit = semaphore.acquire_owned().await.map_err(|_| {
                    MatchError::Io {
                        index: chapter.index,
                        source: std::io::Error::other("worker pool closed"),
                    }
                })?;
                let matched = matcher.match_chapter(chapter).await?;
                log.progress(&format!("chapter {} matched", chapter.index));
                Ok(matched)
            }
        });
        join_all(futures).await
    }

    fn backend(&self, kind: BackendKind) -> AssemblerResult<Box<dyn RenderBackend>> {
        match kind {
            BackendKind::Local => Ok(Box::new(LocalFfmpegBackend::new(
                FfmpegRunner::new().with_timeout(self.config.render_timeout.as_secs()),
            ))),
            BackendKind::Cloud => {
                let raw = self.config.cloud_render_url.as_deref().ok_or_else(|| {
                    AssemblerError::config("VFORGE_CLOUD_RENDER_URL is required for --backend cloud")
                })?;
                let url = Url::parse(raw)
                    .map_err(|e| AssemblerError::config(format!("bad cloud render URL: {e}")))?;
                Ok(Box::new(CloudTimelineBackend::new(
                    url,
                    self.config.cloud_api_key.clone(),
                    self.config.render_timeout.as_secs(),
                )))
            }
        }
    }
}

/// Gather matched chapters, in index order, or every failure at once.
fn collect_matched(
    results: Vec<Result<MatchedVideo, MatchError>>,
) -> AssemblerResult<Vec<MatchedVideo>> {
    let mut matched = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(m) => matched.push(m),
            Err(e) => failures.push(e),
        }
    }
    if !failures.is_empty() {
        return Err(AssemblerError::ChaptersFailed(failures));
    }
    matched.sort_by_key(|m| m.chapter_index);
    Ok(matched)
}

/// Instantiate the template's sections, attaching the measured voice
/// assets to the talking heads.
fn build_sections(template: &AssemblyTemplate, intro_voice: Asset, outro_voice: Asset) -> Vec<Section> {
    SectionId::ORDER
        .iter()
        .map(|&id| {
            let section_template = template.video_sections.get(id);
            let segments = section_template
                .segments
                .iter()
                .map(|st| {
                    let mut segment = Segment::new(st.name.as_str(), st.kind);
                    if let Some(duration) = st.duration {
                        segment = segment.with_declared_duration(duration);
                    }
                    if st.kind == SegmentKind::TalkingHead {
                        let asset = match id {
                            SectionId::Beginning => Some(&intro_voice),
                            SectionId::End => Some(&outro_voice),
                            SectionId::Chapters => None,
                        };
                        if let Some(asset) = asset {
                            segment = segment.with_asset(asset.clone());
                        }
                    }
                    segment
                })
                .collect();
            let mut section = Section::new(id, segments);
            if let Some(total) = section_template.total_duration {
                section = section.with_total_duration(total);
            }
            section
        })
        .collect()
}

fn mix_sources(project: &ProjectConfig, chapters: &[Chapter]) -> MixSources {
    MixSources {
        // The b-roll bed plays under the intro/outro, the a-roll bed
        // under the continuous chapter voice.
        beginning_music: project.music.b_roll_background.clone(),
        chapters_music: project.music.a_roll_background.clone(),
        end_music: project.music.b_roll_background.clone(),
        beginning_voice: project.intro_voice.clone(),
        chapter_voices: chapters.iter().map(|c| c.voice.path.clone()).collect(),
        end_voice: project.outro_voice.clone(),
        voice_volume: project.audio_levels.voice_volume.unwrap_or(1.0),
    }
}

fn video_sources(
    project: &ProjectConfig,
    sections: &[Section],
    matched: &[MatchedVideo],
) -> VideoSources {
    let mut video = VideoSources::new().with_broll(&project.b_roll_video);
    for section in sections {
        for segment in &section.segments {
            if segment.kind != SegmentKind::TalkingHead {
                continue;
            }
            match section.id {
                SectionId::Beginning => video.insert(segment.name.as_str(), &project.intro_video),
                SectionId::End => video.insert(segment.name.as_str(), &project.outro_video),
                SectionId::Chapters => {}
            }
        }
    }
    for m in matched {
        video.insert(format!("chapter_{}", m.chapter_index), &m.path);
    }
    video
}

#[cfg(test)]
mod tests {
    use super::*;
    use vforge_media::MatchDecision;

    fn matched(index: u32) -> MatchedVideo {
        MatchedVideo {
            chapter_index: index,
            path: format!("/work/chapter_{index}_matched.mov").into(),
            duration: 10.0,
            decision: MatchDecision::PassThrough,
        }
    }

    #[test]
    fn test_matched_chapters_ordered_by_index() {
        // Completion order differs from chapter order.
        let results = vec![Ok(matched(3)), Ok(matched(1)), Ok(matched(2))];
        let ordered = collect_matched(results).unwrap();
        let indices: Vec<_> = ordered.iter().map(|m| m.chapter_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_all_failures_reported_together() {
        let results = vec![
            Ok(matched(1)),
            Err(MatchError::SourceTooShort {
                index: 2,
                duration: 0.1,
            }),
            Err(MatchError::SourceTooShort {
                index: 3,
                duration: 0.2,
            }),
        ];
        let err = collect_matched(results).unwrap_err();
        match err {
            AssemblerError::ChaptersFailed(failures) => assert_eq!(failures.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_build_sections_attaches_voice_assets() {
        let template = AssemblyTemplate::default();
        let sections = build_sections(
            &template,
            Asset::measured("intro1.wav", 4.0),
            Asset::measured("outro1.wav", 3.0),
        );
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].total_duration, Some(10.0));

        let hello = &sections[0].segments[1];
        assert_eq!(hello.kind, SegmentKind::TalkingHead);
        assert_eq!(hello.measured_duration(), Some(4.0));

        let goodbye = &sections[2].segments[0];
        assert_eq!(goodbye.measured_duration(), Some(3.0));
        assert_eq!(sections[2].segments[1].declared_duration, Some(5.0));
    }
}
