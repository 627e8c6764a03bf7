//! Render plan to ffmpeg filter graph translation.
//!
//! The only stringly-typed filter construction in the system lives
//! here. Everything upstream works on the typed plan; this module
//! flattens it into one `-filter_complex` expression.

use std::path::PathBuf;

use vforge_models::{PlanAudioLayer, RenderPlan};

/// A flattened filter graph: ordered inputs plus the complex filter
/// expression and the labels to map.
#[derive(Debug, Clone)]
pub struct FilterGraph {
    pub inputs: Vec<PathBuf>,
    pub filter: String,
    pub video_label: String,
    pub audio_label: String,
}

impl FilterGraph {
    /// Build the graph for a plan. Input order is video segments,
    /// then audio layer sources, then overlays.
    pub fn build(plan: &RenderPlan) -> Self {
        let mut inputs: Vec<PathBuf> = Vec::new();
        let mut chains: Vec<String> = Vec::new();

        // Video track: per-segment trim/normalize, then one concat.
        let mut video_labels = Vec::new();
        for (i, segment) in plan.video_segments.iter().enumerate() {
            let input_index = inputs.len();
            inputs.push(segment.source.clone());

            let mut chain = format!("[{input_index}:v]");
            if let Some(trim) = &segment.trim {
                chain.push_str(&format!("trim={:.3}:{:.3},", trim.start, trim.end));
            }
            chain.push_str(&format!(
                "setpts=PTS-STARTPTS,scale={}:{},fps={}[v{i}]",
                plan.encoding.width, plan.encoding.height, plan.encoding.frame_rate
            ));
            chains.push(chain);
            video_labels.push(format!("[v{i}]"));
        }
        chains.push(format!(
            "{}concat=n={}:v=1:a=0[vcat]",
            video_labels.join(""),
            video_labels.len()
        ));

        // Audio layers: concat sources if needed, per-layer filter,
        // envelope, fades, then delay into place and mix.
        let mut mix_labels = Vec::new();
        for (i, layer) in plan.audio_layers.iter().enumerate() {
            let label = format!("[a{i}]");
            let mut source_labels = Vec::new();
            for source in &layer.sources {
                let input_index = inputs.len();
                inputs.push(source.clone());
                source_labels.push(format!("[{input_index}:a]"));
            }

            let mut chain = String::new();
            if source_labels.len() > 1 {
                chain.push_str(&format!(
                    "{}concat=n={}:v=0:a=1,",
                    source_labels.join(""),
                    source_labels.len()
                ));
            } else {
                chain.push_str(&source_labels[0]);
            }

            if let Some(filter) = &layer.filter {
                chain.push_str(filter);
                chain.push(',');
            }

            chain.push_str(&format!(
                "atrim=0:{:.3},asetpts=PTS-STARTPTS,",
                layer.duration()
            ));
            chain.push_str(&format!("volume={}", volume_expression(layer)));

            if let Some(fade) = &layer.fade_in {
                chain.push_str(&format!(
                    ",afade=t=in:st={:.3}:d={:.3}",
                    fade.start - layer.start,
                    fade.duration
                ));
            }
            if let Some(fade) = &layer.fade_out {
                chain.push_str(&format!(
                    ",afade=t=out:st={:.3}:d={:.3}",
                    fade.start - layer.start,
                    fade.duration
                ));
            }

            let delay_ms = (layer.start * 1000.0).round() as i64;
            chain.push_str(&format!(",adelay={delay_ms}|{delay_ms}{label}"));
            chains.push(chain);
            mix_labels.push(label);
        }

        let audio_label = if mix_labels.is_empty() {
            // Silent output: generate an empty track.
            chains.push(format!(
                "anullsrc=r={}:cl=stereo,atrim=0:{:.3}[amix]",
                plan.encoding.audio_sample_rate, plan.total_duration
            ));
            "[amix]".to_string()
        } else if mix_labels.len() == 1 {
            mix_labels[0].clone()
        } else {
            chains.push(format!(
                "{}amix=inputs={}:duration=longest:normalize=0[amix]",
                mix_labels.join(""),
                mix_labels.len()
            ));
            "[amix]".to_string()
        };

        // Overlays: scale each still, then chain onto the video with
        // enable windows.
        let mut video_label = "[vcat]".to_string();
        for (i, overlay) in plan.overlays.iter().enumerate() {
            let input_index = inputs.len();
            inputs.push(overlay.source.clone());

            chains.push(format!(
                "[{input_index}:v]scale=iw*{:.4}:ih*{:.4}[ov{i}]",
                overlay.scale, overlay.scale
            ));
            let (x, y) = overlay
                .position
                .split_once(':')
                .unwrap_or((overlay.position.as_str(), "0"));
            let next = format!("[vov{i}]");
            chains.push(format!(
                "{video_label}[ov{i}]overlay={x}:{y}:enable='between(t,{:.3},{:.3})'{next}",
                overlay.enable_start, overlay.enable_end
            ));
            video_label = next;
        }

        FilterGraph {
            inputs,
            filter: chains.join(";"),
            video_label,
            audio_label,
        }
    }
}

/// Piecewise-linear volume expression in layer-local time. A constant
/// envelope collapses to the base volume.
fn volume_expression(layer: &PlanAudioLayer) -> String {
    if layer.envelope.is_empty() {
        return format!("{}", layer.base_volume);
    }

    // Breakpoints hold before the first and after the last point;
    // between points volume interpolates linearly.
    let points: Vec<(f64, f64)> = layer
        .envelope
        .iter()
        .map(|p| (p.time - layer.start, p.volume))
        .collect();

    let mut expr = format!("{}", points[points.len() - 1].1);
    for window in points.windows(2).rev() {
        let (t0, v0) = window[0];
        let (t1, v1) = window[1];
        let ramp = if (v1 - v0).abs() < 1e-9 || (t1 - t0).abs() < 1e-9 {
            format!("{v0}")
        } else {
            format!("{v0}+({v1}-{v0})*(t-{t0:.3})/({t1:.3}-{t0:.3})")
        };
        expr = format!("if(lt(t,{t1:.3}),{ramp},{expr})");
    }
    let (t0, v0) = points[0];
    expr = format!("if(lt(t,{t0:.3}),{v0},{expr})");
    format!("'{expr}':eval=frame")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vforge_models::{
        EncodingConfig, PlanFade, PlanOverlay, PlanVideoSegment, PlanVolumePoint, TrimWindow,
    };

    fn plan() -> RenderPlan {
        RenderPlan {
            created_at: Utc::now(),
            total_duration: 16.0,
            encoding: EncodingConfig::default(),
            video_segments: vec![
                PlanVideoSegment {
                    name: "intro_broll".to_string(),
                    source: "broll.mp4".into(),
                    trim: Some(TrimWindow {
                        start: 0.0,
                        end: 6.0,
                    }),
                    duration: 6.0,
                },
                PlanVideoSegment {
                    name: "hello_message".to_string(),
                    source: "intro1.mov".into(),
                    trim: None,
                    duration: 10.0,
                },
            ],
            audio_layers: vec![
                PlanAudioLayer {
                    name: "music".to_string(),
                    sources: vec!["a_roll.mp3".into()],
                    start: 0.0,
                    end: 16.0,
                    base_volume: 1.0,
                    envelope: vec![
                        PlanVolumePoint {
                            time: 0.0,
                            volume: 1.0,
                        },
                        PlanVolumePoint {
                            time: 5.5,
                            volume: 1.0,
                        },
                        PlanVolumePoint {
                            time: 6.0,
                            volume: 0.3,
                        },
                    ],
                    fade_in: None,
                    fade_out: Some(PlanFade {
                        start: 15.0,
                        duration: 1.0,
                    }),
                    filter: None,
                },
                PlanAudioLayer {
                    name: "voice".to_string(),
                    sources: vec!["c1.wav".into(), "c2.wav".into()],
                    start: 6.0,
                    end: 16.0,
                    base_volume: 1.0,
                    envelope: Vec::new(),
                    fade_in: None,
                    fade_out: None,
                    filter: Some("loudnorm".to_string()),
                },
            ],
            overlays: vec![PlanOverlay {
                name: "logo".to_string(),
                source: "logo.png".into(),
                position: "W-w-20:20".to_string(),
                scale: 0.5,
                enable_start: 0.0,
                enable_end: 10.0,
            }],
        }
    }

    #[test]
    fn test_input_order_is_video_audio_overlay() {
        let graph = FilterGraph::build(&plan());
        let inputs: Vec<_> = graph
            .inputs
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            inputs,
            vec![
                "broll.mp4",
                "intro1.mov",
                "a_roll.mp3",
                "c1.wav",
                "c2.wav",
                "logo.png",
            ]
        );
    }

    #[test]
    fn test_graph_shape() {
        let graph = FilterGraph::build(&plan());
        assert!(graph.filter.contains("trim=0.000:6.000"));
        assert!(graph.filter.contains("concat=n=2:v=1:a=0[vcat]"));
        assert!(graph.filter.contains("concat=n=2:v=0:a=1"));
        assert!(graph.filter.contains("normalize=0"));
        assert!(graph.filter.contains("adelay=6000|6000"));
        assert!(graph.filter.contains("afade=t=out:st=15.000:d=1.000"));
        assert!(graph.filter.contains("loudnorm"));
        assert!(graph
            .filter
            .contains("overlay=W-w-20:20:enable='between(t,0.000,10.000)'"));
        assert_eq!(graph.video_label, "[vov0]");
        assert_eq!(graph.audio_label, "[amix]");
    }

    #[test]
    fn test_constant_envelope_is_plain_volume() {
        let mut p = plan();
        p.audio_layers[0].envelope.clear();
        let graph = FilterGraph::build(&p);
        assert!(graph.filter.contains("volume=1,"));
    }

    #[test]
    fn test_envelope_expression_interpolates() {
        let graph = FilterGraph::build(&plan());
        assert!(graph.filter.contains("eval=frame"));
        assert!(graph.filter.contains("(t-5.500)"));
    }
}
