//! Composition: order clips, apply positional fades, append the end-card,
//! and render one output video.

use crate::config::CompositionDefaults;
use crate::error::{KlippError, Result};
use crate::ffmpeg::{self, quote_drawtext};
use crate::segment::Segment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Duration of the slogan end-card.
const SLOGAN_SECONDS: f64 = 5.0;

/// Fade-in applied to the slogan end-card.
const SLOGAN_FADE_SECONDS: f64 = 1.0;

/// Transition effect applied at clip boundaries.
///
/// Every non-`none` type renders as the positional fade treatment; the type
/// selects its default duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransitionType {
    #[default]
    Fade,
    Slide,
    Zoom,
    None,
}

impl TransitionType {
    /// Default duration for this transition type, in seconds.
    pub fn default_duration(&self) -> f64 {
        match self {
            TransitionType::Fade => 1.0,
            TransitionType::Slide => 0.8,
            TransitionType::Zoom => 1.2,
            TransitionType::None => 0.0,
        }
    }
}

impl std::str::FromStr for TransitionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fade" => Ok(TransitionType::Fade),
            "slide" => Ok(TransitionType::Slide),
            "zoom" => Ok(TransitionType::Zoom),
            "none" => Ok(TransitionType::None),
            _ => Err(format!("Unknown transition type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransitionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionType::Fade => write!(f, "fade"),
            TransitionType::Slide => write!(f, "slide"),
            TransitionType::Zoom => write!(f, "zoom"),
            TransitionType::None => write!(f, "none"),
        }
    }
}

/// Settings for one composition run.
#[derive(Debug, Clone)]
pub struct CompositionSettings {
    pub transition: TransitionType,
    pub transition_duration: f64,
    pub slogan: Option<String>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub output_name: String,
}

impl CompositionSettings {
    /// Build run settings from config defaults.
    pub fn from_defaults(defaults: &CompositionDefaults) -> Result<Self> {
        let transition: TransitionType = defaults
            .transition
            .parse()
            .map_err(KlippError::Config)?;
        let transition_duration = defaults
            .transition_duration
            .unwrap_or_else(|| transition.default_duration());
        if transition != TransitionType::None && transition_duration <= 0.0 {
            return Err(KlippError::Config(
                "transition duration must be positive".to_string(),
            ));
        }
        Ok(Self {
            transition,
            transition_duration,
            slogan: defaults.slogan.clone().filter(|s| !s.trim().is_empty()),
            width: defaults.width,
            height: defaults.height,
            fps: defaults.fps,
            output_name: defaults.output_name.clone(),
        })
    }
}

/// Which fades a clip receives, decided by its position in the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FadeSpec {
    pub fade_in: bool,
    pub fade_out: bool,
}

/// Decide fades by position: the first clip fades out at its tail, the last
/// fades in at its head, middle clips get both. No fades for a single clip
/// or when the transition type is `none`.
pub fn fade_plan(clip_count: usize, transition: TransitionType) -> Vec<FadeSpec> {
    if clip_count <= 1 || transition == TransitionType::None {
        return vec![FadeSpec::default(); clip_count];
    }

    (0..clip_count)
        .map(|i| FadeSpec {
            fade_in: i > 0,
            fade_out: i < clip_count - 1,
        })
        .collect()
}

/// A clip admitted into the timeline.
struct LoadedClip {
    path: PathBuf,
    duration: f64,
    caption: Option<String>,
}

/// Renders ordered clips into a single output video.
pub struct Composer {
    temp_dir: PathBuf,
    output_dir: PathBuf,
}

impl Composer {
    pub fn new(temp_dir: PathBuf, output_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&temp_dir)?;
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { temp_dir, output_dir })
    }

    /// Compose segments' clips into one video at the configured output path.
    ///
    /// Clips are concatenated in list order. Segments whose clip is missing
    /// or unreadable are skipped with a warning; an empty input (or a run
    /// where nothing loads) is `NoSegments`. A failed render leaves no
    /// partial file at the output path.
    #[instrument(skip(self, segments, settings), fields(segments = segments.len()))]
    pub async fn compose(
        &self,
        segments: &[Segment],
        settings: &CompositionSettings,
    ) -> Result<PathBuf> {
        if segments.is_empty() {
            return Err(KlippError::NoSegments);
        }

        let inputs: Vec<(PathBuf, Option<String>)> = segments
            .iter()
            .filter_map(|segment| {
                let Some(path) = &segment.clip_path else {
                    warn!("Segment has no clip file, skipping");
                    return None;
                };
                let caption = (!segment.text.trim().is_empty()).then(|| segment.text.clone());
                Some((path.clone(), caption))
            })
            .collect();

        self.render(&inputs, settings).await
    }

    /// Compose bare clip files, in the given order, with no captions.
    ///
    /// Same skip and failure rules as [`Composer::compose`].
    #[instrument(skip(self, clips, settings), fields(clips = clips.len()))]
    pub async fn compose_files(
        &self,
        clips: &[PathBuf],
        settings: &CompositionSettings,
    ) -> Result<PathBuf> {
        if clips.is_empty() {
            return Err(KlippError::NoSegments);
        }

        let inputs: Vec<(PathBuf, Option<String>)> =
            clips.iter().map(|path| (path.clone(), None)).collect();

        self.render(&inputs, settings).await
    }

    async fn render(
        &self,
        inputs: &[(PathBuf, Option<String>)],
        settings: &CompositionSettings,
    ) -> Result<PathBuf> {
        let clips = self.load_clips(inputs).await?;
        info!("Loaded {} of {} clips", clips.len(), inputs.len());

        let plan = fade_plan(clips.len(), settings.transition);

        // Intermediates live in a scoped directory, removed on drop
        let work_dir = tempfile::Builder::new()
            .prefix("klipp-compose-")
            .tempdir_in(&self.temp_dir)
            .map_err(KlippError::Io)?;

        let mut timeline: Vec<PathBuf> = Vec::with_capacity(clips.len() + 1);
        for (i, (clip, fades)) in clips.iter().zip(&plan).enumerate() {
            let normalized = work_dir.path().join(format!("part_{:03}.mp4", i));
            self.normalize_clip(clip, *fades, settings, &normalized)
                .await?;
            timeline.push(normalized);
        }

        if let Some(slogan) = &settings.slogan {
            let end_card = work_dir.path().join("end_card.mp4");
            self.render_end_card(slogan, settings, &end_card).await?;
            timeline.push(end_card);
        }

        let output_path = self.concat(&timeline, settings, work_dir.path()).await?;
        info!("Rendered {}", output_path.display());
        Ok(output_path)
    }

    /// Probe every clip; unreadable ones are skipped, an empty result is
    /// a hard failure.
    async fn load_clips(&self, inputs: &[(PathBuf, Option<String>)]) -> Result<Vec<LoadedClip>> {
        let mut clips = Vec::new();
        for (path, caption) in inputs {
            match ffmpeg::probe_duration(path).await {
                Ok(duration) => clips.push(LoadedClip {
                    path: path.clone(),
                    duration,
                    caption: caption.clone(),
                }),
                Err(e) => {
                    warn!("Clip {} unreadable, skipping: {}", path.display(), e);
                }
            }
        }

        if clips.is_empty() {
            return Err(KlippError::NoSegments);
        }
        Ok(clips)
    }

    /// Re-encode one clip to the target resolution/fps with its caption and
    /// positional fades applied.
    async fn normalize_clip(
        &self,
        clip: &LoadedClip,
        fades: FadeSpec,
        settings: &CompositionSettings,
        output: &Path,
    ) -> Result<()> {
        let filter = normalize_filter(
            clip.caption.as_deref(),
            fades,
            clip.duration,
            settings.transition_duration,
            settings.width,
            settings.height,
        );
        let fps_arg = settings.fps.to_string();
        let input_arg = clip.path.to_string_lossy().to_string();
        let output_arg = output.to_string_lossy().to_string();

        let args = vec![
            "-i", input_arg.as_str(),
            "-vf", filter.as_str(),
            "-r", fps_arg.as_str(),
            "-c:v", "libx264",
            "-preset", "veryfast",
            "-c:a", "aac",
            "-ar", "44100",
            "-y",
            "-loglevel", "error",
            output_arg.as_str(),
        ];

        debug!("Normalizing {}", clip.path.display());
        ffmpeg::run_ffmpeg(&args)
            .await
            .map_err(|e| KlippError::Composition(e.to_string()))
    }

    /// Render the 5-second black end-card with the slogan, faded in.
    async fn render_end_card(
        &self,
        slogan: &str,
        settings: &CompositionSettings,
        output: &Path,
    ) -> Result<()> {
        let video_src = format!(
            "color=c=black:s={}x{}:d={}:r={}",
            settings.width, settings.height, SLOGAN_SECONDS, settings.fps
        );
        let audio_src = "anullsrc=channel_layout=stereo:sample_rate=44100";
        let filter = format!(
            "drawtext=text={}:x=(w-text_w)/2:y=(h-text_h)/2:fontsize=36:fontcolor=white,\
             fade=t=in:st=0:d={},format=yuv420p",
            quote_drawtext(slogan),
            SLOGAN_FADE_SECONDS
        );
        let duration_arg = format!("{}", SLOGAN_SECONDS);
        let output_arg = output.to_string_lossy().to_string();

        let args = vec![
            "-f", "lavfi",
            "-i", video_src.as_str(),
            "-f", "lavfi",
            "-i", audio_src,
            "-t", duration_arg.as_str(),
            "-vf", filter.as_str(),
            "-c:v", "libx264",
            "-preset", "veryfast",
            "-c:a", "aac",
            "-ar", "44100",
            "-y",
            "-loglevel", "error",
            output_arg.as_str(),
        ];

        debug!("Rendering end-card");
        ffmpeg::run_ffmpeg(&args)
            .await
            .map_err(|e| KlippError::Composition(e.to_string()))
    }

    /// Concatenate normalized parts and move the result into place.
    ///
    /// The parts share codec, resolution and frame rate, so the concat
    /// demuxer stream-copies them. Rendering happens at a partial name and
    /// only a successful render is persisted to the configured output path.
    async fn concat(
        &self,
        parts: &[PathBuf],
        settings: &CompositionSettings,
        work_dir: &Path,
    ) -> Result<PathBuf> {
        let list_path = work_dir.join("concat.txt");
        let list: String = parts
            .iter()
            .map(|p| format!("file '{}'\n", p.display()))
            .collect();
        std::fs::write(&list_path, list)?;

        let output_path = self.output_dir.join(&settings.output_name);
        let partial_path = self
            .output_dir
            .join(format!(".{}.part", settings.output_name));

        let list_arg = list_path.to_string_lossy().to_string();
        let partial_arg = partial_path.to_string_lossy().to_string();

        let args = vec![
            "-f", "concat",
            "-safe", "0",
            "-i", list_arg.as_str(),
            "-c", "copy",
            "-y",
            "-loglevel", "error",
            partial_arg.as_str(),
        ];

        if let Err(e) = ffmpeg::run_ffmpeg(&args).await {
            let _ = std::fs::remove_file(&partial_path);
            return Err(KlippError::Composition(e.to_string()));
        }

        std::fs::rename(&partial_path, &output_path)
            .map_err(|e| KlippError::Composition(format!("cannot persist output: {}", e)))?;
        Ok(output_path)
    }
}

/// Build the normalize filter chain: scale/pad to the target frame, caption
/// bottom-center, then head/tail fades.
fn normalize_filter(
    caption: Option<&str>,
    fades: FadeSpec,
    clip_duration: f64,
    transition_duration: f64,
    width: u32,
    height: u32,
) -> String {
    let mut steps = vec![format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = width,
        h = height
    )];

    if let Some(text) = caption {
        steps.push(format!(
            "drawtext=text={}:x=(w-text_w)/2:y=h-text_h-20:fontsize=24:fontcolor=white:box=1:boxcolor=black@0.5:boxborderw=8",
            quote_drawtext(text)
        ));
    }

    // A fade can never be longer than the clip itself
    let fade_len = transition_duration.min(clip_duration);
    if fades.fade_in {
        steps.push(format!("fade=t=in:st=0:d={:.3}", fade_len));
    }
    if fades.fade_out {
        let fade_start = (clip_duration - fade_len).max(0.0);
        steps.push(format!("fade=t=out:st={:.3}:d={:.3}", fade_start, fade_len));
    }

    steps.push("format=yuv420p".to_string());
    steps.join(",")
}
