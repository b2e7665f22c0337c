//! FFmpeg filter graph fragments for scene renders and assembly.

use std::fmt::Write as _;
use std::path::Path;

use dread_models::{KenBurns, Resolution, SubtitleStyle};

/// Integrated loudness target for the final mix (EBU R128 style).
pub const LOUDNORM_FILTER: &str = "loudnorm=I=-16:TP=-1.5:LRA=11";

/// Cross-fade flavour used between scenes.
pub const XFADE_TRANSITION: &str = "fade";

/// Quote a value for use inside a filter graph option.
///
/// Single quotes cannot be escaped inside a quoted section, so they close the
/// quote, emit an escaped quote and reopen.
pub fn quote_filter_value(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Escape a filter option value for both parsing levels.
///
/// The graph parser strips the outer quotes; the filter's own option parser
/// then splits on `:` and unescapes backslashes, so those are escaped first.
pub fn quote_option_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    quote_filter_value(&escaped)
}

/// Scale the still image to the frame and zoom in slowly up to the cap.
pub fn ken_burns(resolution: Resolution, zoom: KenBurns) -> String {
    format!(
        "scale={w}:{h},zoompan=z='min(zoom+{step},{max})':d=1:s={size}",
        w = resolution.width,
        h = resolution.height,
        step = zoom.step,
        max = zoom.max_zoom,
        size = resolution.as_size(),
    )
}

/// Burn an SRT file into the video with a forced style.
pub fn burn_subtitles(subtitles: &Path, style: &SubtitleStyle) -> String {
    format!(
        "subtitles={}:force_style={}",
        quote_option_value(&subtitles.to_string_lossy()),
        quote_option_value(&style.force_style())
    )
}

/// Full scene graph.
///
/// Input 0 is the looped image, 1 the background music, 2 the narration.
/// Produces `[out]` (video) and `[a]` (audio).
pub fn scene_graph(
    resolution: Resolution,
    zoom: KenBurns,
    subtitles: &Path,
    style: &SubtitleStyle,
    music_volume: f64,
    voice_volume: f64,
) -> String {
    format!(
        "[0]{}[vid];[vid]{}[out];[1:a]volume={:.1}[a1];[2:a]volume={:.1}[a2];[a1][a2]amix=inputs=2:duration=longest[a]",
        ken_burns(resolution, zoom),
        burn_subtitles(subtitles, style),
        music_volume,
        voice_volume
    )
}

/// Conform one assembly input to the scene length, frame size, rate and audio format.
///
/// Emits `[v{i}]` and `[a{i}]`. Inputs without audio get generated silence so
/// every clip can take part in the audio cross-fade chain.
pub fn conform_clip(
    input: usize,
    duration: f64,
    resolution: Resolution,
    fps: u32,
    sample_rate: u32,
    has_audio: bool,
) -> String {
    let mut graph = format!(
        "[{i}:v]trim=duration={d:.3},setpts=PTS-STARTPTS,scale={w}:{h},setsar=1,fps={fps},format=yuv420p,settb=AVTB[v{i}];",
        i = input,
        d = duration,
        w = resolution.width,
        h = resolution.height,
        fps = fps
    );
    let audio_format = format!("aformat=sample_rates={}:channel_layouts=stereo", sample_rate);
    if has_audio {
        let _ = write!(
            graph,
            "[{i}:a]atrim=duration={d:.3},asetpts=PTS-STARTPTS,aresample={sr},{fmt}[a{i}]",
            i = input,
            d = duration,
            sr = sample_rate,
            fmt = audio_format
        );
    } else {
        let _ = write!(
            graph,
            "anullsrc=r={sr}:cl=stereo,atrim=duration={d:.3},{fmt}[a{i}]",
            i = input,
            sr = sample_rate,
            d = duration,
            fmt = audio_format
        );
    }
    graph
}

/// Chain cross-fades over conformed clips `[v0]..[vN-1]` / `[a0]..[aN-1]`.
///
/// `offsets[k]` is where clip `k` starts fading in on the output timeline
/// (`offsets[0]` is ignored). Returns the graph fragment and the final video
/// and audio labels.
pub fn crossfade_chain(offsets: &[f64], transition: f64) -> (String, String, String) {
    let mut parts = Vec::new();
    let mut video = "v0".to_string();
    let mut audio = "a0".to_string();

    for (k, offset) in offsets.iter().enumerate().skip(1) {
        let next_video = format!("vx{}", k);
        let next_audio = format!("ax{}", k);
        parts.push(format!(
            "[{}][v{}]xfade=transition={}:duration={:.3}:offset={:.3}[{}]",
            video, k, XFADE_TRANSITION, transition, offset, next_video
        ));
        parts.push(format!(
            "[{}][a{}]acrossfade=d={:.3}[{}]",
            audio, k, transition, next_audio
        ));
        video = next_video;
        audio = next_audio;
    }

    (parts.join(";"), video, audio)
}

/// Final audio stage: optional loudness normalization, then back to the output rate.
pub fn finish_audio(label: &str, normalize: bool, sample_rate: u32) -> String {
    if normalize {
        format!("[{}]{},aresample={}[aout]", label, LOUDNORM_FILTER, sample_rate)
    } else {
        format!("[{}]anull[aout]", label)
    }
}
