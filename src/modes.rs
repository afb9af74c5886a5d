use crate::types::{GenerationMode, TrackType};

/// Sentinel for "repaint to end of file".
pub const REPAINT_TO_END: f32 = -1.0;

/// Model family that must be installed before the track-level task modes
/// (lego, extract, complete) can be submitted.
pub const BASE_MODEL_FAMILY: &str = "Base";

/// Panel fields a mode can require before submission may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Caption,
    ReferenceAudio,
    SourceAudio,
}

const TEXT2MUSIC_REQUIRED: &[Field] = &[Field::Caption];
const AUDIO2AUDIO_REQUIRED: &[Field] = &[Field::ReferenceAudio];
const COVER_REQUIRED: &[Field] = &[Field::SourceAudio, Field::Caption];
const SOURCE_ONLY_REQUIRED: &[Field] = &[Field::SourceAudio];

pub fn required_fields(mode: GenerationMode) -> &'static [Field] {
    match mode {
        GenerationMode::Text2Music => TEXT2MUSIC_REQUIRED,
        GenerationMode::Audio2Audio => AUDIO2AUDIO_REQUIRED,
        GenerationMode::Cover => COVER_REQUIRED,
        GenerationMode::Repaint
        | GenerationMode::Extend
        | GenerationMode::Lego
        | GenerationMode::Extract
        | GenerationMode::Complete => SOURCE_ONLY_REQUIRED,
    }
}

/// Whether the outgoing payload for `mode` may carry a source/cover audio URL.
pub fn carries_source_audio(mode: GenerationMode) -> bool {
    !matches!(mode, GenerationMode::Text2Music | GenerationMode::Audio2Audio)
}

/// Whether the payload may carry a repaint window. Extend is a repaint whose
/// window reaches past the end of the source file, so it carries one too.
pub fn carries_repaint_window(mode: GenerationMode) -> bool {
    matches!(mode, GenerationMode::Repaint | GenerationMode::Extend)
}

/// Whether the payload may carry the secondary blend audio URL.
pub fn carries_blend_audio(mode: GenerationMode) -> bool {
    matches!(mode, GenerationMode::Audio2Audio | GenerationMode::Cover)
}

/// Whether the payload may carry the cover/source-influence strength. Plain
/// text-to-music has no conditioning audio to weigh against, even when a
/// style reference happens to be attached.
pub fn carries_source_influence(mode: GenerationMode) -> bool {
    mode != GenerationMode::Text2Music
}

/// The track-level task modes run on the "Base" model family, which is an
/// optional install; submission is gated on a registry check.
pub fn requires_base_model(mode: GenerationMode) -> bool {
    matches!(
        mode,
        GenerationMode::Lego | GenerationMode::Extract | GenerationMode::Complete
    )
}

/// Mode fallback when audio attachments change: once both the reference and
/// the source audio are gone, an audio-dependent mode has nothing to operate
/// on and the panel drops back to plain text-to-music.
pub fn resolve_after_audio_change(
    mode: GenerationMode,
    reference_audio_empty: bool,
    source_audio_empty: bool,
) -> GenerationMode {
    if reference_audio_empty && source_audio_empty && mode != GenerationMode::Text2Music {
        GenerationMode::Text2Music
    } else {
        mode
    }
}

/// A repaint window is valid when the end offset is the to-end sentinel or
/// strictly after the start offset.
pub fn repaint_window_is_valid(start: f32, end: f32) -> bool {
    end == REPAINT_TO_END || end > start
}

/// Instruction prefix synthesized for the track-level task modes. The
/// caller appends the user's free-text caption after it.
pub fn task_instruction(mode: GenerationMode, track: Option<TrackType>) -> Option<String> {
    match mode {
        GenerationMode::Lego => track.map(|t| {
            format!("Generate the {} track based on the audio context:", t.label())
        }),
        GenerationMode::Extract => track.map(|t| {
            format!("Extract the {} track from the audio context:", t.label())
        }),
        GenerationMode::Complete => {
            Some("Complete the music based on the audio context:".to_string())
        }
        _ => None,
    }
}
