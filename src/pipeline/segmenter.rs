//! Transcript segmentation: raw text → ordered, speaker-attributed chunks.
//!
//! A speaker turn starts at a bracketed 12-hour timestamp followed by the
//! speaker name and a colon, e.g. `[9:05 AM] Alice:`. Everything up to the
//! next turn (or the end of the text) is that speaker's utterance.

use std::sync::LazyLock;

use regex::Regex;

use super::error::MarkerKind;
use super::types::Chunk;
use super::PipelineError;
use crate::config::PipelineSettings;

static SPEAKER_TURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d{1,2}:\d{2} (?:AM|PM)\] ([^:]+):").unwrap());

/// Splits transcripts into chunks, optionally bounded by start/end markers.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    start_marker: Option<String>,
    end_marker: Option<String>,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            start_marker: settings.start_marker.clone(),
            end_marker: settings.end_marker.clone(),
        }
    }

    pub fn with_markers(start_marker: Option<&str>, end_marker: Option<&str>) -> Self {
        Self {
            start_marker: start_marker.map(str::to_string),
            end_marker: end_marker.map(str::to_string),
        }
    }

    /// Parse `raw_text` into chunks. `id` and `order` are both the zero-based
    /// index of the speaker turn.
    ///
    /// Zero recognizable turns is not an error and yields an empty list.
    pub fn transcript_to_chunks(&self, raw_text: &str) -> Result<Vec<Chunk>, PipelineError> {
        if raw_text.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let text = bounded(raw_text, self.start_marker.as_deref(), self.end_marker.as_deref())?;

        let turns: Vec<_> = SPEAKER_TURN.captures_iter(text).collect();
        let mut chunks = Vec::with_capacity(turns.len());

        for (i, caps) in turns.iter().enumerate() {
            let (Some(whole), Some(speaker)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let end = turns
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |next| next.start());

            let utterance = collapse_newlines(text[whole.end()..end].trim());
            chunks.push(Chunk {
                id: i,
                order: i,
                content: format!("{}: {}", speaker.as_str().trim(), utterance),
            });
        }

        tracing::debug!(chunks = chunks.len(), "Transcript segmented");
        Ok(chunks)
    }
}

/// Cut everything up to and including the start marker, then everything from
/// the end marker onward. Empty markers are ignored.
fn bounded<'a>(
    text: &'a str,
    start_marker: Option<&str>,
    end_marker: Option<&str>,
) -> Result<&'a str, PipelineError> {
    let mut text = text;

    if let Some(marker) = start_marker.filter(|m| !m.is_empty()) {
        let idx = text.find(marker).ok_or_else(|| PipelineError::MarkerNotFound {
            which: MarkerKind::Start,
            marker: marker.to_string(),
        })?;
        text = &text[idx + marker.len()..];
    }

    if let Some(marker) = end_marker.filter(|m| !m.is_empty()) {
        let idx = text.find(marker).ok_or_else(|| PipelineError::MarkerNotFound {
            which: MarkerKind::End,
            marker: marker.to_string(),
        })?;
        text = &text[..idx];
    }

    Ok(text)
}

fn collapse_newlines(s: &str) -> String {
    s.replace("\r\n", " ").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = "TRANSCRIPT:\n\
        [9:00 AM] Alice: Let's review the release.\n\
        [9:01 AM] Bob: The build is green.\nShipping today.\n\
        [10:15 PM] Charlie:   Sounds good.  \n\
        [END TRANSCRIPT]\nnotes after the end";

    #[test]
    fn one_chunk_per_speaker_turn() {
        let chunks = Segmenter::new().transcript_to_chunks(TRANSCRIPT).unwrap();
        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id, i);
            assert_eq!(chunk.order, i);
        }
        assert_eq!(chunks[0].content, "Alice: Let's review the release.");
    }

    #[test]
    fn newlines_inside_utterance_become_spaces() {
        let chunks = Segmenter::new().transcript_to_chunks(TRANSCRIPT).unwrap();
        assert_eq!(chunks[1].content, "Bob: The build is green. Shipping today.");
    }

    #[test]
    fn last_chunk_runs_to_end_without_markers() {
        let chunks = Segmenter::new().transcript_to_chunks(TRANSCRIPT).unwrap();
        assert_eq!(
            chunks[2].content,
            "Charlie: Sounds good.   [END TRANSCRIPT] notes after the end"
        );
    }

    #[test]
    fn markers_bound_the_transcript() {
        let segmenter = Segmenter::with_markers(Some("TRANSCRIPT:"), Some("[END TRANSCRIPT"));
        let chunks = segmenter.transcript_to_chunks(TRANSCRIPT).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].content, "Charlie: Sounds good.");
    }

    #[test]
    fn start_marker_itself_is_dropped() {
        let segmenter = Segmenter::with_markers(Some("[9:00 AM] Alice:"), None);
        let chunks = segmenter.transcript_to_chunks(TRANSCRIPT).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.starts_with("Bob:"));
    }

    #[test]
    fn missing_start_marker_fails() {
        let segmenter = Segmenter::with_markers(Some("BEGIN"), None);
        let err = segmenter.transcript_to_chunks(TRANSCRIPT).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MarkerNotFound { which: MarkerKind::Start, .. }
        ));
    }

    #[test]
    fn missing_end_marker_fails() {
        let segmenter = Segmenter::with_markers(None, Some("FIN"));
        let err = segmenter.transcript_to_chunks(TRANSCRIPT).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MarkerNotFound { which: MarkerKind::End, ref marker } if marker == "FIN"
        ));
    }

    #[test]
    fn end_marker_searched_after_start_marker() {
        let text = "END [9:00 AM] A: x START [9:01 AM] B: y";
        let segmenter = Segmenter::with_markers(Some("START"), Some("END"));
        assert!(segmenter.transcript_to_chunks(text).is_err());
    }

    #[test]
    fn empty_markers_are_ignored() {
        let segmenter = Segmenter::with_markers(Some(""), Some(""));
        assert_eq!(segmenter.transcript_to_chunks(TRANSCRIPT).unwrap().len(), 3);
    }

    #[test]
    fn empty_input_rejected() {
        assert!(matches!(
            Segmenter::new().transcript_to_chunks(""),
            Err(PipelineError::EmptyInput)
        ));
    }

    #[test]
    fn no_turns_yields_no_chunks() {
        let chunks = Segmenter::new()
            .transcript_to_chunks("just some prose without timestamps")
            .unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn twenty_four_hour_timestamps_not_recognized() {
        let chunks = Segmenter::new()
            .transcript_to_chunks("[13:00] Alice: hello")
            .unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn speaker_name_is_trimmed() {
        let chunks = Segmenter::new()
            .transcript_to_chunks("[9:00 AM]  Dana Scully : on it")
            .unwrap();
        assert_eq!(chunks[0].content, "Dana Scully: on it");
    }

    #[test]
    fn settings_markers_are_used() {
        let settings = PipelineSettings {
            start_marker: Some("TRANSCRIPT:".into()),
            end_marker: Some("[END TRANSCRIPT".into()),
            ..PipelineSettings::default()
        };
        let chunks = Segmenter::from_settings(&settings)
            .transcript_to_chunks(TRANSCRIPT)
            .unwrap();
        assert_eq!(chunks.last().unwrap().content, "Charlie: Sounds good.");
    }
}
