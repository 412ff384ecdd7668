//! Reference annotation loader (spec §4.6).
//!
//! Grounded on `docling-adobe`'s `IdmlParser`, which pull-parses an XML
//! archive with `quick_xml::Reader`/`Event` rather than an event-callback
//! API with closures over mutable globals (the redesign note in §9).
//! Annotation sources use two logical schemas per recording: a session
//! table mapping local speaker codes (A–D) to recording-global participant
//! IDs, and a per-speaker list of timestamped turns.

use crate::diarization::types::{Embedding, TimedSpeakerSegment};
use crate::error::GroundTruthError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// Reference segments shorter than this are discarded (§4.6).
const MIN_REFERENCE_DURATION_SECONDS: f32 = 0.5;

/// Parses the `<speakers>` mapping plus `<segments>` turn list from one
/// recording's annotation XML into reference [`TimedSpeakerSegment`]s.
///
/// Expected shape:
/// ```xml
/// <meeting id="ES2002a">
///   <speakers>
///     <speaker code="A" participant="MTD002ID"/>
///   </speakers>
///   <segments>
///     <segment speaker="A" start="0.0" end="5.2"/>
///   </segments>
/// </meeting>
/// ```
pub fn parse_annotation(xml: &str) -> Result<Vec<TimedSpeakerSegment>, GroundTruthError> {
    let speaker_codes = parse_speaker_mapping(xml)?;
    parse_turn_list(xml, &speaker_codes)
}

fn parse_speaker_mapping(xml: &str) -> Result<HashMap<String, String>, GroundTruthError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut mapping = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Empty(ref e) | Event::Start(ref e) if e.name().as_ref() == b"speaker" => {
                let mut code = None;
                let mut participant = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"code" => code = Some(String::from_utf8_lossy(&attr.value).into_owned()),
                        b"participant" => participant = Some(String::from_utf8_lossy(&attr.value).into_owned()),
                        _ => {}
                    }
                }
                if let (Some(code), Some(participant)) = (code, participant) {
                    mapping.insert(code, participant);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(mapping)
}

fn parse_turn_list(
    xml: &str,
    speaker_codes: &HashMap<String, String>,
) -> Result<Vec<TimedSpeakerSegment>, GroundTruthError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut segments = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Empty(ref e) | Event::Start(ref e) if e.name().as_ref() == b"segment" => {
                let mut code = None;
                let mut start = None;
                let mut end = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"speaker" => code = Some(String::from_utf8_lossy(&attr.value).into_owned()),
                        b"start" => start = parse_f32(&attr.value),
                        b"end" => end = parse_f32(&attr.value),
                        _ => {}
                    }
                }

                let (Some(code), Some(start), Some(end)) = (code, start, end) else {
                    continue;
                };

                let participant = speaker_codes
                    .get(&code)
                    .cloned()
                    .ok_or(GroundTruthError::UnknownSpeakerCode { code })?;

                if end - start < MIN_REFERENCE_DURATION_SECONDS {
                    continue;
                }

                segments.push(TimedSpeakerSegment {
                    speaker_id: participant,
                    start_seconds: start,
                    end_seconds: end,
                    embedding: Embedding::from_raw(vec![], 0.0),
                    quality_score: 1.0,
                });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    segments.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));
    Ok(segments)
}

fn parse_f32(bytes: &[u8]) -> Option<f32> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn xml_error(err: quick_xml::Error) -> GroundTruthError {
    GroundTruthError::MalformedXml {
        message: err.to_string(),
    }
}
