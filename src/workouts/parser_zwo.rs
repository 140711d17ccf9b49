//! Zwift workout (.zwo) file parser.
//!
//! Reads the metadata, tags and segment elements of a `workout_file`
//! document. Segment elements are collected first and built once the whole
//! document is read, because `Duration` means seconds on the bike and meters
//! on the run and `sportType` may appear anywhere under the root.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

use crate::metrics::pace::PaceIndex;
use crate::workouts::types::{
    Annotation, Block, IntervalsParams, RampParams, Segment, SportType, SteadyParams, Workout,
    WorkoutParseError, WorkoutTag, DEFAULT_FREE_RIDE_SECONDS,
};

/// Contents of a parsed .zwo document.
///
/// Metadata fields are `None` when the element was absent, so applying the
/// file to a workout only overwrites what the file carries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkoutFile {
    pub author: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Sport the segments were read as; bike when the file does not say
    pub sport_type: SportType,
    pub tags: Option<Vec<WorkoutTag>>,
    pub segments: Vec<Segment>,
    pub annotations: Vec<Annotation>,
}

impl WorkoutFile {
    /// True when the document held no segments and no annotations.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.annotations.is_empty()
    }

    /// Replace the workout's content with this file's.
    ///
    /// Segments and annotations are always cleared first; metadata is kept
    /// unless the file provides it.
    pub fn apply_to(self, workout: &mut Workout) {
        workout.clear_content();

        if let Some(author) = self.author {
            workout.author = author;
        }
        if let Some(name) = self.name {
            workout.name = name;
        }
        if let Some(description) = self.description {
            workout.description = description;
        }
        if let Some(tags) = self.tags {
            workout.tags = tags;
        }
        workout.sport_type = self.sport_type;

        for segment in self.segments {
            workout.push_segment(segment);
        }
        workout.annotations.extend(self.annotations);
    }
}

/// A segment element as read, before the sport type is known.
#[derive(Debug)]
struct RawSegment {
    element: String,
    attributes: HashMap<String, String>,
    /// `(timeoffset, message)` pairs of nested text events
    events: Vec<(u32, String)>,
}

/// Parse a ZWO workout from XML content.
pub fn parse_zwo(content: &str) -> Result<WorkoutFile, WorkoutParseError> {
    // Text is kept verbatim; only metadata elements collect it, so the
    // whitespace between elements is never read.
    let mut reader = Reader::from_str(content);
    reader.trim_text(false);

    let mut file = WorkoutFile::default();
    let mut sport_type: Option<SportType> = None;
    let mut raw_segments: Vec<RawSegment> = Vec::new();

    let mut seen_root = false;
    let mut depth = 0usize;
    let mut in_workout = false;
    let mut in_tags = false;
    let mut current_element: Option<String> = None;
    let mut text = String::new();
    let mut current_segment: Option<RawSegment> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = element_name(e);
                if !seen_root {
                    check_root(&name)?;
                    seen_root = true;
                } else if depth == 1 {
                    match name.as_str() {
                        "author" | "name" | "description" | "sportType" => {
                            current_element = Some(name.clone());
                            text.clear();
                        }
                        "tags" => {
                            in_tags = true;
                            file.tags.get_or_insert_with(Vec::new);
                        }
                        "workout" => in_workout = true,
                        _ => {}
                    }
                } else if in_workout && depth == 2 {
                    current_segment = Some(RawSegment {
                        element: name,
                        attributes: attributes(e)?,
                        events: Vec::new(),
                    });
                } else if in_tags && name == "tag" {
                    push_tag(&mut file, e)?;
                } else if let (Some(segment), "textevent") = (current_segment.as_mut(), name.as_str())
                {
                    segment.events.push(text_event(e)?);
                }
                depth += 1;
            }
            Ok(Event::Empty(ref e)) => {
                let name = element_name(e);
                if !seen_root {
                    check_root(&name)?;
                    seen_root = true;
                } else if in_workout && depth == 2 {
                    raw_segments.push(RawSegment {
                        element: name,
                        attributes: attributes(e)?,
                        events: Vec::new(),
                    });
                } else if in_tags && name == "tag" {
                    push_tag(&mut file, e)?;
                } else if depth == 1 && name == "tags" {
                    file.tags.get_or_insert_with(Vec::new);
                } else if let (Some(segment), "textevent") = (current_segment.as_mut(), name.as_str())
                {
                    segment.events.push(text_event(e)?);
                }
            }
            Ok(Event::Text(e)) => {
                if current_element.is_some() {
                    let value = e.unescape().map_err(|e| {
                        WorkoutParseError::InvalidXml(format!("Failed to unescape text: {}", e))
                    })?;
                    text.push_str(&value);
                }
            }
            Ok(Event::CData(e)) => {
                if current_element.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if depth == 1 {
                    match name.as_str() {
                        "workout" => in_workout = false,
                        "tags" => in_tags = false,
                        _ => {}
                    }
                    if let Some(element) = current_element.take() {
                        let value = std::mem::take(&mut text);
                        match element.as_str() {
                            "author" => file.author = Some(value),
                            "name" => file.name = Some(value),
                            "description" => file.description = Some(value),
                            "sportType" => {
                                sport_type = SportType::parse(&value);
                                if sport_type.is_none() {
                                    tracing::warn!(value = %value, "Unknown sport type, reading as bike");
                                }
                            }
                            _ => {}
                        }
                    }
                } else if depth == 2 && in_workout {
                    if let Some(segment) = current_segment.take() {
                        raw_segments.push(segment);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(WorkoutParseError::InvalidXml(format!(
                    "XML parsing error: {}",
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(WorkoutParseError::InvalidXml(
            "Document has no root element".to_string(),
        ));
    }

    let sport = sport_type.unwrap_or_default();
    file.sport_type = sport;

    // Running position of the next segment, in seconds or meters.
    let mut position = 0u32;
    for raw in raw_segments {
        let advance = match build_segment(&raw, sport)? {
            Some(segment) => {
                let span = segment.span(sport);
                file.segments.push(segment);
                span
            }
            None => {
                tracing::warn!(element = %raw.element, "Skipping unsupported workout element");
                number(&raw.attributes, "Duration")?.map(to_units).unwrap_or(0)
            }
        };

        for (offset, message) in raw.events {
            file.annotations.push(Annotation::new(
                message,
                position.saturating_add(offset),
                sport,
            ));
        }
        position = position.saturating_add(advance);
    }

    tracing::debug!(
        sport = %sport,
        segments = file.segments.len(),
        annotations = file.annotations.len(),
        "Parsed workout file"
    );

    Ok(file)
}

/// Parse a ZWO workout from a file path.
pub fn parse_zwo_file(path: &std::path::Path) -> Result<WorkoutFile, WorkoutParseError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| WorkoutParseError::IoError(format!("Failed to read file: {}", e)))?;
    parse_zwo(&content)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn check_root(name: &str) -> Result<(), WorkoutParseError> {
    if name == "workout_file" {
        Ok(())
    } else {
        Err(WorkoutParseError::UnexpectedRoot(name.to_string()))
    }
}

fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>, WorkoutParseError> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| {
            WorkoutParseError::InvalidXml(format!("Malformed attribute: {}", e))
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().map_err(|e| {
            WorkoutParseError::InvalidXml(format!("Failed to unescape attribute: {}", e))
        })?;
        map.insert(key, value.to_string());
    }
    Ok(map)
}

fn push_tag(file: &mut WorkoutFile, e: &BytesStart<'_>) -> Result<(), WorkoutParseError> {
    let attributes = attributes(e)?;
    let Some(name) = attributes.get("name") else {
        return Ok(());
    };
    match WorkoutTag::parse(name) {
        Some(tag) => {
            let tags = file.tags.get_or_insert_with(Vec::new);
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        None => tracing::warn!(tag = %name, "Ignoring unknown workout tag"),
    }
    Ok(())
}

fn text_event(e: &BytesStart<'_>) -> Result<(u32, String), WorkoutParseError> {
    let attributes = attributes(e)?;
    let offset = number(&attributes, "timeoffset")?.map(to_units).unwrap_or(0);
    let message = attributes.get("message").cloned().unwrap_or_default();
    Ok((offset, message))
}

/// Numeric attribute, `None` when absent.
fn number(
    attributes: &HashMap<String, String>,
    field: &str,
) -> Result<Option<f64>, WorkoutParseError> {
    match attributes.get(field) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| WorkoutParseError::InvalidValue {
                field: field.to_string(),
                value: value.clone(),
            }),
    }
}

fn required(attributes: &HashMap<String, String>, field: &str) -> Result<f64, WorkoutParseError> {
    number(attributes, field)?.ok_or_else(|| WorkoutParseError::MissingField(field.to_string()))
}

/// Whole seconds or meters from an attribute value.
fn to_units(value: f64) -> u32 {
    value.round().clamp(0.0, u32::MAX as f64) as u32
}

/// Pace attribute; written lowercase, but some files capitalize it.
fn pace(attributes: &HashMap<String, String>) -> Result<PaceIndex, WorkoutParseError> {
    let value = match number(attributes, "pace")? {
        Some(value) => Some(value),
        None => number(attributes, "Pace")?,
    };
    Ok(match value {
        None => PaceIndex::default(),
        Some(value) => PaceIndex::from_index(to_units(value) as usize).unwrap_or_else(|| {
            tracing::warn!(pace = value, "Pace index out of range, using one mile");
            PaceIndex::default()
        }),
    })
}

fn cadence(attributes: &HashMap<String, String>) -> Result<u16, WorkoutParseError> {
    Ok(number(attributes, "Cadence")?
        .map(|value| value.round().clamp(0.0, u16::MAX as f64) as u16)
        .unwrap_or(0))
}

/// Build a segment from a raw element. Unknown elements yield `None`.
fn build_segment(raw: &RawSegment, sport: SportType) -> Result<Option<Segment>, WorkoutParseError> {
    let attrs = &raw.attributes;

    let segment = match raw.element.as_str() {
        "SteadyState" => {
            let power = match number(attrs, "Power")? {
                Some(power) => power,
                None => required(attrs, "PowerLow")?,
            };
            let extent = to_units(required(attrs, "Duration")?);
            let mut params = SteadyParams::new(power);
            params.cadence = cadence(attrs)?;
            params.pace = pace(attrs)?;
            match sport {
                SportType::Bike => params.duration_seconds = extent,
                SportType::Run => params.length_meters = extent,
            }
            params.into_segment()
        }
        "Warmup" | "Ramp" | "Cooldown" => {
            let extent = to_units(required(attrs, "Duration")?);
            let mut params = RampParams::new(required(attrs, "PowerLow")?, required(attrs, "PowerHigh")?);
            params.pace = pace(attrs)?;
            match sport {
                SportType::Bike => params.duration_seconds = extent,
                SportType::Run => params.length_meters = extent,
            }
            params.into_segment()
        }
        "IntervalsT" => {
            let on = number(attrs, "OnDuration")?;
            let off = number(attrs, "OffDuration")?;
            if on.is_none() && off.is_none() {
                return Err(WorkoutParseError::MissingField("OnDuration".to_string()));
            }

            let mut params = IntervalsParams {
                cadence: cadence(attrs)?,
                pace: pace(attrs)?,
                ..IntervalsParams::default()
            };
            if let Some(repeat) = number(attrs, "Repeat")? {
                params.repeat = to_units(repeat);
            }
            if let Some(power) = number(attrs, "OnPower")? {
                params.on_power = power;
            }
            if let Some(power) = number(attrs, "OffPower")? {
                params.off_power = power;
            }
            let on = on.map(to_units).unwrap_or(0);
            let off = off.map(to_units).unwrap_or(0);
            match sport {
                SportType::Bike => {
                    params.on_duration_seconds = on;
                    params.off_duration_seconds = off;
                }
                SportType::Run => {
                    params.on_length_meters = on;
                    params.off_length_meters = off;
                }
            }
            params.into_segment()
        }
        "FreeRide" => {
            let duration_seconds = number(attrs, "Duration")?
                .map(to_units)
                .unwrap_or(DEFAULT_FREE_RIDE_SECONDS);
            Segment::new(
                Block::FreeRide { duration_seconds },
                cadence(attrs)?,
                PaceIndex::default(),
            )
        }
        _ => return Ok(None),
    };

    Ok(Some(segment))
}
