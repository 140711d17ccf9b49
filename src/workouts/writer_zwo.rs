//! Zwift workout (.zwo) file writer.
//!
//! Segments are written in order while running totals of time and distance
//! are kept; each annotation is nested under the segment whose
//! `[start, start + span)` window contains it, with `timeoffset` relative to
//! the segment start. Run workouts write lengths into the `Duration`
//! attributes.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

use crate::workouts::types::{Annotation, Block, Segment, SportType, Workout, WorkoutExportError};

/// Serialize a workout to .zwo XML.
pub fn write_zwo(workout: &Workout) -> Result<String, WorkoutExportError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    let sport = workout.sport_type;

    writer
        .write_event(Event::Start(BytesStart::new("workout_file")))
        .map_err(xml_error)?;

    write_element(&mut writer, "author", &workout.author)?;
    write_element(&mut writer, "name", &workout.name)?;
    write_element(&mut writer, "description", &workout.description)?;
    write_element(&mut writer, "sportType", sport.as_str())?;

    writer
        .write_event(Event::Start(BytesStart::new("tags")))
        .map_err(xml_error)?;
    for tag in &workout.tags {
        let mut element = BytesStart::new("tag");
        element.push_attribute(("name", tag.as_str()));
        writer.write_event(Event::Empty(element)).map_err(xml_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("tags")))
        .map_err(xml_error)?;

    writer
        .write_event(Event::Start(BytesStart::new("workout")))
        .map_err(xml_error)?;

    let mut total_time = 0u32;
    let mut total_length = 0u32;
    let mut placed = 0usize;

    for (index, segment) in workout.segments.iter().enumerate() {
        let start = match sport {
            SportType::Bike => total_time,
            SportType::Run => total_length,
        };
        let events = annotations_within(&workout.annotations, sport, start, segment.span(sport));
        placed += events.len();

        write_segment(
            &mut writer,
            segment,
            element_name(segment, index, workout.segments.len()),
            sport,
            start,
            &events,
        )?;

        total_time = total_time.saturating_add(segment.duration_seconds());
        total_length = total_length.saturating_add(segment.length_meters());
    }

    writer
        .write_event(Event::End(BytesEnd::new("workout")))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new("workout_file")))
        .map_err(xml_error)?;

    if placed < workout.annotations.len() {
        tracing::warn!(
            skipped = workout.annotations.len() - placed,
            "Annotations outside every segment were not exported"
        );
    }
    tracing::debug!(
        workout = %workout.id,
        segments = workout.segments.len(),
        annotations = placed,
        "Serialized workout"
    );

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).map_err(|e| WorkoutExportError::XmlError(e.to_string()))
}

/// Element name for a segment at `index` of `count`.
///
/// Ramps are labelled by position only: last is `Cooldown`, first is
/// `Warmup`, anything else `Ramp`. A lone ramp is a `Cooldown`.
fn element_name(segment: &Segment, index: usize, count: usize) -> &'static str {
    match segment.block {
        Block::Steady { .. } => "SteadyState",
        Block::Ramp { .. } if index + 1 == count => "Cooldown",
        Block::Ramp { .. } if index == 0 => "Warmup",
        Block::Ramp { .. } => "Ramp",
        Block::Intervals { .. } => "IntervalsT",
        Block::FreeRide { .. } => "FreeRide",
    }
}

/// Annotations positioned inside `[start, start + span)`, in position order.
fn annotations_within(
    annotations: &[Annotation],
    sport: SportType,
    start: u32,
    span: u32,
) -> Vec<&Annotation> {
    let end = start.saturating_add(span);
    let mut within: Vec<&Annotation> = annotations
        .iter()
        .filter(|annotation| {
            let position = annotation.position(sport);
            position >= start && position < end
        })
        .collect();
    within.sort_by_key(|annotation| annotation.position(sport));
    within
}

/// Write one segment element with its nested text events.
fn write_segment<W: std::io::Write>(
    writer: &mut Writer<W>,
    segment: &Segment,
    name: &'static str,
    sport: SportType,
    start: u32,
    events: &[&Annotation],
) -> Result<(), WorkoutExportError> {
    let mut element = BytesStart::new(name);
    let pace = u8::from(segment.pace).to_string();

    let extent = |seconds: u32, meters: u32| match sport {
        SportType::Bike => seconds.to_string(),
        SportType::Run => meters.to_string(),
    };

    match segment.block {
        Block::Steady {
            duration_seconds,
            length_meters,
            power,
        } => {
            element.push_attribute(("Duration", extent(duration_seconds, length_meters).as_str()));
            element.push_attribute(("Power", format_number(power).as_str()));
            element.push_attribute(("pace", pace.as_str()));
            if segment.cadence != 0 {
                element.push_attribute(("Cadence", segment.cadence.to_string().as_str()));
            }
        }
        Block::Ramp {
            duration_seconds,
            length_meters,
            start_power,
            end_power,
        } => {
            // PowerLow/PowerHigh follow start/end even for descending ramps,
            // which is what existing .zwo consumers expect.
            element.push_attribute(("Duration", extent(duration_seconds, length_meters).as_str()));
            element.push_attribute(("PowerLow", format_number(start_power).as_str()));
            element.push_attribute(("PowerHigh", format_number(end_power).as_str()));
            element.push_attribute(("pace", pace.as_str()));
        }
        Block::Intervals {
            repeat,
            on_duration_seconds,
            off_duration_seconds,
            on_length_meters,
            off_length_meters,
            on_power,
            off_power,
        } => {
            element.push_attribute(("Repeat", repeat.to_string().as_str()));
            element.push_attribute((
                "OnDuration",
                extent(on_duration_seconds, on_length_meters).as_str(),
            ));
            element.push_attribute((
                "OffDuration",
                extent(off_duration_seconds, off_length_meters).as_str(),
            ));
            element.push_attribute(("OnPower", format_number(on_power).as_str()));
            element.push_attribute(("OffPower", format_number(off_power).as_str()));
            element.push_attribute(("pace", pace.as_str()));
        }
        Block::FreeRide { duration_seconds } => {
            element.push_attribute(("Duration", duration_seconds.to_string().as_str()));
        }
    }

    if events.is_empty() {
        writer.write_event(Event::Empty(element)).map_err(xml_error)?;
        return Ok(());
    }

    writer.write_event(Event::Start(element)).map_err(xml_error)?;
    for annotation in events {
        let offset = annotation.position(sport) - start;
        let mut event = BytesStart::new("textevent");
        event.push_attribute(("timeoffset", offset.to_string().as_str()));
        event.push_attribute(("message", annotation.text.as_str()));
        writer.write_event(Event::Empty(event)).map_err(xml_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)?;

    Ok(())
}

/// Write a simple element with text content.
fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), WorkoutExportError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)?;

    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(xml_error)?;

    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)?;

    Ok(())
}

/// Shortest decimal form of a power fraction (`1`, `0.75`).
fn format_number(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        "0".to_string()
    }
}

fn xml_error(e: quick_xml::Error) -> WorkoutExportError {
    WorkoutExportError::XmlError(e.to_string())
}

/// Serialize a workout and write it to a file.
pub fn write_zwo_to_file(workout: &Workout, path: &std::path::Path) -> Result<(), WorkoutExportError> {
    let content = write_zwo(workout)?;
    std::fs::write(path, content)?;
    Ok(())
}
