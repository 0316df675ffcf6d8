use crate::types::{GpxPoint, Workout};
use anyhow::{Context, Result};
use chrono::SecondsFormat;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::Path;

/// Track points and waypoints, in document order.
pub fn parse_gpx_points(path: &Path) -> Result<Vec<GpxPoint>> {
    let bytes = fs::read(path).with_context(|| format!("reading GPX: {}", path.display()))?;
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    let cursor = Cursor::new(bytes);
    let reader = BufReader::new(cursor);
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut out: Vec<GpxPoint> = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e) | Event::Empty(e)) if is_point(e.name().as_ref()) => {
                if let (Some(lat), Some(lon)) = parse_point_lat_lon(&e) {
                    out.push(GpxPoint { lat, lon });
                }
            }
            Err(e) => anyhow::bail!("GPX XML parse error: {e}"),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

/// First usable point of a GPX file, if any.
pub fn first_point(path: &Path) -> Result<Option<GpxPoint>> {
    Ok(parse_gpx_points(path)?.into_iter().next())
}

fn is_point(name: &[u8]) -> bool {
    matches!(name, b"trkpt" | b"wpt" | b"rtept")
}

fn parse_point_lat_lon(e: &BytesStart<'_>) -> (Option<f64>, Option<f64>) {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for a in e.attributes().with_checks(false).flatten() {
        let key = a.key.as_ref();
        if key == b"lat"
            && let Ok(v) = a.unescape_value()
        {
            lat = v.parse::<f64>().ok();
        } else if key == b"lon"
            && let Ok(v) = a.unescape_value()
        {
            lon = v.parse::<f64>().ok();
        }
    }

    (lat, lon)
}

/// Write one waypoint per workout marker.
pub fn write_waypoints(path: &Path, workouts: &[Workout]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_waypoints_to(&mut out, workouts)?;
    out.flush()
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), waypoints = workouts.len(), "exported GPX");
    Ok(())
}

pub fn write_waypoints_to<W: Write>(inner: W, workouts: &[Workout]) -> Result<()> {
    let mut xml = Writer::new_with_indent(inner, b' ', 2);

    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    xml.write_event(Event::Start(BytesStart::new("gpx").with_attributes([
        ("version", "1.1"),
        ("creator", "trailmark"),
        ("xmlns", "http://www.topografix.com/GPX/1/1"),
    ])))?;

    for w in workouts {
        let coords = w.coords();
        let lat = coords.lat.to_string();
        let lon = coords.lng.to_string();
        xml.write_event(Event::Start(
            BytesStart::new("wpt").with_attributes([("lat", lat.as_str()), ("lon", lon.as_str())]),
        ))?;

        let time = w.created_at().to_rfc3339_opts(SecondsFormat::Millis, true);
        let s = w.summarize();
        let desc = format!(
            "{} km, {} min, {:.1} {}, {} {}",
            s.distance,
            s.duration,
            s.metric.value(),
            s.metric.unit(),
            s.detail.value(),
            s.detail.unit()
        );
        write_text_element(&mut xml, "time", &time)?;
        write_text_element(&mut xml, "name", w.description())?;
        write_text_element(&mut xml, "desc", &desc)?;
        write_text_element(&mut xml, "type", w.kind().as_str())?;

        xml.write_event(Event::End(BytesEnd::new("wpt")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("gpx")))?;
    Ok(())
}

fn write_text_element<W: Write>(xml: &mut Writer<W>, tag: &str, text: &str) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new(tag)))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
