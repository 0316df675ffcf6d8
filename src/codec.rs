//! JSON blob <-> typed workouts.
//!
//! The stored form is a JSON array of flat records using the field names the
//! browser version of the app wrote to local storage, so older blobs load
//! as-is. Decoding never copies a record into place: every element is parsed,
//! validated and passed through the `Workout` constructor for its `type`.

use crate::dlog;
use crate::error::{CodecError, DecodeAnomaly, ValidationError};
use crate::types::{Activity, Coords, Metric, Workout, WorkoutId, WorkoutKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;

/// Relative tolerance when comparing a stored derived metric to the formula.
const METRIC_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub date: DateTime<Utc>,
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub clicks: u32,
    pub coords: [f64; 2],
    pub distance: f64,
    pub duration: f64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_gain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<&Workout> for WorkoutRecord {
    fn from(w: &Workout) -> Self {
        let (cadence, pace, elevation_gain, speed) = match w.activity() {
            Activity::Running { cadence, pace } => (Some(cadence), Some(pace), None, None),
            Activity::Cycling {
                elevation_gain,
                speed,
            } => (None, None, Some(elevation_gain), Some(speed)),
        };

        Self {
            date: w.created_at(),
            id: w.identify().to_string(),
            clicks: w.clicks(),
            coords: w.coords().to_array(),
            distance: w.distance(),
            duration: w.duration(),
            kind: w.kind().as_str().to_string(),
            cadence,
            pace,
            elevation_gain,
            speed,
            description: Some(w.description().to_string()),
        }
    }
}

/// Workouts rebuilt from a blob, plus every record that had to be skipped.
#[derive(Debug, Default)]
pub struct Decoded {
    pub workouts: Vec<Workout>,
    pub anomalies: Vec<DecodeAnomaly>,
}

pub fn encode(workouts: &[Workout]) -> Result<String, CodecError> {
    let records: Vec<WorkoutRecord> = workouts.iter().map(WorkoutRecord::from).collect();
    Ok(serde_json::to_string(&records)?)
}

pub fn decode(blob: &str) -> Result<Decoded, CodecError> {
    let items = match serde_json::from_str::<JsonValue>(blob)? {
        JsonValue::Null => return Ok(Decoded::default()),
        JsonValue::Array(items) => items,
        other => return Err(CodecError::NotAnArray(json_type_name(&other))),
    };

    let mut out = Decoded {
        workouts: Vec::with_capacity(items.len()),
        anomalies: Vec::new(),
    };

    // First occurrence of an id wins.
    let mut seen: HashSet<String> = HashSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let decoded = decode_record(index, item).and_then(|workout| {
            let id = workout.identify().as_str();
            if seen.insert(id.to_owned()) {
                Ok(workout)
            } else {
                Err(DecodeAnomaly::DuplicateId {
                    index,
                    id: id.to_owned(),
                })
            }
        });

        match decoded {
            Ok(workout) => out.workouts.push(workout),
            Err(anomaly) => {
                tracing::warn!(%anomaly, "skipping stored workout");
                out.anomalies.push(anomaly);
            }
        }
    }

    dlog!(
        "decoded workouts={} skipped={}",
        out.workouts.len(),
        out.anomalies.len()
    );
    Ok(out)
}

fn decode_record(index: usize, item: JsonValue) -> Result<Workout, DecodeAnomaly> {
    let Some(kind) = item.get("type").and_then(JsonValue::as_str) else {
        return Err(DecodeAnomaly::NotARecord {
            index,
            reason: "missing string field `type`".to_string(),
        });
    };
    let kind = kind.parse::<WorkoutKind>().map_err(|_| DecodeAnomaly::UnknownKind {
        index,
        kind: kind.to_string(),
    })?;

    let record: WorkoutRecord =
        serde_json::from_value(item).map_err(|e| DecodeAnomaly::NotARecord {
            index,
            reason: e.to_string(),
        })?;

    rebuild(kind, record).map_err(|source| DecodeAnomaly::Invalid { index, source })
}

fn rebuild(kind: WorkoutKind, r: WorkoutRecord) -> Result<Workout, ValidationError> {
    let coords = Coords::new(r.coords[0], r.coords[1])?;
    let id = WorkoutId::new(r.id);

    let workout = match kind {
        WorkoutKind::Running => {
            let cadence = r.cadence.unwrap_or(f64::NAN);
            Workout::running(id, r.date, coords, r.distance, r.duration, cadence)?
        }
        WorkoutKind::Cycling => {
            let elevation = r.elevation_gain.unwrap_or(f64::NAN);
            Workout::cycling(id, r.date, coords, r.distance, r.duration, elevation)?
        }
    };

    let stored = match workout.metric() {
        Metric::Pace(_) => r.pace,
        Metric::Speed(_) => r.speed,
    };
    if let Some(stored) = stored {
        let computed = workout.metric().value();
        if (stored - computed).abs() > METRIC_TOLERANCE * computed.abs().max(1.0) {
            dlog!(
                "stored_metric_mismatch id={} stored={stored} computed={computed}",
                workout.identify()
            );
        }
    }

    Ok(workout.with_history(r.clicks, r.description))
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "id must be a string or number, found {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(2024, 4, day, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn sample() -> Vec<Workout> {
        let here = Coords::new(39.0, -12.0).unwrap();
        let mut run =
            Workout::running(WorkoutId::new("1713096000000"), at(14), here, 5.2, 24.0, 178.0)
                .unwrap();
        run.register_visit();
        let ride =
            Workout::cycling(WorkoutId::new("1713182400000"), at(15), here, 27.0, 95.0, -12.5)
                .unwrap();
        vec![run, ride]
    }

    #[test]
    fn round_trip_keeps_order_ids_and_summaries() {
        let original = sample();
        let blob = encode(&original).unwrap();
        let decoded = decode(&blob).unwrap();

        assert!(decoded.anomalies.is_empty());
        assert_eq!(decoded.workouts.len(), original.len());
        for (a, b) in original.iter().zip(&decoded.workouts) {
            assert_eq!(a.identify(), b.identify());
            assert_eq!(a.summarize(), b.summarize());
            assert_eq!(a.clicks(), b.clicks());
        }
        assert_eq!(decoded.workouts, original);
    }

    /// xorshift64*, enough to spread values over the mantissa.
    fn next_unit(state: &mut u64) -> f64 {
        *state ^= *state >> 12;
        *state ^= *state << 25;
        *state ^= *state >> 27;
        let bits = state.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11;
        bits as f64 / (1u64 << 53) as f64
    }

    #[test]
    fn round_trip_is_exact_for_arbitrary_floats() {
        let here = Coords::new(38.716_523_918_7, -9.139_876_543_21).unwrap();
        let mut state = 0x9E37_79B9_7F4A_7C15_u64;

        let workouts: Vec<Workout> = (0..5_000)
            .map(|i| {
                let id = WorkoutId::new(i.to_string());
                let distance = 0.001 + next_unit(&mut state) * 200.0;
                let duration = 0.5 + next_unit(&mut state) * 600.0;
                let extra = next_unit(&mut state) * 2_000.0 - 500.0;
                let built = if i % 2 == 0 {
                    Workout::running(id, at(14), here, distance, duration, extra.abs() + 1.0)
                } else {
                    Workout::cycling(id, at(14), here, distance, duration, extra)
                };
                built.unwrap()
            })
            .collect();

        let decoded = decode(&encode(&workouts).unwrap()).unwrap();
        assert!(decoded.anomalies.is_empty());
        for (a, b) in workouts.iter().zip(&decoded.workouts) {
            assert_eq!(a.summarize(), b.summarize(), "id={}", a.identify());
            assert_eq!(a.coords(), b.coords());
        }
        assert_eq!(decoded.workouts, workouts);
    }

    #[test]
    fn wrapped_longitude_is_kept() {
        let blob = r#"[{"date":"2024-04-14T12:00:00Z","id":"1","coords":[39,200.5],
            "distance":5,"duration":24,"type":"running","cadence":178}]"#;
        let decoded = decode(blob).unwrap();
        assert!(decoded.anomalies.is_empty());
        assert_eq!(decoded.workouts[0].coords().to_array(), [39.0, 200.5]);
    }

    #[test]
    fn repeated_id_keeps_the_first_record() {
        let blob = r#"[
            {"date":"2024-04-14T12:00:00Z","id":"7","coords":[39,-12],
             "distance":5,"duration":24,"type":"running","cadence":178},
            {"date":"2024-04-14T13:00:00Z","id":"8","coords":[39,-12],
             "distance":10,"duration":30,"type":"cycling","elevationGain":40},
            {"date":"2024-04-14T14:00:00Z","id":7,"coords":[40,-11],
             "distance":27,"duration":95,"type":"cycling","elevationGain":523}
        ]"#;

        let decoded = decode(blob).unwrap();
        let ids: Vec<&str> = decoded.workouts.iter().map(|w| w.identify().as_str()).collect();
        assert_eq!(ids, vec!["7", "8"]);
        assert_eq!(decoded.workouts[0].kind(), WorkoutKind::Running);
        assert_eq!(
            decoded.anomalies,
            vec![DecodeAnomaly::DuplicateId {
                index: 2,
                id: "7".into()
            }]
        );
    }

    #[test]
    fn decoded_workouts_keep_their_behavior() {
        let blob = encode(&sample()).unwrap();
        let mut decoded = decode(&blob).unwrap().workouts;
        decoded[1].register_visit();
        assert_eq!(decoded[1].clicks(), 1);
        assert_eq!(decoded[1].metric(), Metric::Speed(27.0 / (95.0 / 60.0)));
    }

    #[test]
    fn unknown_kind_is_skipped() {
        let blob = r#"[
            {"date":"2024-04-14T12:00:00.000Z","id":"1","clicks":0,"coords":[39,-12],
             "distance":5,"duration":24,"type":"running","cadence":178,"pace":4.8,
             "description":"Running on April 14"},
            {"date":"2024-04-14T13:00:00.000Z","id":"2","clicks":0,"coords":[39,-12],
             "distance":3,"duration":20,"type":"rowing","description":"Rowing on April 14"}
        ]"#;

        let decoded = decode(blob).unwrap();
        assert_eq!(decoded.workouts.len(), 1);
        assert_eq!(decoded.workouts[0].identify().as_str(), "1");
        assert_eq!(
            decoded.anomalies,
            vec![DecodeAnomaly::UnknownKind {
                index: 1,
                kind: "rowing".into()
            }]
        );
    }

    #[test]
    fn invariant_violations_and_garbage_are_skipped() {
        let blob = r#"[
            {"date":"2024-04-14T12:00:00Z","id":"1","coords":[39,-12],
             "distance":-5,"duration":24,"type":"running","cadence":178},
            {"date":"2024-04-14T12:00:00Z","id":"2","coords":[39,-12],
             "distance":5,"duration":24,"type":"running"},
            42,
            {"id":"4","type":"cycling"},
            {"date":"2024-04-14T12:00:00Z","id":"5","coords":[39,-12],
             "distance":10,"duration":30,"type":"cycling","elevationGain":0}
        ]"#;

        let decoded = decode(blob).unwrap();
        assert_eq!(decoded.workouts.len(), 1);
        assert_eq!(decoded.workouts[0].identify().as_str(), "5");

        let skipped: Vec<usize> = decoded.anomalies.iter().map(DecodeAnomaly::index).collect();
        assert_eq!(skipped, vec![0, 1, 2, 3]);
        assert!(matches!(
            decoded.anomalies[0],
            DecodeAnomaly::Invalid {
                source: ValidationError::NotPositive { field: "distance", .. },
                ..
            }
        ));
        assert!(matches!(
            decoded.anomalies[1],
            DecodeAnomaly::Invalid {
                source: ValidationError::NotFinite { field: "cadence" },
                ..
            }
        ));
    }

    #[test]
    fn reads_browser_blob_with_numeric_id_and_no_description() {
        let blob = r#"[{"date":"2024-04-14T12:00:00.000Z","id":1713096000000,"clicks":3,
            "coords":[51.5,-0.12],"distance":27,"duration":95,"type":"cycling",
            "elevationGain":523,"speed":17.05263157894737}]"#;

        let decoded = decode(blob).unwrap();
        let w = &decoded.workouts[0];
        assert_eq!(w.identify().as_str(), "1713096000000");
        assert_eq!(w.clicks(), 3);
        assert!(w.description().starts_with("Cycling on April"));
    }

    #[test]
    fn stored_metric_is_replaced_by_formula() {
        let blob = r#"[{"date":"2024-04-14T12:00:00Z","id":"1","coords":[0,0],
            "distance":5,"duration":24,"type":"running","cadence":170,"pace":99}]"#;
        let decoded = decode(blob).unwrap();
        assert_eq!(decoded.workouts[0].metric(), Metric::Pace(4.8));
    }

    #[test]
    fn null_blob_is_empty_and_non_array_is_an_error() {
        assert!(decode("null").unwrap().workouts.is_empty());
        assert!(decode("[]").unwrap().workouts.is_empty());
        assert!(matches!(
            decode(r#"{"workouts":[]}"#),
            Err(CodecError::NotAnArray("object"))
        ));
        assert!(matches!(decode("not json"), Err(CodecError::Json(_))));
    }

    #[test]
    fn encoded_records_use_storage_field_names() {
        let blob = encode(&sample()).unwrap();
        let value: JsonValue = serde_json::from_str(&blob).unwrap();
        let run = &value[0];
        assert_eq!(run["type"], "running");
        assert_eq!(run["coords"], serde_json::json!([39.0, -12.0]));
        assert_eq!(run["clicks"], 1);
        assert!(run.get("elevationGain").is_none());
        assert_eq!(value[1]["elevationGain"], -12.5);
    }
}
