// Offer Normalizer: one raw supplier offer record in, one canonical
// FlightOffer out. Pure and panic-free; a malformed record degrades field by
// field instead of failing the whole batch.

use crate::extract::{all_legs, coerce_f64, coerce_u32, first_leg, opt_str, str_or_empty};
use crate::models::{CabinClass, FlightOffer, UNKNOWN_TIME};
use chrono::NaiveDateTime;
use serde_json::Value;

/// Timestamp formats observed from the aggregator, tried in order.
const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a supplier timestamp defensively. Returns the parsed value plus its
/// wall-clock display; unparsable input renders the `--:--` sentinel.
fn parse_time(value: &Value) -> (Option<NaiveDateTime>, String) {
    let raw = match value.as_str() {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => return (None, UNKNOWN_TIME.to_string()),
    };

    let parsed = chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| {
            TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        });

    match parsed {
        Some(dt) => (Some(dt), dt.format("%H:%M").to_string()),
        None => (None, UNKNOWN_TIME.to_string()),
    }
}

/// Normalize one raw offer record. `fallback_index` is the record's position
/// in the batch and becomes the offer id of last resort, so an id is always
/// present.
pub fn normalize(raw: &Value, fallback_index: usize) -> FlightOffer {
    let segments = &raw["segments"];
    let leg = first_leg(segments).cloned().unwrap_or(Value::Null);
    let legs = all_legs(segments);

    let offer_id = opt_str(&raw["result_index"])
        .or_else(|| opt_str(&raw["result_id"]))
        .unwrap_or_else(|| fallback_index.to_string());

    let (depart_at, depart_time) = parse_time(&leg["depart_time"]);
    let (arrive_at, arrive_time) = parse_time(&leg["arrive_time"]);

    let stop_count = if !legs.is_empty() {
        (legs.len() as u32).saturating_sub(1)
    } else if raw["stop_over"].as_bool().unwrap_or(false) {
        1
    } else {
        0
    };

    let fare = &raw["fare"];

    FlightOffer {
        offer_id,
        origin: str_or_empty(&leg["origin"]),
        destination: str_or_empty(&leg["destination"]),
        depart_time,
        arrive_time,
        depart_at,
        arrive_at,
        duration_minutes: coerce_u32(&leg["duration"]),
        stop_count,
        airline_code: str_or_empty(&leg["airline"]["airline_code"]),
        airline_name: str_or_empty(&leg["airline"]["airline_name"]),
        flight_number: str_or_empty(&leg["airline"]["flight_number"]),
        cabin: CabinClass::from_code(coerce_u32(&leg["cabin_class"])),
        published_fare: coerce_f64(&fare["published_fare"]),
        currency: str_or_empty(&fare["currency"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn leg_object() -> Value {
        json!({
            "origin": "BOM",
            "destination": "DEL",
            "depart_time": "2025-11-20T06:15:00",
            "arrive_time": "2025-11-20T08:20:00",
            "duration": 125,
            "cabin_class": 2,
            "airline": {
                "airline_code": "AI",
                "airline_name": "Air India",
                "flight_number": "441"
            }
        })
    }

    #[test_case(json!([[leg_object()]]) ; "nested array of arrays")]
    #[test_case(json!([leg_object()]) ; "flat array")]
    #[test_case(leg_object() ; "bare object")]
    fn all_leg_shapes_normalize(segments: Value) {
        let raw = json!({
            "result_index": "OB7",
            "segments": segments,
            "fare": {"published_fare": 5230.0, "currency": "INR"}
        });

        let offer = normalize(&raw, 0);
        assert_eq!(offer.offer_id, "OB7");
        assert_eq!(offer.origin, "BOM");
        assert_eq!(offer.destination, "DEL");
        assert_eq!(offer.depart_time, "06:15");
        assert_eq!(offer.published_fare, 5230.0);
        assert_eq!(offer.stop_count, 0);
    }

    #[test]
    fn offer_id_fallback_chain() {
        let secondary = json!({"result_id": "R99", "segments": [leg_object()]});
        assert_eq!(normalize(&secondary, 3).offer_id, "R99");

        let neither = json!({"segments": [leg_object()]});
        assert_eq!(normalize(&neither, 3).offer_id, "3");

        // Numeric primary field still yields a string id
        let numeric = json!({"result_index": 14, "segments": [leg_object()]});
        assert_eq!(normalize(&numeric, 0).offer_id, "14");
    }

    #[test]
    fn unparsable_timestamp_renders_sentinel() {
        let mut leg = leg_object();
        leg["depart_time"] = json!("not-a-time");
        leg["arrive_time"] = json!(null);
        let raw = json!({"result_index": "X", "segments": [leg]});

        let offer = normalize(&raw, 0);
        assert_eq!(offer.depart_time, "--:--");
        assert_eq!(offer.arrive_time, "--:--");
        assert!(offer.depart_at.is_none());
    }

    #[test]
    fn numeric_garbage_coerces_to_zero() {
        let mut leg = leg_object();
        leg["duration"] = json!("soon");
        let raw = json!({
            "result_index": "X",
            "segments": [leg],
            "fare": {"published_fare": "NaN", "currency": "INR"}
        });

        let offer = normalize(&raw, 0);
        assert_eq!(offer.duration_minutes, 0);
        assert_eq!(offer.published_fare, 0.0);
    }

    #[test]
    fn stop_count_from_leg_array_then_flag() {
        let two_legs = json!({
            "result_index": "X",
            "segments": [[leg_object(), leg_object()]]
        });
        assert_eq!(normalize(&two_legs, 0).stop_count, 1);

        let flag_only = json!({"result_index": "X", "stop_over": true});
        assert_eq!(normalize(&flag_only, 0).stop_count, 1);

        let nothing = json!({"result_index": "X"});
        assert_eq!(normalize(&nothing, 0).stop_count, 0);
    }

    #[test]
    fn unknown_cabin_code_defaults_to_economy() {
        let mut leg = leg_object();
        leg["cabin_class"] = json!(42);
        let raw = json!({"result_index": "X", "segments": [leg]});
        assert_eq!(normalize(&raw, 0).cabin, CabinClass::Economy);
    }

    #[test]
    fn normalize_is_idempotent_on_identical_input() {
        let raw = json!({
            "result_index": "OB7",
            "segments": [[leg_object()]],
            "fare": {"published_fare": 5230.0, "currency": "INR"}
        });
        assert_eq!(normalize(&raw, 0), normalize(&raw, 0));
    }

    #[test]
    fn empty_record_still_produces_an_offer() {
        let offer = normalize(&json!({}), 12);
        assert_eq!(offer.offer_id, "12");
        assert_eq!(offer.depart_time, "--:--");
        assert_eq!(offer.stop_count, 0);
        assert_eq!(offer.published_fare, 0.0);
    }
}
