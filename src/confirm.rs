// Confirmation Fetcher: the binding fare quote and the descriptive fare
// rules are requested together and settled independently. Only the quote is
// load-bearing; a failed rules call degrades to a warning.

use crate::client::AggregatorApi;
use crate::error::{Error, RulesWarning};
use crate::extract::{all_legs, coerce_f64, coerce_u32, str_or_empty};
use crate::models::{
    FareBreakdown, FareConfirmation, PassengerType, PaxFare, SegmentRef, SupplierFamily,
};
use crate::supplier::{self, FareQuoteWire, FareRuleWire};
use serde_json::Value;

/// A usable confirmation plus the non-fatal outcome of the rules call.
#[derive(Debug, Clone)]
pub struct ConfirmedFare {
    pub confirmation: FareConfirmation,
    pub warning: Option<RulesWarning>,
}

fn pax_type_from_code(code: u32) -> PassengerType {
    match code {
        2 => PassengerType::Child,
        3 => PassengerType::Infant,
        _ => PassengerType::Adult,
    }
}

fn parse_segments(segments: &Value) -> Vec<SegmentRef> {
    all_legs(segments)
        .into_iter()
        .map(|leg| SegmentRef {
            airline_code: str_or_empty(&leg["airline"]["airline_code"]),
            flight_number: str_or_empty(&leg["airline"]["flight_number"]),
            origin: str_or_empty(&leg["origin"]),
            destination: str_or_empty(&leg["destination"]),
        })
        .collect()
}

fn parse_confirmation(body: &Value, trace_id: &str, offer_id: &str) -> FareConfirmation {
    let result = &supplier::envelope(body)["result"];
    let fare = &result["fare"];

    let pax_fares = result["pax_fares"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .map(|entry| PaxFare {
                    pax_type: pax_type_from_code(coerce_u32(&entry["pax_type"])),
                    base_fare: coerce_f64(&entry["base_fare"]),
                    tax: coerce_f64(&entry["tax"]),
                })
                .collect()
        })
        .unwrap_or_default();

    let family = if result["is_lcc"].as_bool().unwrap_or(false) {
        SupplierFamily::Lcc
    } else {
        SupplierFamily::Gds
    };

    FareConfirmation {
        trace_id: trace_id.to_string(),
        offer_id: offer_id.to_string(),
        fare: FareBreakdown {
            base_fare: coerce_f64(&fare["base_fare"]),
            tax: coerce_f64(&fare["tax"]),
            other_charges: coerce_f64(&fare["other_charges"]),
            discount: coerce_f64(&fare["discount"]),
            published_fare: coerce_f64(&fare["published_fare"]),
            currency: str_or_empty(&fare["currency"]),
        },
        pax_fares,
        refundable: result["refundable"].as_bool().unwrap_or(false),
        supplier_family: family,
        segments: parse_segments(&result["segments"]),
        fare_rules: String::new(),
    }
}

fn rules_text(body: &Value) -> String {
    let envelope = supplier::envelope(body);
    let text = str_or_empty(&envelope["rules"]);
    if !text.is_empty() {
        return text;
    }
    str_or_empty(&envelope["fare_rules"])
}

/// Confirm one offer: both calls go out together (settle-all, no fail-fast),
/// each bounded by its own endpoint budget. The quote result is never held
/// hostage by the rules call beyond that call's own timeout.
pub async fn confirm<A: AggregatorApi + ?Sized>(
    client: &A,
    trace_id: &str,
    offer_id: &str,
) -> Result<ConfirmedFare, Error> {
    let quote_request = FareQuoteWire {
        trace_id: trace_id.to_string(),
        result_index: offer_id.to_string(),
    };
    let rules_request = FareRuleWire {
        trace_id: trace_id.to_string(),
        result_index: offer_id.to_string(),
    };

    let (quote, rules) = futures::join!(
        client.fare_quote(&quote_request),
        client.fare_rule(&rules_request)
    );

    let quote_body = quote.map_err(|e| {
        tracing::error!(trace_id, offer_id, error = %e, "fare quote failed");
        e
    })?;
    let mut confirmation = parse_confirmation(&quote_body, trace_id, offer_id);

    let warning = match rules {
        Ok(rules_body) => {
            confirmation.fare_rules = rules_text(&rules_body);
            None
        }
        Err(e) => {
            tracing::warn!(trace_id, offer_id, error = %e, "fare rules unavailable");
            Some(RulesWarning::new(trace_id, offer_id, e.to_string()))
        }
    };

    Ok(ConfirmedFare {
        confirmation,
        warning,
    })
}

/// Manual retry of the rules call alone, for dismiss-and-retry UX after a
/// `RulesWarning`.
pub async fn refetch_rules<A: AggregatorApi + ?Sized>(
    client: &A,
    trace_id: &str,
    offer_id: &str,
) -> Result<String, Error> {
    let request = FareRuleWire {
        trace_id: trace_id.to_string(),
        result_index: offer_id.to_string(),
    };
    let body = client.fare_rule(&request).await?;
    Ok(rules_text(&body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockAggregator, Reply};
    use serde_json::json;
    use std::time::Duration;

    fn quote_body() -> Value {
        json!({
            "response": {
                "result": {
                    "fare": {
                        "base_fare": 4000.0,
                        "tax": 900.0,
                        "other_charges": 100.0,
                        "discount": 0.0,
                        "published_fare": 5000.0,
                        "currency": "INR"
                    },
                    "pax_fares": [
                        {"pax_type": 1, "base_fare": 4000.0, "tax": 900.0}
                    ],
                    "refundable": true,
                    "is_lcc": false,
                    "segments": [[
                        {
                            "origin": "BOM",
                            "destination": "DEL",
                            "airline": {"airline_code": "AI", "flight_number": "441"}
                        }
                    ]]
                }
            }
        })
    }

    #[tokio::test]
    async fn quote_and_rules_both_succeed() {
        let mock = MockAggregator::new();
        mock.on("fare-quote", Reply::Ok(quote_body()));
        mock.on(
            "fare-rule",
            Reply::Ok(json!({"response": {"rules": "Non-refundable after 24h"}})),
        );

        let confirmed = confirm(&mock, "t1", "OB7").await.unwrap();
        assert!(confirmed.warning.is_none());
        assert_eq!(confirmed.confirmation.fare_rules, "Non-refundable after 24h");
        assert_eq!(confirmed.confirmation.fare.total(), 5000.0);
        assert_eq!(confirmed.confirmation.supplier_family, SupplierFamily::Gds);
        assert_eq!(confirmed.confirmation.segments.len(), 1);
        assert!(confirmed.confirmation.refundable);
    }

    #[tokio::test]
    async fn rules_failure_degrades_to_warning_not_rejection() {
        let mock = MockAggregator::new();
        mock.on("fare-quote", Reply::Ok(quote_body()));
        mock.on("fare-rule", Reply::Timeout(5000));

        let confirmed = confirm(&mock, "t1", "OB7").await.unwrap();
        let warning = confirmed.warning.expect("expected rules warning");
        assert_eq!(warning.trace_id, "t1");
        assert_eq!(warning.offer_id, "OB7");
        assert!(warning.message.contains("5000ms"));
        assert!(confirmed.confirmation.fare_rules.is_empty());
    }

    #[tokio::test]
    async fn quote_failure_fails_the_whole_confirmation() {
        let mock = MockAggregator::new();
        mock.on("fare-quote", Reply::Supplier(500, "fare no longer available".to_string()));
        mock.on("fare-rule", Reply::Ok(json!({"response": {"rules": "text"}})));

        let result = confirm(&mock, "t1", "OB7").await;
        assert!(matches!(result, Err(Error::Supplier { status: 500, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn both_calls_are_issued_together() {
        let mock = MockAggregator::new();
        mock.on_delayed(
            "fare-quote",
            Reply::Ok(quote_body()),
            Duration::from_millis(200),
        );
        mock.on_delayed(
            "fare-rule",
            Reply::Ok(json!({"response": {"rules": "r"}})),
            Duration::from_millis(200),
        );

        let started = tokio::time::Instant::now();
        let confirmed = confirm(&mock, "t1", "OB7").await.unwrap();
        // Sequential calls would need 400ms of virtual time.
        assert_eq!(started.elapsed(), Duration::from_millis(200));
        assert!(confirmed.warning.is_none());
    }

    #[tokio::test]
    async fn refetch_rules_retries_only_the_rules_call() {
        let mock = MockAggregator::new();
        mock.on("fare-rule", Reply::Ok(json!({"response": {"fare_rules": "retry text"}})));

        let text = refetch_rules(&mock, "t1", "OB7").await.unwrap();
        assert_eq!(text, "retry text");
        assert_eq!(mock.calls("fare-rule"), 1);
        assert_eq!(mock.calls("fare-quote"), 0);
    }

    #[tokio::test]
    async fn lcc_flag_and_missing_pax_fares_are_tolerated() {
        let mock = MockAggregator::new();
        mock.on(
            "fare-quote",
            Reply::Ok(json!({
                "response": {
                    "result": {
                        "fare": {"published_fare": "3200", "currency": "INR"},
                        "is_lcc": true,
                        "segments": {"origin": "BOM", "destination": "GOI",
                                     "airline": {"airline_code": "6E", "flight_number": "5301"}}
                    }
                }
            })),
        );
        mock.on("fare-rule", Reply::Ok(json!({"response": {}})));

        let confirmed = confirm(&mock, "t2", "3").await.unwrap();
        assert_eq!(confirmed.confirmation.supplier_family, SupplierFamily::Lcc);
        assert!(confirmed.confirmation.pax_fares.is_empty());
        assert_eq!(confirmed.confirmation.fare.published_fare, 3200.0);
        // Bare-object segments still count as one leg
        assert_eq!(confirmed.confirmation.segments.len(), 1);
    }
}
