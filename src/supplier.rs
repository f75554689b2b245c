// Wire-format types for the upstream aggregator. Requests are fully typed;
// responses stay `serde_json::Value` because offer payloads arrive in
// heterogeneous shapes and are resolved through the extract/normalize path.

use crate::extract::{opt_str, unwrap_payload};
use crate::models::{Address, AncillaryItem, ContactInfo, Passenger};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct SearchWire {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub cabin_class: u32,
    pub adult_count: u32,
    pub child_count: u32,
    pub infant_count: u32,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FareQuoteWire {
    pub trace_id: String,
    pub result_index: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FareRuleWire {
    pub trace_id: String,
    pub result_index: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookWire {
    pub trace_id: String,
    pub result_index: String,
    pub contact: ContactInfo,
    pub address: Address,
    pub passengers: Vec<Passenger>,
}

/// GDS ticketing rides on the reservation created by `book`.
#[derive(Debug, Clone, Serialize)]
pub struct GdsTicketWire {
    pub booking_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_locator: Option<String>,
    pub trace_id: String,
}

/// LCC ticketing carries the full passenger/fare/ancillary picture instead
/// of a reservation identifier.
#[derive(Debug, Clone, Serialize)]
pub struct LccTicketWire {
    pub trace_id: String,
    pub result_index: String,
    pub agent_reference: String,
    pub passengers: Vec<LccTicketPassenger>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LccTicketPassenger {
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub pax_type: u32,
    pub date_of_birth: String,
    pub gender: String,
    pub email: String,
    pub phone: String,
    pub address_line1: String,
    pub city: String,
    pub country_code: String,
    pub base_fare: f64,
    pub tax: f64,
    pub baggage: Vec<AncillaryItem>,
    pub meal_dynamic: Vec<AncillaryItem>,
    pub seat_dynamic: Vec<AncillaryItem>,
}

/// The two structurally different ticket-issuance request shapes. Serialized
/// untagged: the supplier distinguishes them by their fields.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TicketRequest {
    Gds(GdsTicketWire),
    Lcc(LccTicketWire),
}

impl TicketRequest {
    pub fn family(&self) -> crate::models::SupplierFamily {
        match self {
            TicketRequest::Gds(_) => crate::models::SupplierFamily::Gds,
            TicketRequest::Lcc(_) => crate::models::SupplierFamily::Lcc,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingDetailsWire {
    pub booking_id: String,
}

/// Unwrap the aggregator's standard `{"response": ...}` envelope; some
/// endpoints wrap twice.
pub fn envelope(body: &Value) -> &Value {
    unwrap_payload(body, &["response", "response"])
}

/// Correlation token of a search response, wherever the envelope put it.
pub fn trace_id(body: &Value) -> Option<String> {
    opt_str(&envelope(body)["trace_id"]).or_else(|| opt_str(&body["trace_id"]))
}

/// Probe for an explicit structured failure. Returns the supplier's message
/// when the body flags one, `None` for a success envelope.
pub fn failure_message(body: &Value) -> Option<String> {
    let error = &envelope(body)["error"];
    let code = error["code"].as_i64().unwrap_or(0);
    let message = opt_str(&error["message"]);
    if code != 0 {
        return Some(message.unwrap_or_else(|| format!("supplier error code {}", code)));
    }
    // Some endpoints send a message with no code on failure.
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trace_id_found_at_either_depth() {
        let enveloped = json!({"response": {"trace_id": "t-1"}});
        let bare = json!({"trace_id": "t-2"});
        assert_eq!(trace_id(&enveloped).unwrap(), "t-1");
        assert_eq!(trace_id(&bare).unwrap(), "t-2");
        assert!(trace_id(&json!({})).is_none());
    }

    #[test]
    fn failure_probe_reads_structured_error() {
        let failed = json!({"response": {"error": {"code": 5, "message": "fare expired"}}});
        assert_eq!(failure_message(&failed).unwrap(), "fare expired");

        let code_only = json!({"response": {"error": {"code": 9}}});
        assert_eq!(failure_message(&code_only).unwrap(), "supplier error code 9");

        let ok = json!({"response": {"error": {"code": 0, "message": ""}}});
        assert!(failure_message(&ok).is_none());
    }

    #[test]
    fn gds_wire_omits_absent_record_locator() {
        let wire = GdsTicketWire {
            booking_id: "B1".to_string(),
            record_locator: None,
            trace_id: "t".to_string(),
        };
        let body = serde_json::to_value(&wire).unwrap();
        assert!(body.get("record_locator").is_none());
    }
}
