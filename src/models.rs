// Canonical domain types shared across the pipeline modules

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rendered when a supplier timestamp cannot be parsed.
pub const UNKNOWN_TIME: &str = "--:--";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    /// Decode the aggregator's numeric cabin code. Unknown codes (including
    /// the absent-field zero) fall back to economy.
    pub fn from_code(code: u32) -> Self {
        match code {
            3 => CabinClass::PremiumEconomy,
            4 => CabinClass::Business,
            6 => CabinClass::First,
            _ => CabinClass::Economy,
        }
    }

    pub fn to_code(self) -> u32 {
        match self {
            CabinClass::Economy => 2,
            CabinClass::PremiumEconomy => 3,
            CabinClass::Business => 4,
            CabinClass::First => 6,
        }
    }
}

/// Which family of suppliers an offer is fulfilled by. Captured once at fare
/// confirmation and reused verbatim at ticketing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplierFamily {
    Gds,
    Lcc,
}

impl std::fmt::Display for SupplierFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupplierFamily::Gds => write!(f, "GDS"),
            SupplierFamily::Lcc => write!(f, "LCC"),
        }
    }
}

/// One normalized airline offer. `offer_id` is only meaningful within the
/// search batch (trace id) it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    pub offer_id: String,
    pub origin: String,
    pub destination: String,
    /// Wall-clock display strings; `--:--` when the supplier timestamp was
    /// unparsable.
    pub depart_time: String,
    pub arrive_time: String,
    /// Parsed counterparts kept for ordering. `None` when unparsable.
    pub depart_at: Option<NaiveDateTime>,
    pub arrive_at: Option<NaiveDateTime>,
    pub duration_minutes: u32,
    pub stop_count: u32,
    pub airline_code: String,
    pub airline_name: String,
    pub flight_number: String,
    pub cabin: CabinClass,
    pub published_fare: f64,
    pub currency: String,
}

/// The immutable result of one search call. Filtering and sorting operate on
/// derived views and never touch the offer list itself.
#[derive(Debug, Clone)]
pub struct SearchBatch {
    pub trace_id: String,
    pub offers: Vec<FlightOffer>,
    pub created_at: DateTime<Utc>,
}

impl SearchBatch {
    pub fn new(trace_id: String, offers: Vec<FlightOffer>) -> Self {
        Self {
            trace_id,
            offers,
            created_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn cheapest(&self) -> Option<&FlightOffer> {
        self.offers
            .iter()
            .min_by(|a, b| a.published_fare.total_cmp(&b.published_fare))
    }
}

/// Aggregate fare breakdown as returned by the fare-quote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub base_fare: f64,
    pub tax: f64,
    pub other_charges: f64,
    pub discount: f64,
    /// The supplier's own published total.
    pub published_fare: f64,
    pub currency: String,
}

impl FareBreakdown {
    /// The supplier's published total wins; the computed sum is only a
    /// fallback when the supplier sent none.
    pub fn total(&self) -> f64 {
        if self.published_fare > 0.0 {
            self.published_fare
        } else {
            self.base_fare + self.tax + self.other_charges - self.discount
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassengerType {
    Adult,
    Child,
    Infant,
}

/// Per-passenger-type fare split, used to price LCC ticket passengers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaxFare {
    pub pax_type: PassengerType,
    pub base_fare: f64,
    pub tax: f64,
}

/// One leg of the confirmed itinerary, retained for building LCC ancillary
/// placeholders at ticketing time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRef {
    pub airline_code: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
}

/// Binding fare confirmation for one offer within one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareConfirmation {
    pub trace_id: String,
    pub offer_id: String,
    pub fare: FareBreakdown,
    /// Absent when the supplier did not break the fare down by pax type.
    pub pax_fares: Vec<PaxFare>,
    pub refundable: bool,
    pub supplier_family: SupplierFamily,
    pub segments: Vec<SegmentRef>,
    /// Descriptive rule text; empty when the optional rules call failed.
    pub fare_rules: String,
}

impl FareConfirmation {
    /// Base/tax for one passenger type, falling back to the aggregate fare
    /// when no per-type breakdown exists.
    pub fn fare_for(&self, pax_type: PassengerType) -> (f64, f64) {
        self.pax_fares
            .iter()
            .find(|p| p.pax_type == pax_type)
            .map(|p| (p.base_fare, p.tax))
            .unwrap_or((self.fare.base_fare, self.fare.tax))
    }
}

/// Per-leg ancillary elections a passenger made (LCC only).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AncillarySelection {
    pub baggage: Vec<AncillaryItem>,
    pub meals: Vec<AncillaryItem>,
    pub seats: Vec<AncillaryItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncillaryItem {
    pub airline_code: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub code: String,
    pub description: String,
    pub price: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub postal_code: String,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub pax_type: PassengerType,
    pub date_of_birth: chrono::NaiveDate,
    pub gender: String,
    pub contact: ContactInfo,
    pub address: Address,
    pub passport_number: Option<String>,
    pub passport_expiry: Option<chrono::NaiveDate>,
    pub frequent_flyer_ref: Option<String>,
    /// Only meaningful for LCC ticketing; `None` means no elections made.
    pub ancillaries: Option<AncillarySelection>,
}

/// A created reservation. `booking_id` is required for the GDS ticketing
/// path and for booking-details refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub booking_id: String,
    pub record_locator: Option<String>,
    pub supplier_family: SupplierFamily,
    pub trace_id: String,
    pub offer_id: String,
}

/// Outcome of a ticket issuance attempt.
#[derive(Debug, Clone)]
pub struct TicketResult {
    pub success: bool,
    /// Which family path was actually used, for diagnostics. May differ from
    /// the confirmation's flag when the caller forced the other path.
    pub family_used: SupplierFamily,
    pub raw_response: serde_json::Value,
}

/// The single most-recently-selected offer, persisted so a downstream step
/// can survive a cold start. Overwritten on every selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryRecord {
    pub offer: FlightOffer,
    pub saved_at: DateTime<Utc>,
}
