// Booking Coordinator: validates locally, submits once, and extracts the
// reservation identifiers. Ticketing is deliberately a separate step so a
// created-but-unticketed reservation is an observable state.

use crate::client::AggregatorApi;
use crate::error::Error;
use crate::extract::opt_str;
use crate::models::{Address, ContactInfo, Passenger, Reservation, SupplierFamily};
use crate::supplier::{self, BookWire};

/// Create a reservation for one confirmed offer. Fails fast with
/// `Error::Validation` (zero network calls) when address line 1 or the
/// passenger list is missing.
pub async fn book<A: AggregatorApi + ?Sized>(
    client: &A,
    trace_id: &str,
    offer_id: &str,
    supplier_family: SupplierFamily,
    contact: &ContactInfo,
    address: &Address,
    passengers: &[Passenger],
) -> Result<Reservation, Error> {
    if address.line1.trim().is_empty() {
        return Err(Error::validation("address line 1 is required"));
    }
    if passengers.is_empty() {
        return Err(Error::validation("at least one passenger is required"));
    }

    let request = BookWire {
        trace_id: trace_id.to_string(),
        result_index: offer_id.to_string(),
        contact: contact.clone(),
        address: address.clone(),
        passengers: passengers.to_vec(),
    };

    let body = client.book(&request).await?;

    // The reservation payload arrives wrapped at either of two depths.
    let payload = supplier::envelope(&body);
    let booking_id = opt_str(&payload["booking_id"])
        .ok_or_else(|| Error::supplier(200, "booking response carried no booking id"))?;
    let record_locator = opt_str(&payload["record_locator"]);

    tracing::info!(
        trace_id,
        offer_id,
        booking_id = %booking_id,
        pnr = record_locator.as_deref().unwrap_or("-"),
        "reservation created"
    );

    Ok(Reservation {
        booking_id,
        record_locator,
        supplier_family,
        trace_id: trace_id.to_string(),
        offer_id: offer_id.to_string(),
    })
}
