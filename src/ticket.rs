// Ticket Issuer: two structurally different request shapes behind one
// builder seam, selected once by supplier family. The forced override simply
// selects the other implementation; nothing re-derives the family later.

use crate::client::AggregatorApi;
use crate::error::Error;
use crate::models::{
    AncillaryItem, FareConfirmation, Passenger, PassengerType, Reservation, SupplierFamily,
    TicketResult,
};
use crate::supplier::{
    BookingDetailsWire, GdsTicketWire, LccTicketPassenger, LccTicketWire, TicketRequest,
};
use parking_lot::Mutex;

/// Everything ticket issuance may need, bundled once. The GDS path reads the
/// reservation; the LCC path reads the confirmation and passenger list.
#[derive(Debug, Clone)]
pub struct TicketingContext {
    pub trace_id: String,
    pub reservation: Option<Reservation>,
    pub confirmation: FareConfirmation,
    pub passengers: Vec<Passenger>,
}

pub trait TicketRequestBuilder: Send + Sync {
    fn family(&self) -> SupplierFamily;
    fn build(&self, ctx: &TicketingContext) -> Result<TicketRequest, Error>;
}

pub struct GdsTicketBuilder;

impl TicketRequestBuilder for GdsTicketBuilder {
    fn family(&self) -> SupplierFamily {
        SupplierFamily::Gds
    }

    fn build(&self, ctx: &TicketingContext) -> Result<TicketRequest, Error> {
        let reservation = ctx
            .reservation
            .as_ref()
            .filter(|r| !r.booking_id.trim().is_empty())
            .ok_or_else(|| Error::validation("GDS ticketing requires a booking id"))?;

        Ok(TicketRequest::Gds(GdsTicketWire {
            booking_id: reservation.booking_id.clone(),
            record_locator: reservation.record_locator.clone(),
            trace_id: ctx.trace_id.clone(),
        }))
    }
}

pub struct LccTicketBuilder;

fn pax_type_code(pax_type: PassengerType) -> u32 {
    match pax_type {
        PassengerType::Adult => 1,
        PassengerType::Child => 2,
        PassengerType::Infant => 3,
    }
}

/// One zero-value placeholder per confirmation leg, carrying that leg's
/// flight identity so the supplier can attach it to the right segment.
fn leg_placeholders(
    confirmation: &FareConfirmation,
    code: &str,
    description: &str,
) -> Vec<AncillaryItem> {
    confirmation
        .segments
        .iter()
        .map(|leg| AncillaryItem {
            airline_code: leg.airline_code.clone(),
            flight_number: leg.flight_number.clone(),
            origin: leg.origin.clone(),
            destination: leg.destination.clone(),
            code: code.to_string(),
            description: description.to_string(),
            price: 0.0,
            currency: confirmation.fare.currency.clone(),
        })
        .collect()
}

impl TicketRequestBuilder for LccTicketBuilder {
    fn family(&self) -> SupplierFamily {
        SupplierFamily::Lcc
    }

    fn build(&self, ctx: &TicketingContext) -> Result<TicketRequest, Error> {
        if ctx.passengers.is_empty() {
            return Err(Error::validation("LCC ticketing requires the passenger list"));
        }

        let passengers = ctx
            .passengers
            .iter()
            .map(|passenger| {
                let (base_fare, tax) = ctx.confirmation.fare_for(passenger.pax_type);
                let elected = passenger.ancillaries.as_ref();

                let baggage = match elected.filter(|a| !a.baggage.is_empty()) {
                    Some(a) => a.baggage.clone(),
                    None => leg_placeholders(&ctx.confirmation, "NoBaggage", "No Baggage"),
                };
                let meal_dynamic = match elected.filter(|a| !a.meals.is_empty()) {
                    Some(a) => a.meals.clone(),
                    None => leg_placeholders(&ctx.confirmation, "NoMeal", "No Meal"),
                };
                let seat_dynamic = match elected.filter(|a| !a.seats.is_empty()) {
                    Some(a) => a.seats.clone(),
                    None => leg_placeholders(&ctx.confirmation, "NoSeat", "No Seat"),
                };

                LccTicketPassenger {
                    title: passenger.title.clone(),
                    first_name: passenger.first_name.clone(),
                    last_name: passenger.last_name.clone(),
                    pax_type: pax_type_code(passenger.pax_type),
                    date_of_birth: passenger.date_of_birth.format("%Y-%m-%d").to_string(),
                    gender: passenger.gender.clone(),
                    email: passenger.contact.email.clone(),
                    phone: passenger.contact.phone.clone(),
                    address_line1: passenger.address.line1.clone(),
                    city: passenger.address.city.clone(),
                    country_code: passenger.address.country_code.clone(),
                    base_fare,
                    tax,
                    baggage,
                    meal_dynamic,
                    seat_dynamic,
                }
            })
            .collect();

        Ok(TicketRequest::Lcc(LccTicketWire {
            trace_id: ctx.trace_id.clone(),
            result_index: ctx.confirmation.offer_id.clone(),
            agent_reference: format!("AGR-{:08X}", rand::random::<u32>()),
            passengers,
        }))
    }
}

fn builder_for(family: SupplierFamily) -> Box<dyn TicketRequestBuilder> {
    match family {
        SupplierFamily::Gds => Box::new(GdsTicketBuilder),
        SupplierFamily::Lcc => Box::new(LccTicketBuilder),
    }
}

/// Issue a ticket. `forced` overrides the family captured at confirmation
/// time — a manual escape hatch for wrong upstream metadata, never an
/// automatic fallback. On success a known booking id triggers a
/// booking-details refresh; refresh failure is logged, not fatal.
pub async fn issue_ticket<A: AggregatorApi + ?Sized>(
    client: &A,
    ctx: &TicketingContext,
    forced: Option<SupplierFamily>,
) -> Result<TicketResult, Error> {
    let family = forced.unwrap_or(ctx.confirmation.supplier_family);
    let builder = builder_for(family);
    let request = builder.build(ctx)?;

    let raw_response = client.ticket(&request).await.map_err(|e| match e {
        Error::Validation(_) => e,
        other => Error::Ticketing {
            family,
            message: other.to_string(),
        },
    })?;

    tracing::info!(trace_id = %ctx.trace_id, family = %family, "ticket issued");

    if let Some(reservation) = ctx
        .reservation
        .as_ref()
        .filter(|r| !r.booking_id.is_empty())
    {
        let refresh = client
            .booking_details(&BookingDetailsWire {
                booking_id: reservation.booking_id.clone(),
            })
            .await;
        if let Err(e) = refresh {
            tracing::warn!(booking_id = %reservation.booking_id, error = %e,
                "booking details refresh failed after ticketing");
        }
    }

    Ok(TicketResult {
        success: true,
        family_used: family,
        raw_response,
    })
}

/// Ticketing lifecycle for one reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketState {
    Booked,
    TicketPending,
    Ticketed,
    TicketFailed,
}

/// State machine wrapper around `issue_ticket`. There is no automatic
/// transition out of `TicketFailed`; a caller must re-invoke, optionally
/// forcing the alternate family. Once `Ticketed`, further attempts are
/// rejected locally so an accidental double-click cannot re-submit the
/// non-idempotent ticket call.
pub struct TicketingFlow {
    state: Mutex<TicketState>,
}

impl Default for TicketingFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketingFlow {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TicketState::Booked),
        }
    }

    pub fn state(&self) -> TicketState {
        *self.state.lock()
    }

    pub async fn issue<A: AggregatorApi + ?Sized>(
        &self,
        client: &A,
        ctx: &TicketingContext,
        forced: Option<SupplierFamily>,
    ) -> Result<TicketResult, Error> {
        {
            let mut state = self.state.lock();
            if *state == TicketState::Ticketed {
                return Err(Error::validation("ticket already issued"));
            }
            *state = TicketState::TicketPending;
        }

        match issue_ticket(client, ctx, forced).await {
            Ok(result) => {
                *self.state.lock() = TicketState::Ticketed;
                Ok(result)
            }
            Err(e) => {
                *self.state.lock() = TicketState::TicketFailed;
                Err(e)
            }
        }
    }
}
