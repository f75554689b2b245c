// Pipeline facade: wires the orchestrator, confirmation fetcher, booking
// coordinator, ticket issuer and recovery cache into the one flow the UI
// drives. Holds the only mutable state in the crate; locks are never held
// across an await.

use crate::cancel::{CancelToken, RequestSequence};
use crate::client::AggregatorApi;
use crate::confirm::{self, ConfirmedFare};
use crate::error::Error;
use crate::models::{
    Address, ContactInfo, FlightOffer, Passenger, Reservation, SearchBatch, SupplierFamily,
    TicketResult,
};
use crate::recovery::RecoveryCache;
use crate::search::{self, SearchCriteria};
use crate::supplier::BookingDetailsWire;
use crate::ticket::{TicketState, TicketingContext, TicketingFlow};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

#[derive(Default)]
struct FlowState {
    trace_id: Option<String>,
    batch: Option<SearchBatch>,
    selected: Option<FlightOffer>,
    confirmed: Option<ConfirmedFare>,
    reservation: Option<Reservation>,
}

pub struct BookingFlow<A: AggregatorApi> {
    client: Arc<A>,
    recovery: RecoveryCache,
    confirm_sequence: RequestSequence,
    ticketing: Mutex<Arc<TicketingFlow>>,
    state: Mutex<FlowState>,
}

impl<A: AggregatorApi> BookingFlow<A> {
    pub fn new(client: Arc<A>, recovery: RecoveryCache) -> Self {
        Self {
            client,
            recovery,
            confirm_sequence: RequestSequence::new(),
            ticketing: Mutex::new(Arc::new(TicketingFlow::new())),
            state: Mutex::new(FlowState::default()),
        }
    }

    /// Run one search. Replaces the current batch and discards all state
    /// derived from the previous one.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<SearchBatch, Error> {
        let batch = search::search(self.client.as_ref(), criteria).await?;
        let mut state = self.state.lock();
        state.trace_id = Some(batch.trace_id.clone());
        state.batch = Some(batch.clone());
        state.selected = None;
        state.confirmed = None;
        state.reservation = None;
        *self.ticketing.lock() = Arc::new(TicketingFlow::new());
        Ok(batch)
    }

    pub fn batch(&self) -> Option<SearchBatch> {
        self.state.lock().batch.clone()
    }

    pub fn confirmation(&self) -> Option<ConfirmedFare> {
        self.state.lock().confirmed.clone()
    }

    pub fn reservation(&self) -> Option<Reservation> {
        self.state.lock().reservation.clone()
    }

    pub fn ticket_state(&self) -> TicketState {
        self.ticketing.lock().state()
    }

    /// Select one offer from the current batch and persist it to the
    /// recovery slots.
    pub fn select(&self, offer_id: &str) -> Result<(), Error> {
        let mut state = self.state.lock();
        let batch = state
            .batch
            .as_ref()
            .ok_or_else(|| Error::validation("no search batch to select from"))?;
        let offer = batch
            .offers
            .iter()
            .find(|o| o.offer_id == offer_id)
            .cloned()
            .ok_or_else(|| Error::validation(format!("offer {} not in batch", offer_id)))?;

        self.recovery.remember(&offer, &batch.trace_id);
        state.selected = Some(offer);
        Ok(())
    }

    /// Cold-start rehydration: when no in-memory batch exists, fall back to
    /// the recovery slots. The recalled offer is stale-but-usable input and
    /// must still be confirmed.
    pub fn restore(&self) -> Option<FlightOffer> {
        {
            let state = self.state.lock();
            if state.batch.is_some() || state.selected.is_some() {
                return state.selected.clone();
            }
        }
        let offer = self.recovery.recall_offer()?;
        let trace_id = self.recovery.recall_trace_id()?;
        tracing::info!(offer_id = %offer.offer_id, trace_id = %trace_id,
            "restored selection from recovery cache");

        let mut state = self.state.lock();
        state.selected = Some(offer.clone());
        state.trace_id = Some(trace_id);
        Some(offer)
    }

    /// Confirm the currently selected offer. Returns `Ok(None)` when the
    /// result was superseded by a newer confirmation request or the caller
    /// cancelled — a stale fare is discarded, never displayed.
    pub async fn confirm_selected(
        &self,
        token: &CancelToken,
    ) -> Result<Option<ConfirmedFare>, Error> {
        let (trace_id, offer_id) = {
            let state = self.state.lock();
            let trace_id = state
                .trace_id
                .clone()
                .ok_or_else(|| Error::validation("no trace id; run a search or restore first"))?;
            let offer_id = state
                .selected
                .as_ref()
                .map(|o| o.offer_id.clone())
                .ok_or_else(|| Error::validation("no offer selected"))?;
            (trace_id, offer_id)
        };

        let ticket = self.confirm_sequence.begin();
        let confirmed = confirm::confirm(self.client.as_ref(), &trace_id, &offer_id).await?;

        if token.is_cancelled() || !self.confirm_sequence.is_current(ticket) {
            tracing::debug!(offer_id = %offer_id, "discarding superseded confirmation");
            return Ok(None);
        }

        self.state.lock().confirmed = Some(confirmed.clone());
        Ok(Some(confirmed))
    }

    /// User-triggered retry of the fare-rules call after a `RulesWarning`.
    pub async fn refetch_rules(&self) -> Result<String, Error> {
        let (trace_id, offer_id) = {
            let state = self.state.lock();
            match &state.confirmed {
                Some(c) => (
                    c.confirmation.trace_id.clone(),
                    c.confirmation.offer_id.clone(),
                ),
                None => return Err(Error::validation("nothing confirmed yet")),
            }
        };

        let rules = confirm::refetch_rules(self.client.as_ref(), &trace_id, &offer_id).await?;
        let mut state = self.state.lock();
        if let Some(confirmed) = state.confirmed.as_mut() {
            confirmed.confirmation.fare_rules = rules.clone();
            confirmed.warning = None;
        }
        Ok(rules)
    }

    /// Create the reservation for the confirmed fare. Ticketing stays a
    /// separate, explicitly triggered step.
    pub async fn book(
        &self,
        contact: &ContactInfo,
        address: &Address,
        passengers: &[Passenger],
    ) -> Result<Reservation, Error> {
        let (trace_id, offer_id, family) = {
            let state = self.state.lock();
            match &state.confirmed {
                Some(c) => (
                    c.confirmation.trace_id.clone(),
                    c.confirmation.offer_id.clone(),
                    c.confirmation.supplier_family,
                ),
                None => return Err(Error::validation("confirm the fare before booking")),
            }
        };

        let reservation = crate::book::book(
            self.client.as_ref(),
            &trace_id,
            &offer_id,
            family,
            contact,
            address,
            passengers,
        )
        .await?;

        self.state.lock().reservation = Some(reservation.clone());
        *self.ticketing.lock() = Arc::new(TicketingFlow::new());
        Ok(reservation)
    }

    /// Issue the ticket for the confirmed fare, optionally forcing the
    /// supplier-family path. Works without a reservation on the LCC path.
    pub async fn issue_ticket(
        &self,
        passengers: &[Passenger],
        forced: Option<SupplierFamily>,
    ) -> Result<TicketResult, Error> {
        let ctx = {
            let state = self.state.lock();
            let confirmed = state
                .confirmed
                .as_ref()
                .ok_or_else(|| Error::validation("confirm the fare before ticketing"))?;
            TicketingContext {
                trace_id: confirmed.confirmation.trace_id.clone(),
                reservation: state.reservation.clone(),
                confirmation: confirmed.confirmation.clone(),
                passengers: passengers.to_vec(),
            }
        };

        let ticketing = self.ticketing.lock().clone();
        ticketing.issue(self.client.as_ref(), &ctx, forced).await
    }

    /// Reservation/ticket status snapshot for confirmation display and
    /// diagnostics.
    pub async fn booking_details(&self) -> Result<Value, Error> {
        let booking_id = {
            let state = self.state.lock();
            match &state.reservation {
                Some(r) => r.booking_id.clone(),
                None => return Err(Error::validation("no reservation to look up")),
            }
        };
        self.client
            .as_ref()
            .booking_details(&BookingDetailsWire { booking_id })
            .await
    }
}
