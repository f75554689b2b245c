// farelink: supplier-integration core for a flight booking front end.
// Search -> confirm -> book -> ticket against one upstream aggregator that
// fronts both GDS and LCC supplier families.

pub mod book;
pub mod cancel;
pub mod client;
pub mod confirm;
pub mod error;
pub mod extract;
pub mod flow;
pub mod models;
pub mod normalize;
pub mod recovery;
pub mod search;
pub mod supplier;
pub mod ticket;

// Re-export key types for convenience
pub use cancel::{CancelToken, RequestSequence};
pub use client::{AggregatorApi, ClientConfig, EndpointTimeouts, HttpAggregatorClient};
pub use confirm::{confirm, refetch_rules, ConfirmedFare};
pub use error::{Error, RulesWarning};
pub use flow::BookingFlow;
pub use models::{
    CabinClass, FareBreakdown, FareConfirmation, FlightOffer, Passenger, PassengerType,
    Reservation, SearchBatch, SupplierFamily, TicketResult,
};
pub use normalize::normalize;
pub use recovery::{InMemoryRecoveryStore, RecoveryCache, RecoveryStore};
pub use search::{filter_offers, search, sort_offers, OfferFilter, SearchCriteria, SortKey, StopBucket};
pub use ticket::{issue_ticket, TicketRequestBuilder, TicketState, TicketingContext, TicketingFlow};
