// Search Orchestrator: one outbound search call per invocation, offers
// normalized into an immutable batch, with pure filter/sort views derived
// from it.

use crate::client::AggregatorApi;
use crate::error::Error;
use crate::extract::first_offer_array;
use crate::models::{CabinClass, FlightOffer, SearchBatch};
use crate::normalize::normalize;
use crate::supplier::{self, SearchWire};

#[derive(Debug, Clone)]
pub struct SearchCriteria {
    pub origin: String,
    pub destination: String,
    pub departure_date: chrono::NaiveDate,
    pub cabin: CabinClass,
    pub adult_count: u32,
    pub child_count: u32,
    pub infant_count: u32,
    /// Supplier sources to fan out to upstream; empty means "all".
    pub sources: Vec<String>,
}

impl SearchCriteria {
    fn to_wire(&self) -> SearchWire {
        SearchWire {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            departure_date: self.departure_date.format("%Y-%m-%d").to_string(),
            cabin_class: self.cabin.to_code(),
            adult_count: self.adult_count,
            child_count: self.child_count,
            infant_count: self.infant_count,
            sources: self.sources.clone(),
        }
    }
}

/// Issue exactly one search request and normalize whatever comes back.
/// Callers keep "no batch yet" (no call succeeded) and "empty batch" (zero
/// results) as distinct states via their own `Option<SearchBatch>`.
pub async fn search<A: AggregatorApi + ?Sized>(
    client: &A,
    criteria: &SearchCriteria,
) -> Result<SearchBatch, Error> {
    let body = client.search(&criteria.to_wire()).await?;

    let trace_id = supplier::trace_id(&body)
        .ok_or_else(|| Error::supplier(200, "search response carried no trace id"))?;

    let envelope = supplier::envelope(&body);
    let offers: Vec<FlightOffer> = match first_offer_array(&envelope["results"]) {
        Some(raws) => raws
            .iter()
            .enumerate()
            .map(|(index, raw)| normalize(raw, index))
            .collect(),
        None => Vec::new(),
    };

    tracing::info!(
        trace_id = %trace_id,
        offers = offers.len(),
        origin = %criteria.origin,
        destination = %criteria.destination,
        "search complete"
    );
    Ok(SearchBatch::new(trace_id, offers))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBucket {
    #[default]
    Any,
    NonStop,
    OneStop,
    TwoPlus,
}

impl StopBucket {
    fn matches(self, stop_count: u32) -> bool {
        match self {
            StopBucket::Any => true,
            StopBucket::NonStop => stop_count == 0,
            StopBucket::OneStop => stop_count == 1,
            StopBucket::TwoPlus => stop_count >= 2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    pub stops: StopBucket,
    /// Airline-code membership; `None` admits every carrier.
    pub airlines: Option<Vec<String>>,
    /// Inclusive price bounds.
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Price,
    Duration,
    Departure,
}

/// Pure filter view over a batch. Recomputable from (batch, filter) at any
/// time; the batch itself is never touched.
pub fn filter_offers<'a>(batch: &'a SearchBatch, filter: &OfferFilter) -> Vec<&'a FlightOffer> {
    batch
        .offers
        .iter()
        .filter(|offer| {
            if !filter.stops.matches(offer.stop_count) {
                return false;
            }
            if !filter
                .airlines
                .as_ref()
                .map_or(true, |codes| codes.contains(&offer.airline_code))
            {
                return false;
            }
            if !filter.min_price.map_or(true, |min| offer.published_fare >= min) {
                return false;
            }
            if !filter.max_price.map_or(true, |max| offer.published_fare <= max) {
                return false;
            }
            true
        })
        .collect()
}

/// Sort a filtered view ascending by the given key. Offers with unparsable
/// departure times sort last under `SortKey::Departure`.
pub fn sort_offers<'a>(mut offers: Vec<&'a FlightOffer>, key: SortKey) -> Vec<&'a FlightOffer> {
    match key {
        SortKey::Price => {
            offers.sort_by(|a, b| a.published_fare.total_cmp(&b.published_fare));
        }
        SortKey::Duration => {
            offers.sort_by_key(|offer| offer.duration_minutes);
        }
        SortKey::Departure => {
            offers.sort_by_key(|offer| (offer.depart_at.is_none(), offer.depart_at));
        }
    }
    offers
}
