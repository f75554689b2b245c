// Aggregator API client: one trait seam for the six upstream operations,
// a reqwest implementation with independent per-endpoint timeout budgets,
// and a scriptable mock for tests.

use crate::error::Error;
use crate::supplier::{
    failure_message, BookWire, BookingDetailsWire, FareQuoteWire, FareRuleWire, SearchWire,
    TicketRequest,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Independent timeout budgets per endpoint. Fare confirmation and ticketing
/// legitimately need longer budgets than search; the rules budget is kept
/// strictly below the quote budget so a degraded rules call can never hold a
/// finished quote past its own window.
#[derive(Debug, Clone)]
pub struct EndpointTimeouts {
    pub search: Duration,
    pub fare_quote: Duration,
    pub fare_rule: Duration,
    pub book: Duration,
    pub ticket: Duration,
    pub booking_details: Duration,
}

impl Default for EndpointTimeouts {
    fn default() -> Self {
        Self {
            search: Duration::from_secs(15),
            fare_quote: Duration::from_secs(30),
            fare_rule: Duration::from_secs(5),
            book: Duration::from_secs(45),
            ticket: Duration::from_secs(60),
            booking_details: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeouts: EndpointTimeouts,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeouts: EndpointTimeouts::default(),
        }
    }
}

/// The upstream aggregator contract. `book` and `ticket` are NOT idempotent
/// and must only be resubmitted on explicit user action; nothing in this
/// crate retries them automatically.
#[async_trait]
pub trait AggregatorApi: Send + Sync {
    async fn search(&self, request: &SearchWire) -> Result<Value, Error>;
    async fn fare_quote(&self, request: &FareQuoteWire) -> Result<Value, Error>;
    async fn fare_rule(&self, request: &FareRuleWire) -> Result<Value, Error>;
    async fn book(&self, request: &BookWire) -> Result<Value, Error>;
    async fn ticket(&self, request: &TicketRequest) -> Result<Value, Error>;
    async fn booking_details(&self, request: &BookingDetailsWire) -> Result<Value, Error>;
}

pub struct HttpAggregatorClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpAggregatorClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        budget: Duration,
    ) -> Result<Value, Error> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        let started = Instant::now();
        tracing::debug!(endpoint = path, "aggregator call");

        let exchange = async {
            let response = self
                .http
                .post(&url)
                .header("x-api-key", &self.config.api_key)
                .json(body)
                .send()
                .await?;
            let status = response.status();
            // A failure body may not be JSON at all; treat that as null and
            // let the status mapping speak.
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = match tokio::time::timeout(budget, exchange).await {
            Err(_) => {
                tracing::error!(endpoint = path, budget_ms = budget.as_millis() as u64, "timed out");
                return Err(Error::transport(
                    format!("{} timed out", path),
                    budget.as_millis() as u64,
                ));
            }
            Ok(Err(e)) => {
                return Err(Error::transport(
                    e.to_string(),
                    started.elapsed().as_millis() as u64,
                ))
            }
            Ok(Ok(pair)) => pair,
        };

        if !status.is_success() {
            let message = failure_message(&body)
                .unwrap_or_else(|| format!("{} returned HTTP {}", path, status.as_u16()));
            return Err(Error::supplier(status.as_u16(), message));
        }
        if let Some(message) = failure_message(&body) {
            return Err(Error::supplier(status.as_u16(), message));
        }
        Ok(body)
    }
}

#[async_trait]
impl AggregatorApi for HttpAggregatorClient {
    async fn search(&self, request: &SearchWire) -> Result<Value, Error> {
        self.post("search", request, self.config.timeouts.search).await
    }

    async fn fare_quote(&self, request: &FareQuoteWire) -> Result<Value, Error> {
        self.post("fare-quote", request, self.config.timeouts.fare_quote)
            .await
    }

    async fn fare_rule(&self, request: &FareRuleWire) -> Result<Value, Error> {
        self.post("fare-rule", request, self.config.timeouts.fare_rule)
            .await
    }

    async fn book(&self, request: &BookWire) -> Result<Value, Error> {
        self.post("book", request, self.config.timeouts.book).await
    }

    async fn ticket(&self, request: &TicketRequest) -> Result<Value, Error> {
        self.post("ticket", request, self.config.timeouts.ticket).await
    }

    async fn booking_details(&self, request: &BookingDetailsWire) -> Result<Value, Error> {
        self.post("booking-details", request, self.config.timeouts.booking_details)
            .await
    }
}


#[cfg(test)]
mod tests {
    use super::mock::{MockAggregator, Reply};
    use super::*;
    use serde_json::json;

    #[test]
    fn default_budgets_keep_rules_below_quote() {
        let timeouts = EndpointTimeouts::default();
        assert!(timeouts.fare_rule < timeouts.fare_quote);
        assert!(timeouts.ticket > timeouts.search);
    }

    #[tokio::test]
    async fn mock_replays_scripted_replies_in_order() {
        let mock = MockAggregator::new();
        mock.on("search", Reply::Ok(json!({"response": {"trace_id": "t1"}})));
        mock.on("search", Reply::Supplier(502, "upstream down".to_string()));

        let request = SearchWire {
            origin: "BOM".to_string(),
            destination: "DEL".to_string(),
            departure_date: "2025-11-20".to_string(),
            cabin_class: 2,
            adult_count: 1,
            child_count: 0,
            infant_count: 0,
            sources: vec![],
        };

        let first = mock.search(&request).await.unwrap();
        assert_eq!(first["response"]["trace_id"], "t1");

        let second = mock.search(&request).await;
        assert!(matches!(second, Err(Error::Supplier { status: 502, .. })));
        assert_eq!(mock.calls("search"), 2);
        assert_eq!(mock.calls("book"), 0);
    }
}
