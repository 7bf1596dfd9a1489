// Result fetcher
// Async access to airports, flights, hotels and car rentals. Every search resolves
// to a list: failures of the live source are logged and replaced by built-in data.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::AppConfig;
use crate::mock_data;
use crate::model::{Airport, CarRental, FlightItinerary, Hotel};
use crate::search_params::{CarQuery, FlightSearchParams, HotelQuery};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected status {status} from {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Client error: {0}")]
    Client(String),
}

// Per-vertical delay applied by the mock fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedLatency {
    pub airports_ms: u64,
    pub flights_ms: u64,
    pub hotels_ms: u64,
    pub cars_ms: u64,
}

impl Default for SimulatedLatency {
    fn default() -> Self {
        Self {
            airports_ms: 500,
            flights_ms: 2000,
            hotels_ms: 1500,
            cars_ms: 1200,
        }
    }
}

impl SimulatedLatency {
    pub fn none() -> Self {
        Self {
            airports_ms: 0,
            flights_ms: 0,
            hotels_ms: 0,
            cars_ms: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct FetchStats {
    pub requests_sent: AtomicUsize,
    pub requests_succeeded: AtomicUsize,
    pub fallbacks_served: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStatsReport {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub fallbacks_served: usize,
}

impl FetchStats {
    pub fn report(&self) -> FetchStatsReport {
        FetchStatsReport {
            requests_sent: self.requests_sent.load(Ordering::SeqCst),
            requests_succeeded: self.requests_succeeded.load(Ordering::SeqCst),
            fallbacks_served: self.fallbacks_served.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
pub trait ResultFetcher: Send + Sync + 'static {
    // Airport suggestions for a free-text query
    async fn search_airports(&self, query: &str) -> Vec<Airport>;

    async fn search_flights(&self, params: &FlightSearchParams) -> Vec<FlightItinerary>;

    async fn search_hotels(&self, query: &HotelQuery) -> Vec<Hotel>;

    async fn search_cars(&self, query: &CarQuery) -> Vec<CarRental>;

    // Get fetcher statistics
    fn stats(&self) -> FetchStatsReport;
}

fn airports_matching(query: &str, include_suggestion_title: bool) -> Vec<Airport> {
    let needle = query.trim().to_lowercase();
    mock_data::airports()
        .into_iter()
        .filter(|airport| {
            airport.presentation.title.to_lowercase().contains(&needle)
                || (include_suggestion_title
                    && airport
                        .presentation
                        .suggestion_title
                        .to_lowercase()
                        .contains(&needle))
        })
        .collect()
}

// Serves the built-in dataset after a simulated network delay
pub struct MockFetcher {
    latency: SimulatedLatency,
    stats: FetchStats,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new(SimulatedLatency::default())
    }
}

impl MockFetcher {
    pub fn new(latency: SimulatedLatency) -> Self {
        Self {
            latency,
            stats: FetchStats::default(),
        }
    }

    async fn simulate(&self, delay_ms: u64) {
        self.stats.requests_sent.fetch_add(1, Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        self.stats.requests_succeeded.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResultFetcher for MockFetcher {
    async fn search_airports(&self, query: &str) -> Vec<Airport> {
        self.simulate(self.latency.airports_ms).await;
        airports_matching(query, true)
    }

    async fn search_flights(&self, params: &FlightSearchParams) -> Vec<FlightItinerary> {
        self.simulate(self.latency.flights_ms).await;
        mock_data::flights()
            .into_iter()
            .filter(|itinerary| {
                itinerary.first_leg().map_or(false, |leg| {
                    leg.origin.sky_id == params.origin_sky_id
                        && leg.destination.sky_id == params.destination_sky_id
                })
            })
            .collect()
    }

    async fn search_hotels(&self, _query: &HotelQuery) -> Vec<Hotel> {
        self.simulate(self.latency.hotels_ms).await;
        mock_data::hotels()
    }

    async fn search_cars(&self, _query: &CarQuery) -> Vec<CarRental> {
        self.simulate(self.latency.cars_ms).await;
        mock_data::cars()
    }

    fn stats(&self) -> FetchStatsReport {
        self.stats.report()
    }
}

// Response envelopes of the upstream API. Missing or null lists decode as empty.
#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    data: Option<Vec<T>>,
}

#[derive(Debug, Default, Deserialize)]
struct FlightData {
    itineraries: Option<Vec<FlightItinerary>>,
}

#[derive(Debug, Deserialize)]
struct FlightEnvelope {
    data: Option<FlightData>,
}

// HTTP client for the RapidAPI travel endpoints
pub struct LiveFetcher {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_host: String,
    timeout_ms: u64,
    stats: FetchStats,
}

impl LiveFetcher {
    pub fn new(config: &AppConfig) -> Result<Self, FetchError> {
        Self::with_base_url(
            config.base_url(),
            &config.api_key,
            &config.api_host,
            config.request_timeout_ms,
        )
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: &str,
        api_host: &str,
        timeout_ms: u64,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_host: api_host.to_string(),
            timeout_ms,
            stats: FetchStats::default(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, params = query.len(), "Sending request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout_ms)
        } else {
            FetchError::Network(err.to_string())
        }
    }

    // Count the outcome and swap a failure for the fallback list
    fn resolve<T>(
        &self,
        endpoint: &str,
        result: Result<Vec<T>, FetchError>,
        fallback: impl FnOnce() -> Vec<T>,
    ) -> Vec<T> {
        match result {
            Ok(items) => {
                self.stats.requests_succeeded.fetch_add(1, Ordering::SeqCst);
                items
            }
            Err(err) => {
                error!(endpoint, error = %err, "Request failed, serving built-in results");
                self.stats.fallbacks_served.fetch_add(1, Ordering::SeqCst);
                fallback()
            }
        }
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&'static str, String)],
    ) -> Result<Vec<T>, FetchError> {
        self.stats.requests_sent.fetch_add(1, Ordering::SeqCst);
        let envelope: ListEnvelope<T> = self.get(endpoint, query).await?;
        Ok(envelope.data.unwrap_or_default())
    }
}

#[async_trait]
impl ResultFetcher for LiveFetcher {
    async fn search_airports(&self, query: &str) -> Vec<Airport> {
        let endpoint = "/flights/searchAirport";
        let result = self
            .get_list(endpoint, &[("query", query.to_string())])
            .await;
        self.resolve(endpoint, result, || airports_matching(query, false))
    }

    async fn search_flights(&self, params: &FlightSearchParams) -> Vec<FlightItinerary> {
        let endpoint = "/flights/searchFlights";
        self.stats.requests_sent.fetch_add(1, Ordering::SeqCst);
        let result = self
            .get::<FlightEnvelope>(endpoint, &params.query_pairs())
            .await
            .map(|envelope| {
                envelope
                    .data
                    .unwrap_or_default()
                    .itineraries
                    .unwrap_or_default()
            });
        self.resolve(endpoint, result, mock_data::flights)
    }

    async fn search_hotels(&self, query: &HotelQuery) -> Vec<Hotel> {
        let endpoint = "/hotels/searchHotels";
        let result = self.get_list(endpoint, &query.query_pairs()).await;
        self.resolve(endpoint, result, mock_data::hotels)
    }

    async fn search_cars(&self, query: &CarQuery) -> Vec<CarRental> {
        let endpoint = "/cars/searchCars";
        let result = self.get_list(endpoint, &query.query_pairs()).await;
        self.resolve(endpoint, result, mock_data::cars)
    }

    fn stats(&self) -> FetchStatsReport {
        self.stats.report()
    }
}
