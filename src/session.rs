// Search session
// Owns the state slices and coordinates fetches, preferences and change events.
// Slices are only touched under their own lock and never across an await.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::fetcher::{FetchStatsReport, ResultFetcher};
use crate::filter::{apply, parse_sort, FlightSortKey, Sort};
use crate::mock_data;
use crate::model::{Airport, CarRental, FlightItinerary, Hotel};
use crate::preferences::{NewRecentSearch, PreferenceStore, RecentSearch, Theme};
use crate::search_params::{FlightParamsPatch, SearchError, TripType, DATE_FORMAT};
use crate::store::{
    CarAction, CarState, FlightAction, FlightState, HotelAction, HotelState, RequestId, UiAction,
    UiState,
};
use crate::view::{flight_rows, paginate, visible_columns, Column, FlightRow, ViewMode};

const EVENT_CAPACITY: usize = 64;
const POPULAR_LEAD_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Flights,
    Hotels,
    Cars,
}

impl Vertical {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vertical::Flights => "flights",
            Vertical::Hotels => "hotels",
            Vertical::Cars => "cars",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    FlightsChanged,
    HotelsChanged,
    CarsChanged,
    UiChanged,
    Selected { vertical: Vertical, id: Option<String> },
    SearchCompleted { vertical: Vertical, count: usize },
    SearchFailed { vertical: Vertical, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    // The response was written to the slice
    Applied { count: usize },
    // The search ran out of time; the slice now carries the error
    Failed { message: String },
    // A newer request finished first, the response was dropped
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestOutcome {
    Applied { count: usize },
    Failed { message: String },
    Stale,
    // A newer query arrived during the quiet period
    Superseded,
    // Query too short to look up
    Skipped,
}

#[derive(Debug, Default)]
pub struct SessionStats {
    pub searches_dispatched: AtomicUsize,
    pub searches_applied: AtomicUsize,
    pub searches_rejected: AtomicUsize,
    pub searches_timed_out: AtomicUsize,
    pub stale_responses: AtomicUsize,
    pub suggestions_superseded: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStatsReport {
    pub searches_dispatched: usize,
    pub searches_applied: usize,
    pub searches_rejected: usize,
    pub searches_timed_out: usize,
    pub stale_responses: usize,
    pub suggestions_superseded: usize,
}

impl SessionStats {
    fn report(&self) -> SessionStatsReport {
        SessionStatsReport {
            searches_dispatched: self.searches_dispatched.load(Ordering::SeqCst),
            searches_applied: self.searches_applied.load(Ordering::SeqCst),
            searches_rejected: self.searches_rejected.load(Ordering::SeqCst),
            searches_timed_out: self.searches_timed_out.load(Ordering::SeqCst),
            stale_responses: self.stale_responses.load(Ordering::SeqCst),
            suggestions_superseded: self.suggestions_superseded.load(Ordering::SeqCst),
        }
    }
}

// One page of the flight result view, ready to render
#[derive(Debug, Clone, PartialEq)]
pub struct FlightPage {
    pub rows: Vec<FlightRow>,
    pub columns: Vec<Column>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub mode: ViewMode,
}

struct SessionInner {
    config: AppConfig,
    fetcher: Arc<dyn ResultFetcher>,
    preferences: PreferenceStore,
    flights: Mutex<FlightState>,
    hotels: Mutex<HotelState>,
    cars: Mutex<CarState>,
    ui: Mutex<UiState>,
    next_request: AtomicU64,
    airport_generation: AtomicU64,
    events: broadcast::Sender<StoreEvent>,
    stats: SessionStats,
}

#[derive(Clone)]
pub struct SearchSession {
    inner: Arc<SessionInner>,
}

// Replace the slice with its successor
fn transition<S: Default>(slot: &Mutex<S>, update: impl FnOnce(S) -> S) {
    let mut guard = slot.lock();
    let state = std::mem::take(&mut *guard);
    *guard = update(state);
}

impl SearchSession {
    pub fn new(config: AppConfig, fetcher: Arc<dyn ResultFetcher>, preferences: PreferenceStore) -> Self {
        let mut stored = preferences.load_preferences();
        if stored.page_size.is_none() {
            stored.page_size = Some(config.default_page_size);
        }
        let ui = UiState::from_preferences(stored.resolve());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(SessionInner {
                config,
                fetcher,
                preferences,
                flights: Mutex::new(FlightState::default()),
                hotels: Mutex::new(HotelState::default()),
                cars: Mutex::new(CarState::default()),
                ui: Mutex::new(ui),
                next_request: AtomicU64::new(1),
                airport_generation: AtomicU64::new(0),
                events,
                stats: SessionStats::default(),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn next_request_id(&self) -> RequestId {
        self.inner.next_request.fetch_add(1, Ordering::SeqCst)
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.inner.preferences
    }

    pub fn stats(&self) -> SessionStatsReport {
        self.inner.stats.report()
    }

    pub fn fetch_stats(&self) -> FetchStatsReport {
        self.inner.fetcher.stats()
    }

    // Snapshots
    pub fn flight_state(&self) -> FlightState {
        self.inner.flights.lock().clone()
    }

    pub fn hotel_state(&self) -> HotelState {
        self.inner.hotels.lock().clone()
    }

    pub fn car_state(&self) -> CarState {
        self.inner.cars.lock().clone()
    }

    pub fn ui_state(&self) -> UiState {
        self.inner.ui.lock().clone()
    }

    pub fn dispatch_flights(&self, action: FlightAction) {
        transition(&self.inner.flights, |state| state.apply(action));
        self.emit(StoreEvent::FlightsChanged);
    }

    pub fn dispatch_hotels(&self, action: HotelAction) {
        transition(&self.inner.hotels, |state| state.apply(action));
        self.emit(StoreEvent::HotelsChanged);
    }

    pub fn dispatch_cars(&self, action: CarAction) {
        transition(&self.inner.cars, |state| state.apply(action));
        self.emit(StoreEvent::CarsChanged);
    }

    // Apply a UI action and persist the preference it touched
    pub fn dispatch_ui(&self, action: UiAction) {
        let mut patch = None;
        transition(&self.inner.ui, |state| {
            let next = state.apply(action.clone());
            patch = next.persisted_patch(&action);
            next
        });

        if let Some(patch) = patch {
            self.inner.preferences.save_preferences(&patch);
        }
        self.emit(StoreEvent::UiChanged);
    }

    pub fn can_search_flights(&self) -> bool {
        let state = self.inner.flights.lock();
        state.params.is_complete() && !state.flight_status.loading
    }

    pub fn can_search_hotels(&self) -> bool {
        let state = self.inner.hotels.lock();
        state.params.is_complete() && !state.status.loading
    }

    pub fn can_search_cars(&self) -> bool {
        let state = self.inner.cars.lock();
        state.params.is_complete() && !state.status.loading
    }

    fn reject(&self, vertical: Vertical, err: SearchError) -> SearchError {
        self.inner.stats.searches_rejected.fetch_add(1, Ordering::SeqCst);
        debug!(vertical = vertical.as_str(), error = %err, "Search rejected");
        err
    }

    async fn fetch_with_timeout<T>(&self, fetch: impl Future<Output = Vec<T>>) -> Result<Vec<T>, String> {
        let timeout_ms = self.inner.config.search_timeout_ms;
        tokio::time::timeout(Duration::from_millis(timeout_ms), fetch)
            .await
            .map_err(|_| {
                self.inner.stats.searches_timed_out.fetch_add(1, Ordering::SeqCst);
                format!("Search timed out after {}ms", timeout_ms)
            })
    }

    // Count and announce the result of a finished request
    fn settle(&self, vertical: Vertical, request: RequestId, applied: bool, outcome: SearchOutcome) -> SearchOutcome {
        if !applied {
            self.inner.stats.stale_responses.fetch_add(1, Ordering::SeqCst);
            debug!(vertical = vertical.as_str(), request, "Dropped stale response");
            return SearchOutcome::Stale;
        }

        match &outcome {
            SearchOutcome::Applied { count } => {
                self.inner.stats.searches_applied.fetch_add(1, Ordering::SeqCst);
                info!(vertical = vertical.as_str(), request, count, "Search completed");
                self.emit(StoreEvent::SearchCompleted {
                    vertical,
                    count: *count,
                });
            }
            SearchOutcome::Failed { message } => {
                warn!(vertical = vertical.as_str(), request, %message, "Search failed");
                self.emit(StoreEvent::SearchFailed {
                    vertical,
                    message: message.clone(),
                });
            }
            SearchOutcome::Stale => {}
        }
        outcome
    }

    pub async fn search_flights(&self) -> Result<SearchOutcome, SearchError> {
        let (params, origin, destination) = {
            let state = self.inner.flights.lock();
            (state.params.clone(), state.origin.clone(), state.destination.clone())
        };
        params.validate().map_err(|e| self.reject(Vertical::Flights, e))?;

        let request = self.next_request_id();
        self.dispatch_flights(FlightAction::FlightsStarted { request });
        self.inner.stats.searches_dispatched.fetch_add(1, Ordering::SeqCst);
        info!(
            request,
            origin = %params.origin_sky_id,
            destination = %params.destination_sky_id,
            date = %params.date,
            "Searching flights"
        );

        let label = |airport: Option<Airport>, sky_id: &str| {
            airport
                .map(|a| {
                    if a.presentation.suggestion_title.is_empty() {
                        a.presentation.title
                    } else {
                        a.presentation.suggestion_title
                    }
                })
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| sky_id.to_string())
        };
        let recent = NewRecentSearch {
            origin: label(origin, &params.origin_sky_id),
            destination: label(destination, &params.destination_sky_id),
            origin_sky_id: params.origin_sky_id.clone(),
            destination_sky_id: params.destination_sky_id.clone(),
            origin_entity_id: params.origin_entity_id.clone(),
            destination_entity_id: params.destination_entity_id.clone(),
            date: params.date.clone(),
            return_date: params.effective_return_date().map(str::to_string),
            trip_type: params.trip_type,
        };
        // Storage writes are blocking file I/O
        let preferences = self.inner.preferences.clone();
        if let Err(err) = tokio::task::spawn_blocking(move || preferences.save_recent_search(recent)).await {
            warn!(request, error = %err, "Failed to record recent search");
        }

        let result = self
            .fetch_with_timeout(self.inner.fetcher.search_flights(&params))
            .await;

        let (applied, outcome) = match result {
            Ok(items) => {
                let count = items.len();
                let applied = self.complete_flights(request, FlightAction::FlightsFulfilled { request, items });
                (applied, SearchOutcome::Applied { count })
            }
            Err(message) => {
                let applied = self.complete_flights(
                    request,
                    FlightAction::FlightsFailed {
                        request,
                        message: message.clone(),
                    },
                );
                (applied, SearchOutcome::Failed { message })
            }
        };

        Ok(self.settle(Vertical::Flights, request, applied, outcome))
    }

    fn complete_flights(&self, request: RequestId, action: FlightAction) -> bool {
        let mut current = false;
        transition(&self.inner.flights, |state| {
            current = state.flight_status.latest_request == Some(request);
            state.apply(action)
        });
        if current {
            self.emit(StoreEvent::FlightsChanged);
        }
        current
    }

    fn complete_airports(&self, request: RequestId, action: FlightAction) -> bool {
        let mut current = false;
        transition(&self.inner.flights, |state| {
            current = state.airport_status.latest_request == Some(request);
            state.apply(action)
        });
        if current {
            self.emit(StoreEvent::FlightsChanged);
        }
        current
    }

    pub async fn search_hotels(&self) -> Result<SearchOutcome, SearchError> {
        let query = {
            let state = self.inner.hotels.lock();
            state.params.validate()
        }
        .map_err(|e| self.reject(Vertical::Hotels, e))?;

        let request = self.next_request_id();
        self.dispatch_hotels(HotelAction::SearchStarted { request });
        self.inner.stats.searches_dispatched.fetch_add(1, Ordering::SeqCst);
        info!(request, destination = %query.destination, "Searching hotels");

        let result = self
            .fetch_with_timeout(self.inner.fetcher.search_hotels(&query))
            .await;

        let (action, outcome) = match result {
            Ok(items) => {
                let count = items.len();
                (HotelAction::SearchFulfilled { request, items }, SearchOutcome::Applied { count })
            }
            Err(message) => (
                HotelAction::SearchFailed {
                    request,
                    message: message.clone(),
                },
                SearchOutcome::Failed { message },
            ),
        };

        let mut applied = false;
        transition(&self.inner.hotels, |state| {
            applied = state.status.latest_request == Some(request);
            state.apply(action)
        });
        if applied {
            self.emit(StoreEvent::HotelsChanged);
        }

        Ok(self.settle(Vertical::Hotels, request, applied, outcome))
    }

    pub async fn search_cars(&self) -> Result<SearchOutcome, SearchError> {
        let query = {
            let state = self.inner.cars.lock();
            state.params.validate()
        }
        .map_err(|e| self.reject(Vertical::Cars, e))?;

        let request = self.next_request_id();
        self.dispatch_cars(CarAction::SearchStarted { request });
        self.inner.stats.searches_dispatched.fetch_add(1, Ordering::SeqCst);
        info!(request, location = %query.location, "Searching cars");

        let result = self
            .fetch_with_timeout(self.inner.fetcher.search_cars(&query))
            .await;

        let (action, outcome) = match result {
            Ok(items) => {
                let count = items.len();
                (CarAction::SearchFulfilled { request, items }, SearchOutcome::Applied { count })
            }
            Err(message) => (
                CarAction::SearchFailed {
                    request,
                    message: message.clone(),
                },
                SearchOutcome::Failed { message },
            ),
        };

        let mut applied = false;
        transition(&self.inner.cars, |state| {
            applied = state.status.latest_request == Some(request);
            state.apply(action)
        });
        if applied {
            self.emit(StoreEvent::CarsChanged);
        }

        Ok(self.settle(Vertical::Cars, request, applied, outcome))
    }

    // Debounced airport lookup: waits for the quiet period and only the latest
    // call in a burst reaches the fetcher
    pub async fn suggest_airports(&self, query: &str) -> SuggestOutcome {
        let generation = self.inner.airport_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let query = query.trim();
        if query.chars().count() < self.inner.config.min_airport_query_len {
            self.dispatch_flights(FlightAction::ClearAirports);
            return SuggestOutcome::Skipped;
        }

        tokio::time::sleep(Duration::from_millis(self.inner.config.airport_debounce_ms)).await;
        if self.inner.airport_generation.load(Ordering::SeqCst) != generation {
            self.inner.stats.suggestions_superseded.fetch_add(1, Ordering::SeqCst);
            debug!(query, "Airport query superseded");
            return SuggestOutcome::Superseded;
        }

        let request = self.next_request_id();
        self.dispatch_flights(FlightAction::AirportsStarted { request });
        debug!(request, query, "Searching airports");

        match self
            .fetch_with_timeout(self.inner.fetcher.search_airports(query))
            .await
        {
            Ok(items) => {
                let count = items.len();
                if self.complete_airports(request, FlightAction::AirportsFulfilled { request, items }) {
                    SuggestOutcome::Applied { count }
                } else {
                    self.inner.stats.stale_responses.fetch_add(1, Ordering::SeqCst);
                    SuggestOutcome::Stale
                }
            }
            Err(message) => {
                let action = FlightAction::AirportsFailed {
                    request,
                    message: message.clone(),
                };
                if self.complete_airports(request, action) {
                    SuggestOutcome::Failed { message }
                } else {
                    self.inner.stats.stale_responses.fetch_add(1, Ordering::SeqCst);
                    SuggestOutcome::Stale
                }
            }
        }
    }

    // Exact sky id lookup for a typed airport code, without the debounce
    pub async fn resolve_airport(&self, code: &str) -> Option<Airport> {
        let code = code.trim();
        self.inner
            .fetcher
            .search_airports(code)
            .await
            .into_iter()
            .find(|airport| airport.sky_id.eq_ignore_ascii_case(code))
    }

    // Load a recent search into the flight form and run it again
    pub async fn rerun_recent(&self, search: &RecentSearch) -> Result<SearchOutcome, SearchError> {
        self.dispatch_flights(FlightAction::SelectOrigin(Some(Airport::from_ids(
            &search.origin_sky_id,
            &search.origin_entity_id,
            &search.origin,
        ))));
        self.dispatch_flights(FlightAction::SelectDestination(Some(Airport::from_ids(
            &search.destination_sky_id,
            &search.destination_entity_id,
            &search.destination,
        ))));
        self.dispatch_flights(FlightAction::SetSearchParams(FlightParamsPatch {
            date: Some(search.date.clone()),
            return_date: Some(search.return_date.clone()),
            trip_type: Some(search.trip_type),
            ..Default::default()
        }));
        self.search_flights().await
    }

    // One-way search from the default origin to a featured destination, a week after `today`
    pub async fn search_popular(&self, code: &str, today: NaiveDate) -> Result<SearchOutcome, SearchError> {
        let destination = mock_data::popular_destination(code).ok_or_else(|| {
            self.reject(
                Vertical::Flights,
                SearchError::UnknownDestination(code.trim().to_string()),
            )
        })?;
        let date = today + chrono::Duration::days(POPULAR_LEAD_DAYS);

        self.dispatch_flights(FlightAction::SelectOrigin(Some(mock_data::popular_origin())));
        self.dispatch_flights(FlightAction::SelectDestination(Some(Airport::from_ids(
            &destination.code,
            "",
            &format!("{} {}", destination.code, destination.city),
        ))));
        self.dispatch_flights(FlightAction::SetSearchParams(FlightParamsPatch {
            date: Some(date.format(DATE_FORMAT).to_string()),
            return_date: Some(None),
            trip_type: Some(TripType::OneWay),
            ..Default::default()
        }));
        self.search_flights().await
    }

    pub fn recent_searches(&self) -> Vec<RecentSearch> {
        self.inner.preferences.load_recent_searches()
    }

    pub fn clear_recent_searches(&self) {
        self.inner.preferences.clear_recent_searches();
    }

    pub fn select_flight(&self, id: Option<String>) {
        self.dispatch_flights(FlightAction::SetSelectedFlight(id.clone()));
        self.emit(StoreEvent::Selected {
            vertical: Vertical::Flights,
            id,
        });
    }

    pub fn select_hotel(&self, id: Option<String>) {
        self.dispatch_hotels(HotelAction::SetSelectedHotel(id.clone()));
        self.emit(StoreEvent::Selected {
            vertical: Vertical::Hotels,
            id,
        });
    }

    pub fn select_car(&self, id: Option<String>) {
        self.dispatch_cars(CarAction::SetSelectedCar(id.clone()));
        self.emit(StoreEvent::Selected {
            vertical: Vertical::Cars,
            id,
        });
    }

    // A data-grid sort on a known column overrides the slice's own sort
    fn grid_sort(&self) -> Option<Sort<FlightSortKey>> {
        let ui = self.inner.ui.lock();
        let model = ui.sort_model.as_ref()?;
        parse_sort(&model.field, model.direction.as_str(), FlightSortKey::from_field)
    }

    // Derived views
    pub fn flight_view(&self) -> Vec<FlightItinerary> {
        let grid_sort = self.grid_sort();
        let state = self.inner.flights.lock();
        apply(&state.flights, &state.filters, grid_sort.or(state.sort))
    }

    pub fn hotel_view(&self) -> Vec<Hotel> {
        let state = self.inner.hotels.lock();
        apply(&state.hotels, &state.filters, state.sort)
    }

    pub fn car_view(&self) -> Vec<CarRental> {
        let state = self.inner.cars.lock();
        apply(&state.cars, &state.filters, state.sort)
    }

    pub fn flight_page(&self) -> FlightPage {
        let view = self.flight_view();
        let ui = self.ui_state();
        let rows = flight_rows(&view);
        let slice = paginate(&rows, ui.page, ui.page_size);

        FlightPage {
            rows: slice.items.to_vec(),
            columns: visible_columns(&ui.visible_columns),
            page: slice.page,
            total_pages: slice.total_pages,
            total_items: slice.total_items,
            mode: ViewMode::for_len(view.len(), self.inner.config.virtualization_threshold),
        }
    }

    // Preference actions
    pub fn set_theme(&self, theme: Theme) {
        self.dispatch_ui(UiAction::SetTheme(theme));
    }

    pub fn toggle_theme(&self) {
        self.dispatch_ui(UiAction::ToggleTheme);
    }

    pub fn set_currency(&self, currency: &str) {
        self.dispatch_ui(UiAction::SetCurrency(currency.trim().to_ascii_uppercase()));
    }

    pub fn set_page_size(&self, page_size: usize) {
        self.dispatch_ui(UiAction::SetPageSize(page_size));
    }

    pub fn set_visible_columns(&self, columns: Vec<String>) {
        self.dispatch_ui(UiAction::SetVisibleColumns(columns));
    }

    pub fn toggle_column(&self, id: &str) {
        self.dispatch_ui(UiAction::ToggleColumn(id.to_string()));
    }
}
