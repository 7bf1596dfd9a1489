// Search state slices
// One state struct per vertical plus the UI slice. Every slice changes only through
// `apply(self, action) -> Self`, a pure transition over an explicit action enum.
// Responses carry the id of the request that produced them; a response whose id is
// not the slice's latest is stale and leaves the state untouched.

use tracing::debug;

use crate::filter::{
    CarFilters, CarFiltersPatch, CarSortKey, FlightFilters, FlightFiltersPatch, FlightSortKey,
    HotelFilters, HotelFiltersPatch, HotelSortKey, Sort, SortDirection,
};
use crate::model::{Airport, CarRental, FlightItinerary, Hotel};
use crate::preferences::{StoredPreferences, Theme, UserPreferences};
use crate::search_params::{
    CarParamsPatch, CarSearchParams, FlightParamsPatch, FlightSearchParams, HotelParamsPatch,
    HotelSearchParams, SortBy,
};

pub type RequestId = u64;

// Loading flag, last error and the latest dispatched request of one fetch kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStatus {
    pub latest_request: Option<RequestId>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SearchStatus {
    fn start(&mut self, request: RequestId) {
        self.latest_request = Some(request);
        self.loading = true;
        self.error = None;
    }

    fn accepts(&self, request: RequestId, slice: &str) -> bool {
        let current = self.latest_request == Some(request);
        if !current {
            debug!(slice, request, latest = ?self.latest_request, "Ignoring stale response");
        }
        current
    }

    fn fulfil(&mut self) {
        self.loading = false;
    }

    fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    // Forget the pending request so its response arrives stale
    fn abandon(&mut self) {
        self.latest_request = None;
        self.loading = false;
        self.error = None;
    }
}

fn airport_ids(airport: &Airport) -> (String, String) {
    let params = &airport.navigation.relevant_flight_params;
    let sky_id = if params.sky_id.is_empty() {
        airport.sky_id.clone()
    } else {
        params.sky_id.clone()
    };
    let entity_id = if params.entity_id.is_empty() {
        airport.entity_id.clone()
    } else {
        params.entity_id.clone()
    };
    (sky_id, entity_id)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightState {
    pub params: FlightSearchParams,
    pub origin: Option<Airport>,
    pub destination: Option<Airport>,
    pub flights: Vec<FlightItinerary>,
    pub airports: Vec<Airport>,
    pub flight_status: SearchStatus,
    pub airport_status: SearchStatus,
    pub selected_flight: Option<String>,
    pub sort: Option<Sort<FlightSortKey>>,
    pub filters: FlightFilters,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlightAction {
    SetSearchParams(FlightParamsPatch),
    SelectOrigin(Option<Airport>),
    SelectDestination(Option<Airport>),
    SwapAirports,
    SetSelectedFlight(Option<String>),
    SetSortBy(SortBy),
    SetSort(Option<Sort<FlightSortKey>>),
    SetFilters(FlightFiltersPatch),
    ClearFilters,
    ClearFlights,
    ClearAirports,
    FlightsStarted { request: RequestId },
    FlightsFulfilled { request: RequestId, items: Vec<FlightItinerary> },
    FlightsFailed { request: RequestId, message: String },
    AirportsStarted { request: RequestId },
    AirportsFulfilled { request: RequestId, items: Vec<Airport> },
    AirportsFailed { request: RequestId, message: String },
}

impl FlightState {
    pub fn apply(mut self, action: FlightAction) -> Self {
        match action {
            FlightAction::SetSearchParams(patch) => {
                self.params = self.params.merge(patch);
            }
            FlightAction::SelectOrigin(airport) => {
                let (sky_id, entity_id) = airport.as_ref().map(airport_ids).unwrap_or_default();
                self.params.origin_sky_id = sky_id;
                self.params.origin_entity_id = entity_id;
                self.origin = airport;
            }
            FlightAction::SelectDestination(airport) => {
                let (sky_id, entity_id) = airport.as_ref().map(airport_ids).unwrap_or_default();
                self.params.destination_sky_id = sky_id;
                self.params.destination_entity_id = entity_id;
                self.destination = airport;
            }
            FlightAction::SwapAirports => {
                std::mem::swap(&mut self.origin, &mut self.destination);
                let params = &mut self.params;
                std::mem::swap(&mut params.origin_sky_id, &mut params.destination_sky_id);
                std::mem::swap(&mut params.origin_entity_id, &mut params.destination_entity_id);
            }
            FlightAction::SetSelectedFlight(id) => {
                self.selected_flight = id;
            }
            FlightAction::SetSortBy(sort_by) => {
                self.params.sort_by = sort_by;
                self.sort = Some(Sort::<FlightSortKey>::from_sort_by(sort_by));
            }
            FlightAction::SetSort(sort) => {
                self.sort = sort;
            }
            FlightAction::SetFilters(patch) => {
                self.filters = self.filters.merge(patch);
            }
            FlightAction::ClearFilters => {
                self.filters = FlightFilters::default();
            }
            FlightAction::ClearFlights => {
                self.flights.clear();
                self.flight_status.error = None;
            }
            FlightAction::ClearAirports => {
                self.airports.clear();
                self.airport_status.abandon();
            }
            FlightAction::FlightsStarted { request } => {
                self.flight_status.start(request);
            }
            FlightAction::FlightsFulfilled { request, items } => {
                if self.flight_status.accepts(request, "flights") {
                    self.flight_status.fulfil();
                    self.flights = items;
                }
            }
            FlightAction::FlightsFailed { request, message } => {
                if self.flight_status.accepts(request, "flights") {
                    self.flight_status.fail(message);
                }
            }
            FlightAction::AirportsStarted { request } => {
                self.airport_status.start(request);
            }
            FlightAction::AirportsFulfilled { request, items } => {
                if self.airport_status.accepts(request, "airports") {
                    self.airport_status.fulfil();
                    self.airports = items;
                }
            }
            FlightAction::AirportsFailed { request, message } => {
                if self.airport_status.accepts(request, "airports") {
                    self.airport_status.fail(message);
                }
            }
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelState {
    pub params: HotelSearchParams,
    pub hotels: Vec<Hotel>,
    pub status: SearchStatus,
    pub selected_hotel: Option<String>,
    pub sort: Option<Sort<HotelSortKey>>,
    pub filters: HotelFilters,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HotelAction {
    SetSearchParams(HotelParamsPatch),
    SetSelectedHotel(Option<String>),
    SetSort(Option<Sort<HotelSortKey>>),
    SetFilters(HotelFiltersPatch),
    ClearHotels,
    SearchStarted { request: RequestId },
    SearchFulfilled { request: RequestId, items: Vec<Hotel> },
    SearchFailed { request: RequestId, message: String },
}

impl HotelState {
    pub fn apply(mut self, action: HotelAction) -> Self {
        match action {
            HotelAction::SetSearchParams(patch) => self.params = self.params.merge(patch),
            HotelAction::SetSelectedHotel(id) => self.selected_hotel = id,
            HotelAction::SetSort(sort) => self.sort = sort,
            HotelAction::SetFilters(patch) => self.filters = self.filters.merge(patch),
            HotelAction::ClearHotels => {
                self.hotels.clear();
                self.status.error = None;
            }
            HotelAction::SearchStarted { request } => self.status.start(request),
            HotelAction::SearchFulfilled { request, items } => {
                if self.status.accepts(request, "hotels") {
                    self.status.fulfil();
                    self.hotels = items;
                }
            }
            HotelAction::SearchFailed { request, message } => {
                if self.status.accepts(request, "hotels") {
                    self.status.fail(message);
                }
            }
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarState {
    pub params: CarSearchParams,
    pub cars: Vec<CarRental>,
    pub status: SearchStatus,
    pub selected_car: Option<String>,
    pub sort: Option<Sort<CarSortKey>>,
    pub filters: CarFilters,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CarAction {
    SetSearchParams(CarParamsPatch),
    SetSelectedCar(Option<String>),
    SetSort(Option<Sort<CarSortKey>>),
    SetFilters(CarFiltersPatch),
    ClearCars,
    SearchStarted { request: RequestId },
    SearchFulfilled { request: RequestId, items: Vec<CarRental> },
    SearchFailed { request: RequestId, message: String },
}

impl CarState {
    pub fn apply(mut self, action: CarAction) -> Self {
        match action {
            CarAction::SetSearchParams(patch) => self.params = self.params.merge(patch),
            CarAction::SetSelectedCar(id) => self.selected_car = id,
            CarAction::SetSort(sort) => self.sort = sort,
            CarAction::SetFilters(patch) => self.filters = self.filters.merge(patch),
            CarAction::ClearCars => {
                self.cars.clear();
                self.status.error = None;
            }
            CarAction::SearchStarted { request } => self.status.start(request),
            CarAction::SearchFulfilled { request, items } => {
                if self.status.accepts(request, "cars") {
                    self.status.fulfil();
                    self.cars = items;
                }
            }
            CarAction::SearchFailed { request, message } => {
                if self.status.accepts(request, "cars") {
                    self.status.fail(message);
                }
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Flights,
    Hotels,
    Cars,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Flights => "flights",
            Tab::Hotels => "hotels",
            Tab::Cars => "cars",
        }
    }
}

// Data-grid sort selection, kept as the raw field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortModel {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub theme: Theme,
    pub currency: String,
    pub language: String,
    pub visible_columns: Vec<String>,
    pub page_size: usize,
    pub page: usize,
    pub sort_model: Option<SortModel>,
    pub active_tab: Tab,
    pub sidebar_open: bool,
    pub search_form_expanded: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self::from_preferences(UserPreferences::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    SetTheme(Theme),
    ToggleTheme,
    SetCurrency(String),
    SetLanguage(String),
    SetVisibleColumns(Vec<String>),
    ToggleColumn(String),
    SetPageSize(usize),
    SetPage(usize),
    SetSortModel(Option<SortModel>),
    SetActiveTab(Tab),
    SetSidebarOpen(bool),
    SetSearchFormExpanded(bool),
    ToggleSidebar,
    ToggleSearchForm,
}

impl UiState {
    pub fn from_preferences(preferences: UserPreferences) -> Self {
        Self {
            theme: preferences.theme,
            currency: preferences.currency,
            language: preferences.language,
            visible_columns: preferences.visible_columns,
            page_size: preferences.page_size,
            page: 1,
            sort_model: None,
            active_tab: Tab::Flights,
            sidebar_open: false,
            search_form_expanded: true,
        }
    }

    pub fn apply(mut self, action: UiAction) -> Self {
        match action {
            UiAction::SetTheme(theme) => self.theme = theme,
            UiAction::ToggleTheme => self.theme = self.theme.toggled(),
            UiAction::SetCurrency(currency) => self.currency = currency,
            UiAction::SetLanguage(language) => self.language = language,
            UiAction::SetVisibleColumns(columns) => self.visible_columns = columns,
            UiAction::ToggleColumn(id) => {
                self.visible_columns = crate::view::toggle_column(&self.visible_columns, &id);
            }
            UiAction::SetPageSize(size) => {
                self.page_size = if size == 0 { crate::view::DEFAULT_PAGE_SIZE } else { size };
                self.page = 1;
            }
            UiAction::SetPage(page) => self.page = page.max(1),
            UiAction::SetSortModel(model) => self.sort_model = model,
            UiAction::SetActiveTab(tab) => self.active_tab = tab,
            UiAction::SetSidebarOpen(open) => self.sidebar_open = open,
            UiAction::SetSearchFormExpanded(expanded) => self.search_form_expanded = expanded,
            UiAction::ToggleSidebar => self.sidebar_open = !self.sidebar_open,
            UiAction::ToggleSearchForm => self.search_form_expanded = !self.search_form_expanded,
        }
        self
    }

    // The stored fields touched by an action, read back from the updated state.
    // Language and layout toggles are session-only.
    pub fn persisted_patch(&self, action: &UiAction) -> Option<StoredPreferences> {
        let patch = match action {
            UiAction::SetTheme(_) | UiAction::ToggleTheme => StoredPreferences {
                theme: Some(self.theme),
                ..Default::default()
            },
            UiAction::SetCurrency(_) => StoredPreferences {
                currency: Some(self.currency.clone()),
                ..Default::default()
            },
            UiAction::SetVisibleColumns(_) | UiAction::ToggleColumn(_) => StoredPreferences {
                visible_columns: Some(self.visible_columns.clone()),
                ..Default::default()
            },
            UiAction::SetPageSize(_) => StoredPreferences {
                page_size: Some(self.page_size),
                ..Default::default()
            },
            _ => return None,
        };
        Some(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::StopsFilter;
    use crate::mock_data;

    fn airport(code: &str) -> Airport {
        mock_data::airports()
            .into_iter()
            .find(|a| a.sky_id == code)
            .unwrap()
    }

    #[test]
    fn test_set_search_params_merges() {
        let state = FlightState::default().apply(FlightAction::SetSearchParams(FlightParamsPatch {
            origin_sky_id: Some("JFK".to_string()),
            destination_sky_id: Some("LAX".to_string()),
            date: Some("2024-01-15".to_string()),
            ..Default::default()
        }));

        assert_eq!(state.params.origin_sky_id, "JFK");
        assert_eq!(state.params.destination_sky_id, "LAX");
        assert_eq!(state.params.date, "2024-01-15");
        // Should preserve existing values
        assert_eq!(state.params.adults, 1);
    }

    #[test]
    fn test_set_filters_merges() {
        let state = FlightState::default().apply(FlightAction::SetFilters(FlightFiltersPatch {
            max_price: Some(Some(500.0)),
            stops: Some(StopsFilter::NonstopOnly),
            ..Default::default()
        }));

        assert_eq!(state.filters.max_price, Some(500.0));
        assert_eq!(state.filters.stops, StopsFilter::NonstopOnly);
        assert!(state.filters.airlines.is_empty());

        let cleared = state.apply(FlightAction::ClearFilters);
        assert_eq!(cleared.filters, FlightFilters::default());
    }

    #[test]
    fn test_select_and_swap_airports() {
        let state = FlightState::default()
            .apply(FlightAction::SelectOrigin(Some(airport("JFK"))))
            .apply(FlightAction::SelectDestination(Some(airport("LHR"))));

        assert_eq!(state.params.origin_sky_id, "JFK");
        assert_eq!(state.params.origin_entity_id, "95565058");
        assert_eq!(state.params.destination_sky_id, "LHR");

        let swapped = state.apply(FlightAction::SwapAirports);
        assert_eq!(swapped.params.origin_sky_id, "LHR");
        assert_eq!(swapped.params.destination_entity_id, "95565058");
        assert_eq!(swapped.origin.as_ref().map(|a| a.sky_id.as_str()), Some("LHR"));

        let cleared = swapped.apply(FlightAction::SelectOrigin(None));
        assert!(cleared.origin.is_none());
        assert!(cleared.params.origin_sky_id.is_empty());
    }

    #[test]
    fn test_search_lifecycle() {
        let started = FlightState::default()
            .apply(FlightAction::FlightsFailed {
                request: 1,
                message: "boom".to_string(),
            })
            .apply(FlightAction::FlightsStarted { request: 2 });
        assert!(started.flight_status.loading);
        assert!(started.flight_status.error.is_none());

        let done = started.clone().apply(FlightAction::FlightsFulfilled {
            request: 2,
            items: mock_data::flights(),
        });
        assert!(!done.flight_status.loading);
        assert_eq!(done.flights.len(), 2);

        let failed = started.apply(FlightAction::FlightsFailed {
            request: 2,
            message: "Search timed out".to_string(),
        });
        assert!(!failed.flight_status.loading);
        assert_eq!(failed.flight_status.error.as_deref(), Some("Search timed out"));
        assert!(failed.flights.is_empty());
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let state = FlightState::default()
            .apply(FlightAction::FlightsStarted { request: 1 })
            .apply(FlightAction::FlightsStarted { request: 2 })
            .apply(FlightAction::FlightsFulfilled {
                request: 2,
                items: mock_data::flights()[..1].to_vec(),
            });

        let after_stale = state.clone().apply(FlightAction::FlightsFulfilled {
            request: 1,
            items: mock_data::flights(),
        });
        assert_eq!(after_stale, state);

        let after_stale_failure = state.clone().apply(FlightAction::FlightsFailed {
            request: 1,
            message: "late".to_string(),
        });
        assert_eq!(after_stale_failure, state);
    }

    #[test]
    fn test_cleared_airports_ignore_pending_response() {
        let state = FlightState::default()
            .apply(FlightAction::AirportsStarted { request: 4 })
            .apply(FlightAction::ClearAirports);
        assert!(!state.airport_status.loading);
        assert_eq!(state.airport_status.latest_request, None);

        let state = state.apply(FlightAction::AirportsFulfilled {
            request: 4,
            items: mock_data::airports(),
        });
        assert!(state.airports.is_empty());
    }

    #[test]
    fn test_sort_by_sets_view_sort() {
        let state = FlightState::default().apply(FlightAction::SetSortBy(SortBy::PriceLow));
        assert_eq!(state.params.sort_by, SortBy::PriceLow);
        assert_eq!(state.sort, Some(Sort::asc(FlightSortKey::Price)));
    }

    #[test]
    fn test_hotel_and_car_slices() {
        let hotels = HotelState::default()
            .apply(HotelAction::SetSearchParams(HotelParamsPatch {
                destination: Some("New York".to_string()),
                ..Default::default()
            }))
            .apply(HotelAction::SearchStarted { request: 7 })
            .apply(HotelAction::SearchFulfilled {
                request: 6,
                items: mock_data::hotels(),
            });
        assert!(hotels.status.loading);
        assert!(hotels.hotels.is_empty());
        assert_eq!(hotels.params.guests, 1);

        let hotels = hotels.apply(HotelAction::SearchFulfilled {
            request: 7,
            items: mock_data::hotels(),
        });
        assert_eq!(hotels.hotels.len(), 4);
        assert!(hotels.apply(HotelAction::ClearHotels).hotels.is_empty());

        let cars = CarState::default()
            .apply(CarAction::SearchStarted { request: 1 })
            .apply(CarAction::SearchFailed {
                request: 1,
                message: "Failed to search cars".to_string(),
            })
            .apply(CarAction::SetSelectedCar(Some("car-2".to_string())));
        assert_eq!(cars.status.error.as_deref(), Some("Failed to search cars"));
        assert_eq!(cars.selected_car.as_deref(), Some("car-2"));
        assert_eq!(cars.params.pickup_time, "10:00");
    }

    #[test]
    fn test_ui_state_and_persisted_fields() {
        let ui = UiState::default();
        assert_eq!(ui.theme, Theme::Light);
        assert_eq!(ui.page_size, 25);
        assert!(ui.search_form_expanded);

        let action = UiAction::ToggleTheme;
        let ui = ui.apply(action.clone());
        assert_eq!(ui.theme, Theme::Dark);
        assert_eq!(ui.persisted_patch(&action).unwrap().theme, Some(Theme::Dark));

        let action = UiAction::ToggleColumn("tags".to_string());
        let ui = ui.apply(action.clone());
        assert_eq!(ui.visible_columns.last().map(String::as_str), Some("tags"));
        assert_eq!(
            ui.persisted_patch(&action).unwrap().visible_columns.unwrap().len(),
            7
        );

        let ui = ui.apply(UiAction::SetPage(3)).apply(UiAction::SetPageSize(0));
        assert_eq!(ui.page_size, 25);
        assert_eq!(ui.page, 1);

        let action = UiAction::SetLanguage("fr".to_string());
        let ui = ui.apply(action.clone());
        assert_eq!(ui.language, "fr");
        assert!(ui.persisted_patch(&action).is_none());

        let ui = ui.apply(UiAction::ToggleSidebar).apply(UiAction::ToggleSearchForm);
        assert!(ui.sidebar_open);
        assert!(!ui.search_form_expanded);
    }
}
