// Filter/sort engine
// Turns a raw result list plus filter and sort selections into the list to display.
// Pure: the input is never mutated and the same inputs always give the same output.

use std::cmp::Ordering;

use crate::model::{CarRental, FlightItinerary, Hotel, ResultItem, Transmission};
use crate::search_params::SortBy;

// A filter state able to test one result item
pub trait Predicate<T> {
    fn matches(&self, item: &T) -> bool;
}

// A sortable column over result items
pub trait SortKey<T>: Copy {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Ascending),
            "desc" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K> Sort<K> {
    pub fn asc(key: K) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(key: K) -> Self {
        Self {
            key,
            direction: SortDirection::Descending,
        }
    }
}

// Derive the displayed view: keep items matching every active predicate, then
// apply the optional single-key sort. `sort_by` is stable, so equal keys keep
// their input order in both directions.
pub fn apply<T, P, K>(items: &[T], predicate: &P, sort: Option<Sort<K>>) -> Vec<T>
where
    T: Clone,
    P: Predicate<T>,
    K: SortKey<T>,
{
    let mut view: Vec<T> = items
        .iter()
        .filter(|item| predicate.matches(item))
        .cloned()
        .collect();

    if let Some(Sort { key, direction }) = sort {
        view.sort_by(|a, b| {
            let ordering = key.compare(a, b);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }

    view
}

// Options of one filter dimension, selectable by their display label.
// Unknown labels parse to the default option, which is always "no constraint".
pub trait FilterOption: Copy + Default + PartialEq + 'static {
    const OPTIONS: &'static [(&'static str, Self)];

    fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::OPTIONS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(label))
            .map(|(_, option)| *option)
            .unwrap_or_default()
    }

    fn label(&self) -> &'static str {
        Self::OPTIONS
            .iter()
            .find(|(_, option)| option == self)
            .map(|(label, _)| *label)
            .unwrap_or("Any")
    }

    fn labels() -> Vec<&'static str> {
        Self::OPTIONS.iter().map(|(label, _)| *label).collect()
    }

    fn is_any(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopsFilter {
    #[default]
    Any,
    NonstopOnly,
    AtMostOne,
    AtMostTwo,
}

impl FilterOption for StopsFilter {
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("Any number of stops", StopsFilter::Any),
        ("Nonstop only", StopsFilter::NonstopOnly),
        ("1 stop or fewer", StopsFilter::AtMostOne),
        ("2 stops or fewer", StopsFilter::AtMostTwo),
        ("Nonstop", StopsFilter::NonstopOnly),
    ];
}

impl StopsFilter {
    pub fn max_stops(&self) -> Option<u32> {
        match self {
            StopsFilter::Any => None,
            StopsFilter::NonstopOnly => Some(0),
            StopsFilter::AtMostOne => Some(1),
            StopsFilter::AtMostTwo => Some(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alliance {
    Oneworld,
    SkyTeam,
    StarAlliance,
}

impl Alliance {
    pub fn id(&self) -> &'static str {
        match self {
            Alliance::Oneworld => "oneworld",
            Alliance::SkyTeam => "skyteam",
            Alliance::StarAlliance => "star_alliance",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Alliance::Oneworld => "Oneworld",
            Alliance::SkyTeam => "SkyTeam",
            Alliance::StarAlliance => "Star Alliance",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        [Alliance::Oneworld, Alliance::SkyTeam, Alliance::StarAlliance]
            .into_iter()
            .find(|alliance| {
                value.eq_ignore_ascii_case(alliance.label()) || value.eq_ignore_ascii_case(alliance.id())
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AirlineSelector {
    Alliance(Alliance),
    Carrier(String),
}

impl AirlineSelector {
    pub const ALL_AIRLINES: &'static str = "Select all airlines";

    // Parse a filter-bar label or a carrier code. "Select all airlines" and
    // anything that is not a plausible carrier code select nothing.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(Self::ALL_AIRLINES) || value.eq_ignore_ascii_case("any") {
            return None;
        }
        if let Some(alliance) = Alliance::parse(value) {
            return Some(AirlineSelector::Alliance(alliance));
        }
        if value.len() <= 3 && value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Some(AirlineSelector::Carrier(value.to_ascii_uppercase()));
        }
        None
    }

    pub fn label(&self) -> &str {
        match self {
            AirlineSelector::Alliance(alliance) => alliance.label(),
            AirlineSelector::Carrier(code) => code,
        }
    }

    fn matches(&self, itinerary: &FlightItinerary) -> bool {
        let Some(segment) = itinerary.first_segment() else {
            return false;
        };
        let carrier = &segment.marketing_carrier;
        match self {
            AirlineSelector::Alliance(alliance) => carrier.alliance_id == alliance.id(),
            AirlineSelector::Carrier(code) => {
                carrier.id.eq_ignore_ascii_case(code) || carrier.alternate_id.eq_ignore_ascii_case(code)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceBracket {
    #[default]
    Any,
    UpTo200,
    From200To500,
    Above500,
}

impl FilterOption for PriceBracket {
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("Any", PriceBracket::Any),
        ("$0-$200", PriceBracket::UpTo200),
        ("$200-$500", PriceBracket::From200To500),
        ("$500+", PriceBracket::Above500),
    ];
}

impl PriceBracket {
    // 0 <= p <= 200, 200 < p <= 500, p > 500
    pub fn contains(&self, price: f64) -> bool {
        match self {
            PriceBracket::Any => true,
            PriceBracket::UpTo200 => (0.0..=200.0).contains(&price),
            PriceBracket::From200To500 => price > 200.0 && price <= 500.0,
            PriceBracket::Above500 => price > 500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationBracket {
    #[default]
    Any,
    UnderFourHours,
    FourToEightHours,
    OverEightHours,
}

impl FilterOption for DurationBracket {
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("Any", DurationBracket::Any),
        ("< 4h", DurationBracket::UnderFourHours),
        ("4-8h", DurationBracket::FourToEightHours),
        ("> 8h", DurationBracket::OverEightHours),
    ];
}

impl DurationBracket {
    pub fn contains(&self, minutes: u32) -> bool {
        match self {
            DurationBracket::Any => true,
            DurationBracket::UnderFourHours => minutes < 240,
            DurationBracket::FourToEightHours => (240..=480).contains(&minutes),
            DurationBracket::OverEightHours => minutes > 480,
        }
    }
}

// The next four dimensions are exposed in the filter bar but have no predicate:
// the result data carries no baggage, departure-window, emissions or
// connection-airport attributes to test. Any selection is accepted and ignored.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BagsFilter {
    #[default]
    Any,
    OneBag,
    TwoPlusBags,
}

impl FilterOption for BagsFilter {
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("Any", BagsFilter::Any),
        ("1 bag", BagsFilter::OneBag),
        ("2+ bags", BagsFilter::TwoPlusBags),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimesFilter {
    #[default]
    Any,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl FilterOption for TimesFilter {
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("Any", TimesFilter::Any),
        ("Morning", TimesFilter::Morning),
        ("Afternoon", TimesFilter::Afternoon),
        ("Evening", TimesFilter::Evening),
        ("Night", TimesFilter::Night),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmissionsFilter {
    #[default]
    Any,
    LowEmissionsOnly,
}

impl FilterOption for EmissionsFilter {
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("Any", EmissionsFilter::Any),
        ("Low emissions only", EmissionsFilter::LowEmissionsOnly),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectingAirportsFilter {
    #[default]
    Any,
    DirectOnly,
}

impl FilterOption for ConnectingAirportsFilter {
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("Any", ConnectingAirportsFilter::Any),
        ("Direct only", ConnectingAirportsFilter::DirectOnly),
    ];
}

// Labels shown by the flight filter bar, one entry per dimension
pub fn flight_filter_bar() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        ("Stops", StopsFilter::labels()[..4].to_vec()),
        (
            "Airlines",
            vec![
                AirlineSelector::ALL_AIRLINES,
                Alliance::Oneworld.label(),
                Alliance::SkyTeam.label(),
                Alliance::StarAlliance.label(),
            ],
        ),
        ("Bags", BagsFilter::labels()),
        ("Price", PriceBracket::labels()),
        ("Times", TimesFilter::labels()),
        ("Emissions", EmissionsFilter::labels()),
        ("Connecting airports", ConnectingAirportsFilter::labels()),
        ("Duration", DurationBracket::labels()),
    ]
}

// Upper bounds must be finite and non-negative to constrain anything
fn valid_bound(bound: Option<f64>) -> Option<f64> {
    bound.filter(|value| value.is_finite() && *value >= 0.0)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightFilters {
    pub stops: StopsFilter,
    pub airlines: Vec<AirlineSelector>,
    pub price: PriceBracket,
    pub duration: DurationBracket,
    pub max_price: Option<f64>,
    pub bags: BagsFilter,
    pub times: TimesFilter,
    pub emissions: EmissionsFilter,
    pub connecting_airports: ConnectingAirportsFilter,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightFiltersPatch {
    pub stops: Option<StopsFilter>,
    pub airlines: Option<Vec<AirlineSelector>>,
    pub price: Option<PriceBracket>,
    pub duration: Option<DurationBracket>,
    pub max_price: Option<Option<f64>>,
    pub bags: Option<BagsFilter>,
    pub times: Option<TimesFilter>,
    pub emissions: Option<EmissionsFilter>,
    pub connecting_airports: Option<ConnectingAirportsFilter>,
}

impl FlightFilters {
    pub fn merge(mut self, patch: FlightFiltersPatch) -> Self {
        if let Some(stops) = patch.stops {
            self.stops = stops;
        }
        if let Some(airlines) = patch.airlines {
            self.airlines = airlines;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(max_price) = patch.max_price {
            self.max_price = max_price;
        }
        if let Some(bags) = patch.bags {
            self.bags = bags;
        }
        if let Some(times) = patch.times {
            self.times = times;
        }
        if let Some(emissions) = patch.emissions {
            self.emissions = emissions;
        }
        if let Some(connecting_airports) = patch.connecting_airports {
            self.connecting_airports = connecting_airports;
        }
        self
    }

    // Names of the dimensions that currently narrow the result list
    pub fn active_dimensions(&self) -> Vec<&'static str> {
        let mut active = Vec::new();
        if !self.stops.is_any() {
            active.push("stops");
        }
        if !self.airlines.is_empty() {
            active.push("airlines");
        }
        if !self.price.is_any() {
            active.push("price");
        }
        if !self.duration.is_any() {
            active.push("duration");
        }
        if valid_bound(self.max_price).is_some() {
            active.push("max_price");
        }
        active
    }
}

impl Predicate<FlightItinerary> for FlightFilters {
    fn matches(&self, itinerary: &FlightItinerary) -> bool {
        let leg = itinerary.first_leg();

        if let Some(max_stops) = self.stops.max_stops() {
            if !leg.map_or(false, |leg| leg.stop_count <= max_stops) {
                return false;
            }
        }

        if !self.airlines.is_empty()
            && !self
                .airlines
                .iter()
                .any(|selector| selector.matches(itinerary))
        {
            return false;
        }

        if !self.price.contains(itinerary.raw_price()) {
            return false;
        }

        if !self.duration.is_any()
            && !leg.map_or(false, |leg| self.duration.contains(leg.duration_in_minutes))
        {
            return false;
        }

        if !valid_bound(self.max_price).map_or(true, |max| itinerary.raw_price() <= max) {
            return false;
        }

        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightSortKey {
    Best,
    Price,
    Duration,
    Departure,
    Arrival,
    Stops,
    Airline,
}

impl FlightSortKey {
    // Data-grid column field to sort key
    pub fn from_field(field: &str) -> Option<Self> {
        match field.trim() {
            "score" | "best" => Some(FlightSortKey::Best),
            "price" => Some(FlightSortKey::Price),
            "duration" => Some(FlightSortKey::Duration),
            "departure" => Some(FlightSortKey::Departure),
            "arrival" => Some(FlightSortKey::Arrival),
            "stops" => Some(FlightSortKey::Stops),
            "airline" => Some(FlightSortKey::Airline),
            _ => None,
        }
    }
}

impl Sort<FlightSortKey> {
    pub fn from_sort_by(sort_by: SortBy) -> Self {
        match sort_by {
            SortBy::Best => Sort::desc(FlightSortKey::Best),
            SortBy::PriceLow => Sort::asc(FlightSortKey::Price),
            SortBy::PriceHigh => Sort::desc(FlightSortKey::Price),
            SortBy::Duration => Sort::asc(FlightSortKey::Duration),
            SortBy::OutboundTakeOffTime => Sort::asc(FlightSortKey::Departure),
            SortBy::OutboundLandingTime => Sort::asc(FlightSortKey::Arrival),
        }
    }
}

impl SortKey<FlightItinerary> for FlightSortKey {
    fn compare(&self, a: &FlightItinerary, b: &FlightItinerary) -> Ordering {
        let (leg_a, leg_b) = (a.first_leg(), b.first_leg());
        match self {
            FlightSortKey::Best => a.score.total_cmp(&b.score),
            FlightSortKey::Price => a.raw_price().total_cmp(&b.raw_price()),
            FlightSortKey::Duration => leg_a
                .map(|l| l.duration_in_minutes)
                .cmp(&leg_b.map(|l| l.duration_in_minutes)),
            FlightSortKey::Departure => leg_a
                .map(|l| l.departure.as_str())
                .cmp(&leg_b.map(|l| l.departure.as_str())),
            FlightSortKey::Arrival => leg_a
                .map(|l| l.arrival.as_str())
                .cmp(&leg_b.map(|l| l.arrival.as_str())),
            FlightSortKey::Stops => leg_a.map(|l| l.stop_count).cmp(&leg_b.map(|l| l.stop_count)),
            FlightSortKey::Airline => a
                .first_segment()
                .map(|s| s.marketing_carrier.name.as_str())
                .cmp(&b.first_segment().map(|s| s.marketing_carrier.name.as_str())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelFilters {
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub stars: Vec<u8>,
    pub amenities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelFiltersPatch {
    pub max_price: Option<Option<f64>>,
    pub min_rating: Option<Option<f64>>,
    pub stars: Option<Vec<u8>>,
    pub amenities: Option<Vec<String>>,
}

impl HotelFilters {
    pub fn merge(mut self, patch: HotelFiltersPatch) -> Self {
        if let Some(max_price) = patch.max_price {
            self.max_price = max_price;
        }
        if let Some(min_rating) = patch.min_rating {
            self.min_rating = min_rating;
        }
        if let Some(stars) = patch.stars {
            self.stars = stars;
        }
        if let Some(amenities) = patch.amenities {
            self.amenities = amenities;
        }
        self
    }
}

impl Predicate<Hotel> for HotelFilters {
    fn matches(&self, hotel: &Hotel) -> bool {
        if !valid_bound(self.max_price).map_or(true, |max| hotel.raw_price() <= max) {
            return false;
        }

        if !valid_bound(self.min_rating).map_or(true, |min| hotel.rating >= min) {
            return false;
        }

        if !self.stars.is_empty() && !self.stars.contains(&hotel.stars) {
            return false;
        }

        // Every selected amenity must be offered
        if !self.amenities.iter().all(|wanted| {
            hotel
                .amenities
                .iter()
                .any(|amenity| amenity.eq_ignore_ascii_case(wanted))
        }) {
            return false;
        }

        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotelSortKey {
    Price,
    Rating,
    Stars,
    Name,
}

impl HotelSortKey {
    pub fn from_field(field: &str) -> Option<Self> {
        match field.trim() {
            "price" => Some(HotelSortKey::Price),
            "rating" => Some(HotelSortKey::Rating),
            "stars" => Some(HotelSortKey::Stars),
            "name" => Some(HotelSortKey::Name),
            _ => None,
        }
    }
}

impl SortKey<Hotel> for HotelSortKey {
    fn compare(&self, a: &Hotel, b: &Hotel) -> Ordering {
        match self {
            HotelSortKey::Price => a.raw_price().total_cmp(&b.raw_price()),
            HotelSortKey::Rating => a.rating.total_cmp(&b.rating),
            HotelSortKey::Stars => a.stars.cmp(&b.stars),
            HotelSortKey::Name => a.name.cmp(&b.name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarFilters {
    pub max_price: Option<f64>,
    pub car_types: Vec<String>,
    pub suppliers: Vec<String>,
    pub transmission: Vec<Transmission>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarFiltersPatch {
    pub max_price: Option<Option<f64>>,
    pub car_types: Option<Vec<String>>,
    pub suppliers: Option<Vec<String>>,
    pub transmission: Option<Vec<Transmission>>,
}

impl CarFilters {
    pub fn merge(mut self, patch: CarFiltersPatch) -> Self {
        if let Some(max_price) = patch.max_price {
            self.max_price = max_price;
        }
        if let Some(car_types) = patch.car_types {
            self.car_types = car_types;
        }
        if let Some(suppliers) = patch.suppliers {
            self.suppliers = suppliers;
        }
        if let Some(transmission) = patch.transmission {
            self.transmission = transmission;
        }
        self
    }
}

fn contains_ignore_case(set: &[String], value: &str) -> bool {
    set.is_empty() || set.iter().any(|candidate| candidate.eq_ignore_ascii_case(value))
}

impl Predicate<CarRental> for CarFilters {
    fn matches(&self, car: &CarRental) -> bool {
        if !valid_bound(self.max_price).map_or(true, |max| car.raw_price() <= max) {
            return false;
        }

        if !contains_ignore_case(&self.car_types, &car.car_type) {
            return false;
        }

        if !contains_ignore_case(&self.suppliers, &car.supplier) {
            return false;
        }

        if !self.transmission.is_empty() && !self.transmission.contains(&car.transmission) {
            return false;
        }

        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarSortKey {
    Price,
    Seats,
    Supplier,
}

impl CarSortKey {
    pub fn from_field(field: &str) -> Option<Self> {
        match field.trim() {
            "price" => Some(CarSortKey::Price),
            "seats" => Some(CarSortKey::Seats),
            "supplier" => Some(CarSortKey::Supplier),
            _ => None,
        }
    }
}

impl SortKey<CarRental> for CarSortKey {
    fn compare(&self, a: &CarRental, b: &CarRental) -> Ordering {
        match self {
            CarSortKey::Price => a.raw_price().total_cmp(&b.raw_price()),
            CarSortKey::Seats => a.seats.cmp(&b.seats),
            CarSortKey::Supplier => a.supplier.cmp(&b.supplier),
        }
    }
}

// Parse a data-grid style sort model entry ("price", "desc"). Unknown fields
// give no sort; an unknown direction falls back to ascending.
pub fn parse_sort<K>(field: &str, direction: &str, key: impl Fn(&str) -> Option<K>) -> Option<Sort<K>> {
    key(field).map(|key| Sort {
        key,
        direction: SortDirection::parse(direction).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_data;
    use crate::model::{Carrier, FlightPrice, Leg, Segment};
    use rand::Rng;
    use test_case::test_case;

    fn itinerary(id: &str, price: f64, stops: u32, minutes: u32, carrier: (&str, &str)) -> FlightItinerary {
        FlightItinerary {
            id: id.to_string(),
            price: FlightPrice {
                raw: price,
                formatted: format!("${}", price),
            },
            legs: vec![Leg {
                id: format!("{}-leg", id),
                duration_in_minutes: minutes,
                stop_count: stops,
                departure: "2024-01-15T08:00:00".to_string(),
                arrival: "2024-01-15T20:00:00".to_string(),
                segments: vec![Segment {
                    id: format!("{}-seg", id),
                    flight_number: format!("{}1", carrier.0),
                    marketing_carrier: Carrier {
                        id: carrier.0.to_string(),
                        name: format!("{} Airways", carrier.0),
                        alternate_id: carrier.0.to_string(),
                        alliance_id: carrier.1.to_string(),
                    },
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn sample_flights() -> Vec<FlightItinerary> {
        let mut flights = mock_data::flights();
        flights.push(itinerary("flight-3", 650.0, 2, 600, ("AF", "skyteam")));
        flights.push(itinerary("flight-4", 180.0, 0, 200, ("B6", "")));
        flights
    }

    fn ids(flights: &[FlightItinerary]) -> Vec<&str> {
        flights.iter().map(|f| f.id.as_str()).collect()
    }

    fn no_sort() -> Option<Sort<FlightSortKey>> {
        None
    }

    #[test_case(FlightFilters {stops: StopsFilter::NonstopOnly, ..Default::default()},
        vec!["flight-1", "flight-4"]; "#1 Nonstop only")]
    #[test_case(FlightFilters {stops: StopsFilter::AtMostOne, ..Default::default()},
        vec!["flight-1", "flight-2", "flight-4"]; "#2 At most one stop")]
    #[test_case(FlightFilters {airlines: vec![AirlineSelector::Alliance(Alliance::StarAlliance)], ..Default::default()},
        vec!["flight-2"]; "#3 Star Alliance")]
    #[test_case(FlightFilters {airlines: vec![AirlineSelector::Alliance(Alliance::Oneworld), AirlineSelector::Carrier("B6".to_string())], ..Default::default()},
        vec!["flight-1", "flight-4"]; "#4 Alliance or carrier")]
    #[test_case(FlightFilters {price: PriceBracket::UpTo200, ..Default::default()},
        vec!["flight-4"]; "#5 Price up to 200")]
    #[test_case(FlightFilters {price: PriceBracket::From200To500, ..Default::default()},
        vec!["flight-1", "flight-2"]; "#6 Price 200 to 500")]
    #[test_case(FlightFilters {price: PriceBracket::Above500, ..Default::default()},
        vec!["flight-3"]; "#7 Price above 500")]
    #[test_case(FlightFilters {duration: DurationBracket::UnderFourHours, ..Default::default()},
        vec!["flight-4"]; "#8 Under four hours")]
    #[test_case(FlightFilters {duration: DurationBracket::FourToEightHours, ..Default::default()},
        vec!["flight-1", "flight-2"]; "#9 Four to eight hours")]
    #[test_case(FlightFilters {duration: DurationBracket::OverEightHours, stops: StopsFilter::AtMostTwo, ..Default::default()},
        vec!["flight-3"]; "#10 Combined filters")]
    #[test_case(FlightFilters {max_price: Some(260.0), ..Default::default()},
        vec!["flight-2", "flight-4"]; "#11 Max price")]
    #[test_case(FlightFilters {max_price: Some(f64::NAN), bags: BagsFilter::TwoPlusBags, times: TimesFilter::Night, emissions: EmissionsFilter::LowEmissionsOnly, connecting_airports: ConnectingAirportsFilter::DirectOnly, ..Default::default()},
        vec!["flight-1", "flight-2", "flight-3", "flight-4"]; "#12 No-op dimensions and invalid bound")]
    fn test_flight_filters(filters: FlightFilters, expected_ids: Vec<&str>) {
        let flights = sample_flights();
        let view = apply(&flights, &filters, no_sort());
        assert_eq!(ids(&view), expected_ids);
    }

    #[test]
    fn test_jfk_lax_scenario() {
        let flights = mock_data::flights();

        let filters = FlightFilters {
            price: PriceBracket::from_label("$200-$500"),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&flights, &filters, no_sort())), vec!["flight-1", "flight-2"]);

        let filters = FlightFilters {
            stops: StopsFilter::from_label("Nonstop only"),
            ..Default::default()
        };
        let view = apply(&flights, &filters, no_sort());
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].price.raw, 299.0);
        assert_eq!(view[0].legs[0].stop_count, 0);
    }

    #[test]
    fn test_unknown_labels_are_unconstrained() {
        assert_eq!(StopsFilter::from_label("3 stops or fewer"), StopsFilter::Any);
        assert_eq!(PriceBracket::from_label("$1-$2"), PriceBracket::Any);
        assert_eq!(DurationBracket::from_label(""), DurationBracket::Any);
        assert_eq!(StopsFilter::from_label(" nonstop ONLY "), StopsFilter::NonstopOnly);
        assert_eq!(AirlineSelector::parse("Select all airlines"), None);
        assert_eq!(AirlineSelector::parse("not an airline at all"), None);
        assert_eq!(
            AirlineSelector::parse("Star Alliance"),
            Some(AirlineSelector::Alliance(Alliance::StarAlliance))
        );
        assert_eq!(
            AirlineSelector::parse("ua"),
            Some(AirlineSelector::Carrier("UA".to_string()))
        );
        assert_eq!(PriceBracket::UpTo200.label(), "$0-$200");
    }

    #[test]
    fn test_itinerary_without_legs() {
        let flights = vec![FlightItinerary {
            id: "empty".to_string(),
            price: FlightPrice {
                raw: 100.0,
                formatted: "$100".to_string(),
            },
            ..Default::default()
        }];

        let unconstrained = apply(&flights, &FlightFilters::default(), no_sort());
        assert_eq!(unconstrained.len(), 1);

        // Leg based predicates cannot be satisfied, unrelated ones still apply
        let stops = FlightFilters {
            stops: StopsFilter::AtMostTwo,
            ..Default::default()
        };
        assert!(apply(&flights, &stops, no_sort()).is_empty());

        let price = FlightFilters {
            price: PriceBracket::UpTo200,
            ..Default::default()
        };
        assert_eq!(apply(&flights, &price, no_sort()).len(), 1);
    }

    fn random_flights(count: usize) -> Vec<FlightItinerary> {
        let mut rng = rand::thread_rng();
        let alliances = [("AA", "oneworld"), ("UA", "star_alliance"), ("AF", "skyteam")];
        (0..count)
            .map(|i| {
                let carrier = alliances[rng.gen_range(0..alliances.len())];
                itinerary(
                    &format!("flight-{}", i),
                    rng.gen_range(0..1200) as f64 + 0.5 * rng.gen_range(0..2) as f64,
                    rng.gen_range(0..4),
                    rng.gen_range(60..900),
                    carrier,
                )
            })
            .collect()
    }

    #[test]
    fn test_unconstrained_filters_are_identity() {
        let flights = random_flights(300);
        let view = apply(&flights, &FlightFilters::default(), no_sort());
        assert_eq!(view, flights);
    }

    #[test]
    fn test_price_bracket_sound_and_complete() {
        let flights = random_flights(500);
        // Boundary values
        let mut flights = flights;
        for (i, price) in [0.0, 200.0, 200.01, 500.0, 500.01].into_iter().enumerate() {
            flights.push(itinerary(&format!("edge-{}", i), price, 0, 100, ("AA", "oneworld")));
        }

        for bracket in [PriceBracket::UpTo200, PriceBracket::From200To500, PriceBracket::Above500] {
            let filters = FlightFilters {
                price: bracket,
                ..Default::default()
            };
            let view = apply(&flights, &filters, no_sort());
            let kept: Vec<&str> = ids(&view);

            for flight in &flights {
                let inside = bracket.contains(flight.price.raw);
                assert_eq!(
                    kept.contains(&flight.id.as_str()),
                    inside,
                    "{:?} misclassified price {}",
                    bracket,
                    flight.price.raw
                );
            }
        }
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let flights = random_flights(200);
        let filters = FlightFilters {
            stops: StopsFilter::AtMostOne,
            duration: DurationBracket::FourToEightHours,
            ..Default::default()
        };
        let once = apply(&flights, &filters, no_sort());
        let twice = apply(&once, &filters, no_sort());
        assert_eq!(once, twice);
        assert_eq!(once, apply(&flights, &filters, no_sort()));
    }

    #[test]
    fn test_sort_is_stable_in_both_directions() {
        let flights = vec![
            itinerary("a", 300.0, 0, 100, ("AA", "oneworld")),
            itinerary("b", 200.0, 0, 100, ("AA", "oneworld")),
            itinerary("c", 300.0, 0, 100, ("AA", "oneworld")),
            itinerary("d", 200.0, 0, 100, ("AA", "oneworld")),
        ];
        let filters = FlightFilters::default();

        let asc = apply(&flights, &filters, Some(Sort::asc(FlightSortKey::Price)));
        assert_eq!(ids(&asc), vec!["b", "d", "a", "c"]);

        let desc = apply(&flights, &filters, Some(Sort::desc(FlightSortKey::Price)));
        assert_eq!(ids(&desc), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_sort_by_mapping() {
        let flights = mock_data::flights();
        let filters = FlightFilters::default();

        let cheapest = apply(&flights, &filters, Some(Sort::<FlightSortKey>::from_sort_by(SortBy::PriceLow)));
        assert_eq!(ids(&cheapest), vec!["flight-2", "flight-1"]);

        let best = apply(&flights, &filters, Some(Sort::<FlightSortKey>::from_sort_by(SortBy::Best)));
        assert_eq!(ids(&best), vec!["flight-1", "flight-2"]);

        let take_off = apply(
            &flights,
            &filters,
            Some(Sort::<FlightSortKey>::from_sort_by(SortBy::OutboundTakeOffTime)),
        );
        assert_eq!(ids(&take_off), vec!["flight-2", "flight-1"]);

        let model = parse_sort("duration", "desc", FlightSortKey::from_field);
        assert_eq!(model, Some(Sort::desc(FlightSortKey::Duration)));
        assert_eq!(parse_sort("tags", "asc", FlightSortKey::from_field), None);
    }

    #[test_case(HotelFilters {max_price: Some(300.0), ..Default::default()},
        vec!["hotel-1", "hotel-2"]; "#1 Hotel max price")]
    #[test_case(HotelFilters {min_rating: Some(4.6), ..Default::default()},
        vec!["hotel-3", "hotel-4"]; "#2 Hotel min rating")]
    #[test_case(HotelFilters {stars: vec![4], ..Default::default()},
        vec!["hotel-2"]; "#3 Hotel stars")]
    #[test_case(HotelFilters {amenities: vec!["pool".to_string(), "Spa".to_string()], ..Default::default()},
        vec!["hotel-1", "hotel-3"]; "#4 Hotel amenities")]
    #[test_case(HotelFilters {max_price: Some(-1.0), min_rating: Some(f64::INFINITY), ..Default::default()},
        vec!["hotel-1", "hotel-2", "hotel-3", "hotel-4"]; "#5 Hotel invalid bounds")]
    fn test_hotel_filters(filters: HotelFilters, expected_ids: Vec<&str>) {
        let hotels = mock_data::hotels();
        let view = apply(&hotels, &filters, None::<Sort<HotelSortKey>>);
        let view_ids: Vec<&str> = view.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(view_ids, expected_ids);
    }

    #[test_case(CarFilters {max_price: Some(100.0), ..Default::default()},
        vec!["car-1", "car-2"]; "#1 Car max price")]
    #[test_case(CarFilters {car_types: vec!["suv".to_string()], ..Default::default()},
        vec!["car-2"]; "#2 Car type")]
    #[test_case(CarFilters {suppliers: vec!["Avis".to_string(), "Sixt".to_string()], ..Default::default()},
        vec!["car-3", "car-4"]; "#3 Car supplier")]
    #[test_case(CarFilters {transmission: vec![Transmission::Manual], ..Default::default()},
        vec![]; "#4 Car transmission")]
    fn test_car_filters(filters: CarFilters, expected_ids: Vec<&str>) {
        let cars = mock_data::cars();
        let view = apply(&cars, &filters, None::<Sort<CarSortKey>>);
        let view_ids: Vec<&str> = view.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(view_ids, expected_ids);
    }

    #[test]
    fn test_hotel_and_car_sorting() {
        let hotels = mock_data::hotels();
        let by_rating = apply(
            &hotels,
            &HotelFilters::default(),
            Some(Sort::desc(HotelSortKey::Rating)),
        );
        assert_eq!(by_rating[0].id, "hotel-3");

        let cars = mock_data::cars();
        let by_seats = apply(&cars, &CarFilters::default(), Some(Sort::desc(CarSortKey::Seats)));
        // car-1 and car-3 both seat five and keep their order
        let seat_ids: Vec<&str> = by_seats.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(seat_ids, vec!["car-2", "car-1", "car-3", "car-4"]);
    }

    #[test]
    fn test_filter_merge_and_active_dimensions() {
        let filters = FlightFilters::default().merge(FlightFiltersPatch {
            max_price: Some(Some(500.0)),
            stops: Some(StopsFilter::NonstopOnly),
            ..Default::default()
        });
        assert_eq!(filters.max_price, Some(500.0));
        assert_eq!(filters.stops, StopsFilter::NonstopOnly);
        // Should preserve existing values
        assert!(filters.airlines.is_empty());
        assert_eq!(filters.active_dimensions(), vec!["stops", "max_price"]);

        let bar = flight_filter_bar();
        assert_eq!(bar.len(), 8);
        assert_eq!(bar[0].1, vec!["Any number of stops", "Nonstop only", "1 stop or fewer", "2 stops or fewer"]);
    }
}
