// Search criteria per vertical, their partial-update patches and the
// validation that gates a fetch

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid date for {field}: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("Unknown destination: {0}")]
    UnknownDestination(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::PremiumEconomy => "premium_economy",
            CabinClass::Business => "business",
            CabinClass::First => "first",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "economy" => Some(CabinClass::Economy),
            "premium_economy" | "premium-economy" => Some(CabinClass::PremiumEconomy),
            "business" => Some(CabinClass::Business),
            "first" => Some(CabinClass::First),
            _ => None,
        }
    }
}

// Upstream ordering hint sent with the flight query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Best,
    PriceHigh,
    PriceLow,
    Duration,
    OutboundTakeOffTime,
    OutboundLandingTime,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Best => "best",
            SortBy::PriceHigh => "price_high",
            SortBy::PriceLow => "price_low",
            SortBy::Duration => "duration",
            SortBy::OutboundTakeOffTime => "outbound_take_off_time",
            SortBy::OutboundLandingTime => "outbound_landing_time",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "best" => Some(SortBy::Best),
            "price_high" => Some(SortBy::PriceHigh),
            "price_low" => Some(SortBy::PriceLow),
            "duration" => Some(SortBy::Duration),
            "outbound_take_off_time" => Some(SortBy::OutboundTakeOffTime),
            "outbound_landing_time" => Some(SortBy::OutboundLandingTime),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum TripType {
    #[serde(rename = "one-way")]
    OneWay,
    #[default]
    #[serde(rename = "round-trip")]
    RoundTrip,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "one-way",
            TripType::RoundTrip => "round-trip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchParams {
    pub origin_sky_id: String,
    pub destination_sky_id: String,
    pub origin_entity_id: String,
    pub destination_entity_id: String,
    pub date: String,
    pub return_date: Option<String>,
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
    pub cabin_class: CabinClass,
    pub currency: String,
    pub market: String,
    pub country_code: String,
    pub sort_by: SortBy,
    pub trip_type: TripType,
}

impl Default for FlightSearchParams {
    fn default() -> Self {
        Self {
            origin_sky_id: String::new(),
            destination_sky_id: String::new(),
            origin_entity_id: String::new(),
            destination_entity_id: String::new(),
            date: String::new(),
            return_date: None,
            adults: 1,
            children: 0,
            infants: 0,
            cabin_class: CabinClass::Economy,
            currency: "USD".to_string(),
            market: "US".to_string(),
            country_code: "US".to_string(),
            sort_by: SortBy::Best,
            trip_type: TripType::RoundTrip,
        }
    }
}

// Partial update for FlightSearchParams; `None` keeps the current value.
// `return_date: Some(None)` clears the return date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightParamsPatch {
    pub origin_sky_id: Option<String>,
    pub destination_sky_id: Option<String>,
    pub origin_entity_id: Option<String>,
    pub destination_entity_id: Option<String>,
    pub date: Option<String>,
    pub return_date: Option<Option<String>>,
    pub adults: Option<u32>,
    pub children: Option<u32>,
    pub infants: Option<u32>,
    pub cabin_class: Option<CabinClass>,
    pub currency: Option<String>,
    pub market: Option<String>,
    pub country_code: Option<String>,
    pub sort_by: Option<SortBy>,
    pub trip_type: Option<TripType>,
}

fn merge<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

impl FlightSearchParams {
    pub fn merge(mut self, patch: FlightParamsPatch) -> Self {
        merge(&mut self.origin_sky_id, patch.origin_sky_id);
        merge(&mut self.destination_sky_id, patch.destination_sky_id);
        merge(&mut self.origin_entity_id, patch.origin_entity_id);
        merge(&mut self.destination_entity_id, patch.destination_entity_id);
        merge(&mut self.date, patch.date);
        merge(&mut self.return_date, patch.return_date);
        merge(&mut self.adults, patch.adults);
        merge(&mut self.children, patch.children);
        merge(&mut self.infants, patch.infants);
        merge(&mut self.cabin_class, patch.cabin_class);
        merge(&mut self.currency, patch.currency);
        merge(&mut self.market, patch.market);
        merge(&mut self.country_code, patch.country_code);
        merge(&mut self.sort_by, patch.sort_by);
        merge(&mut self.trip_type, patch.trip_type);
        self
    }

    // Return date only travels with round trips
    pub fn effective_return_date(&self) -> Option<&str> {
        match self.trip_type {
            TripType::RoundTrip => self.return_date.as_deref().filter(|d| !d.is_empty()),
            TripType::OneWay => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        require(&self.origin_sky_id, "origin")?;
        require(&self.destination_sky_id, "destination")?;
        require_date(&self.date, "date")?;
        if let Some(return_date) = self.effective_return_date() {
            require_date(return_date, "return date")?;
        }
        Ok(())
    }

    // Query string for the flight search endpoint. Optional values are only sent
    // when set, and `children` goes out as `childrens` to match the upstream API.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("originSkyId", self.origin_sky_id.clone()),
            ("destinationSkyId", self.destination_sky_id.clone()),
            ("originEntityId", self.origin_entity_id.clone()),
            ("destinationEntityId", self.destination_entity_id.clone()),
            ("date", self.date.clone()),
        ];

        if let Some(return_date) = self.effective_return_date() {
            pairs.push(("returnDate", return_date.to_string()));
        }
        for (key, count) in [
            ("adults", self.adults),
            ("childrens", self.children),
            ("infants", self.infants),
        ] {
            if count > 0 {
                pairs.push((key, count.to_string()));
            }
        }
        pairs.push(("cabinClass", self.cabin_class.as_str().to_string()));
        for (key, value) in [
            ("currency", &self.currency),
            ("market", &self.market),
            ("countryCode", &self.country_code),
        ] {
            if !value.is_empty() {
                pairs.push((key, value.clone()));
            }
        }
        pairs.push(("sortBy", self.sort_by.as_str().to_string()));

        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchParams {
    pub destination: String,
    pub check_in: String,
    pub check_out: String,
    pub guests: u32,
    pub rooms: u32,
}

impl Default for HotelSearchParams {
    fn default() -> Self {
        Self {
            destination: String::new(),
            check_in: String::new(),
            check_out: String::new(),
            guests: 1,
            rooms: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelParamsPatch {
    pub destination: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub guests: Option<u32>,
    pub rooms: Option<u32>,
}

// The subset of hotel params the data source accepts
#[derive(Debug, Clone, PartialEq)]
pub struct HotelQuery {
    pub destination: String,
    pub check_in: String,
    pub check_out: String,
}

impl HotelSearchParams {
    pub fn merge(mut self, patch: HotelParamsPatch) -> Self {
        merge(&mut self.destination, patch.destination);
        merge(&mut self.check_in, patch.check_in);
        merge(&mut self.check_out, patch.check_out);
        merge(&mut self.guests, patch.guests);
        merge(&mut self.rooms, patch.rooms);
        self
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<HotelQuery, SearchError> {
        require(&self.destination, "destination")?;
        require_date(&self.check_in, "check-in")?;
        require_date(&self.check_out, "check-out")?;
        Ok(HotelQuery {
            destination: self.destination.clone(),
            check_in: self.check_in.clone(),
            check_out: self.check_out.clone(),
        })
    }
}

impl HotelQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("destination", self.destination.clone()),
            ("checkIn", self.check_in.clone()),
            ("checkOut", self.check_out.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSearchParams {
    pub location: String,
    pub pickup_date: String,
    pub dropoff_date: String,
    pub pickup_time: String,
    pub dropoff_time: String,
}

impl Default for CarSearchParams {
    fn default() -> Self {
        Self {
            location: String::new(),
            pickup_date: String::new(),
            dropoff_date: String::new(),
            pickup_time: "10:00".to_string(),
            dropoff_time: "10:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarParamsPatch {
    pub location: Option<String>,
    pub pickup_date: Option<String>,
    pub dropoff_date: Option<String>,
    pub pickup_time: Option<String>,
    pub dropoff_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarQuery {
    pub location: String,
    pub pickup_date: String,
    pub dropoff_date: String,
}

impl CarSearchParams {
    pub fn merge(mut self, patch: CarParamsPatch) -> Self {
        merge(&mut self.location, patch.location);
        merge(&mut self.pickup_date, patch.pickup_date);
        merge(&mut self.dropoff_date, patch.dropoff_date);
        merge(&mut self.pickup_time, patch.pickup_time);
        merge(&mut self.dropoff_time, patch.dropoff_time);
        self
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<CarQuery, SearchError> {
        require(&self.location, "location")?;
        require_date(&self.pickup_date, "pickup date")?;
        require_date(&self.dropoff_date, "dropoff date")?;
        Ok(CarQuery {
            location: self.location.clone(),
            pickup_date: self.pickup_date.clone(),
            dropoff_date: self.dropoff_date.clone(),
        })
    }
}

impl CarQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("location", self.location.clone()),
            ("pickupDate", self.pickup_date.clone()),
            ("dropoffDate", self.dropoff_date.clone()),
        ]
    }
}

fn require(value: &str, field: &'static str) -> Result<(), SearchError> {
    if value.trim().is_empty() {
        return Err(SearchError::MissingField(field));
    }
    Ok(())
}

fn require_date(value: &str, field: &'static str) -> Result<NaiveDate, SearchError> {
    require(value, field)?;
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| SearchError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
