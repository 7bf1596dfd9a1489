// Result entities returned by the fetch layer
// Field names follow the upstream JSON (camelCase) so responses deserialize directly

use serde::{Deserialize, Serialize};

// Common accessors used by the view and the filter engine
pub trait ResultItem {
    fn id(&self) -> &str;
    fn raw_price(&self) -> f64;
}

// Airport suggestions
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Airport {
    pub sky_id: String,
    pub entity_id: String,
    pub presentation: AirportPresentation,
    pub navigation: AirportNavigation,
}

impl Airport {
    // Minimal airport for a code typed or stored outside the suggestion list
    pub fn from_ids(sky_id: &str, entity_id: &str, title: &str) -> Self {
        Self {
            sky_id: sky_id.to_string(),
            entity_id: entity_id.to_string(),
            presentation: AirportPresentation {
                title: title.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AirportPresentation {
    pub title: String,
    pub suggestion_title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AirportNavigation {
    pub entity_id: String,
    pub entity_type: String,
    pub localized_name: String,
    pub relevant_flight_params: RelevantFlightParams,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelevantFlightParams {
    pub sky_id: String,
    pub entity_id: String,
    pub flight_place_type: String,
    pub localized_name: String,
}

// Flights
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Place {
    pub sky_id: String,
    pub name: String,
    pub display_code: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Carrier {
    pub id: String,
    pub name: String,
    pub alternate_id: String,
    pub alliance_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub origin: Place,
    pub destination: Place,
    pub departure: String,
    pub arrival: String,
    pub duration_in_minutes: u32,
    pub flight_number: String,
    pub marketing_carrier: Carrier,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Leg {
    pub id: String,
    pub origin: Place,
    pub destination: Place,
    pub duration_in_minutes: u32,
    pub stop_count: u32,
    pub departure: String,
    pub arrival: String,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlightPrice {
    pub raw: f64,
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FarePolicy {
    pub is_change_allowed: bool,
    pub is_partially_changeable: bool,
    pub is_cancellation_allowed: bool,
    pub is_partially_refundable: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlightItinerary {
    pub id: String,
    pub price: FlightPrice,
    pub legs: Vec<Leg>,
    pub is_self_transfer: bool,
    pub is_protected_self_transfer: bool,
    pub fare_policy: FarePolicy,
    pub tags: Vec<String>,
    pub is_mash_up: bool,
    pub has_flexible_options: bool,
    pub score: f64,
}

impl FlightItinerary {
    // Outbound leg; every flight predicate and column reads from it
    pub fn first_leg(&self) -> Option<&Leg> {
        self.legs.first()
    }

    pub fn first_segment(&self) -> Option<&Segment> {
        self.first_leg().and_then(|leg| leg.segments.first())
    }
}

impl ResultItem for FlightItinerary {
    fn id(&self) -> &str {
        &self.id
    }

    fn raw_price(&self) -> f64 {
        self.price.raw
    }
}

// Hotels
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HotelPrice {
    pub amount: f64,
    pub currency: String,
    pub formatted: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HotelLocation {
    pub name: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Hotel {
    pub id: String,
    pub name: String,
    pub stars: u8,
    pub rating: f64,
    pub review_count: u32,
    pub price: HotelPrice,
    pub location: HotelLocation,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
}

impl ResultItem for Hotel {
    fn id(&self) -> &str {
        &self.id
    }

    fn raw_price(&self) -> f64 {
        self.price.amount
    }
}

// Car rentals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Manual,
    #[default]
    Automatic,
}

impl Transmission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Manual => "manual",
            Transmission::Automatic => "automatic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => Some(Transmission::Manual),
            "automatic" | "auto" => Some(Transmission::Automatic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CarPrice {
    pub total: f64,
    pub currency: String,
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CarRental {
    pub id: String,
    pub supplier: String,
    pub car_type: String,
    pub car_class: String,
    pub doors: u8,
    pub seats: u8,
    pub bags: u8,
    pub transmission: Transmission,
    pub air_conditioning: bool,
    pub price: CarPrice,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub image: String,
}

impl ResultItem for CarRental {
    fn id(&self) -> &str {
        &self.id
    }

    fn raw_price(&self) -> f64 {
        self.price.total
    }
}

// Featured destinations with a guide fare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Up,
    Down,
    #[default]
    Stable,
}

impl PriceTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTrend::Up => "up",
            PriceTrend::Down => "down",
            PriceTrend::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PopularDestination {
    pub code: String,
    pub city: String,
    pub country: String,
    pub price: f64,
    pub trend: PriceTrend,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_itinerary_from_upstream_json() {
        let json = r#"{
            "id": "flight-9",
            "price": { "raw": 412.5, "formatted": "$413" },
            "legs": [{
                "id": "leg-9",
                "origin": { "skyId": "JFK", "name": "New York John F. Kennedy", "displayCode": "JFK" },
                "destination": { "skyId": "LHR", "name": "London Heathrow", "displayCode": "LHR" },
                "durationInMinutes": 415,
                "stopCount": 0,
                "departure": "2024-01-15T18:00:00",
                "arrival": "2024-01-16T06:55:00",
                "segments": [{
                    "id": "seg-9",
                    "flightNumber": "BA178",
                    "durationInMinutes": 415,
                    "marketingCarrier": { "id": "BA", "name": "British Airways", "alternateId": "BA", "allianceId": "oneworld" }
                }]
            }],
            "tags": ["cheapest"],
            "score": 0.9
        }"#;

        let itinerary: FlightItinerary = serde_json::from_str(json).unwrap();
        assert_eq!(itinerary.id(), "flight-9");
        assert_eq!(itinerary.raw_price(), 412.5);
        assert_eq!(itinerary.first_leg().unwrap().stop_count, 0);
        assert_eq!(
            itinerary.first_segment().unwrap().marketing_carrier.alliance_id,
            "oneworld"
        );
        // Missing fields fall back to defaults
        assert!(!itinerary.fare_policy.is_change_allowed);
        assert!(!itinerary.is_mash_up);
    }

    #[test]
    fn test_car_transmission_serde() {
        let car: CarRental =
            serde_json::from_str(r#"{"id": "car-x", "transmission": "manual"}"#).unwrap();
        assert_eq!(car.transmission, Transmission::Manual);
        assert_eq!(Transmission::parse(" Automatic "), Some(Transmission::Automatic));
        assert_eq!(Transmission::parse("cvt"), None);
    }

    #[test]
    fn test_itinerary_without_legs() {
        let itinerary = FlightItinerary::default();
        assert!(itinerary.first_leg().is_none());
        assert!(itinerary.first_segment().is_none());
    }
}
