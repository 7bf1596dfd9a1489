// Built-in dataset served by the mock fetcher and used as the fallback set
// when the live data source fails

use crate::model::{
    Airport, AirportNavigation, AirportPresentation, CarPrice, CarRental, Carrier, Coordinates,
    FarePolicy, FlightItinerary, FlightPrice, Hotel, HotelLocation, HotelPrice, Leg, Place,
    PopularDestination, PriceTrend, RelevantFlightParams, Segment, Transmission,
};

fn airport(sky_id: &str, entity_id: &str, title: &str, code: &str, subtitle: &str, kind: &str) -> Airport {
    let suggestion_title = if kind == "CITY" {
        format!("{} (Any)", title)
    } else {
        format!("{} ({})", title, code)
    };

    Airport {
        sky_id: sky_id.to_string(),
        entity_id: entity_id.to_string(),
        presentation: AirportPresentation {
            title: title.to_string(),
            suggestion_title,
            subtitle: subtitle.to_string(),
        },
        navigation: AirportNavigation {
            entity_id: entity_id.to_string(),
            entity_type: kind.to_string(),
            localized_name: title.to_string(),
            relevant_flight_params: RelevantFlightParams {
                sky_id: sky_id.to_string(),
                entity_id: entity_id.to_string(),
                flight_place_type: kind.to_string(),
                localized_name: title.to_string(),
            },
        },
    }
}

pub fn airports() -> Vec<Airport> {
    vec![
        airport("NYCA", "27537542", "New York", "NYCA", "United States", "CITY"),
        airport("JFK", "95565058", "New York John F. Kennedy", "JFK", "United States", "AIRPORT"),
        airport("LAX", "95565054", "Los Angeles International", "LAX", "United States", "AIRPORT"),
        airport("LHR", "95565050", "London Heathrow", "LHR", "United Kingdom", "AIRPORT"),
        airport("CDG", "95565045", "Paris Charles de Gaulle", "CDG", "France", "AIRPORT"),
    ]
}

fn place(code: &str, name: &str) -> Place {
    Place {
        sky_id: code.to_string(),
        name: name.to_string(),
        display_code: code.to_string(),
    }
}

fn carrier(id: &str, name: &str, alliance_id: &str) -> Carrier {
    Carrier {
        id: id.to_string(),
        name: name.to_string(),
        alternate_id: id.to_string(),
        alliance_id: alliance_id.to_string(),
    }
}

const JFK: (&str, &str) = ("JFK", "New York John F. Kennedy");
const LAX: (&str, &str) = ("LAX", "Los Angeles International");
const ORD: (&str, &str) = ("ORD", "Chicago O'Hare");

#[allow(clippy::too_many_arguments)]
fn segment(
    id: &str,
    from: (&str, &str),
    to: (&str, &str),
    departure: &str,
    arrival: &str,
    minutes: u32,
    flight_number: &str,
    marketing_carrier: Carrier,
) -> Segment {
    Segment {
        id: id.to_string(),
        origin: place(from.0, from.1),
        destination: place(to.0, to.1),
        departure: departure.to_string(),
        arrival: arrival.to_string(),
        duration_in_minutes: minutes,
        flight_number: flight_number.to_string(),
        marketing_carrier,
    }
}

pub fn flights() -> Vec<FlightItinerary> {
    let american = carrier("AA", "American Airlines", "oneworld");
    let united = carrier("UA", "United Airlines", "star_alliance");

    vec![
        FlightItinerary {
            id: "flight-1".to_string(),
            price: FlightPrice {
                raw: 299.0,
                formatted: "$299".to_string(),
            },
            legs: vec![Leg {
                id: "leg-1".to_string(),
                origin: place(JFK.0, JFK.1),
                destination: place(LAX.0, LAX.1),
                duration_in_minutes: 360,
                stop_count: 0,
                departure: "2024-01-15T08:00:00".to_string(),
                arrival: "2024-01-15T11:00:00".to_string(),
                segments: vec![segment(
                    "segment-1",
                    JFK,
                    LAX,
                    "2024-01-15T08:00:00",
                    "2024-01-15T11:00:00",
                    360,
                    "AA123",
                    american,
                )],
            }],
            is_self_transfer: false,
            is_protected_self_transfer: false,
            fare_policy: FarePolicy {
                is_change_allowed: true,
                is_partially_changeable: false,
                is_cancellation_allowed: true,
                is_partially_refundable: false,
            },
            tags: vec!["shortest".to_string()],
            is_mash_up: false,
            has_flexible_options: true,
            score: 0.95,
        },
        FlightItinerary {
            id: "flight-2".to_string(),
            price: FlightPrice {
                raw: 249.0,
                formatted: "$249".to_string(),
            },
            legs: vec![Leg {
                id: "leg-2".to_string(),
                origin: place(JFK.0, JFK.1),
                destination: place(LAX.0, LAX.1),
                duration_in_minutes: 420,
                stop_count: 1,
                departure: "2024-01-15T06:30:00".to_string(),
                arrival: "2024-01-15T13:30:00".to_string(),
                segments: vec![
                    segment(
                        "segment-2a",
                        JFK,
                        ORD,
                        "2024-01-15T06:30:00",
                        "2024-01-15T08:00:00",
                        150,
                        "UA456",
                        united.clone(),
                    ),
                    segment(
                        "segment-2b",
                        ORD,
                        LAX,
                        "2024-01-15T10:00:00",
                        "2024-01-15T13:30:00",
                        270,
                        "UA789",
                        united,
                    ),
                ],
            }],
            is_self_transfer: false,
            is_protected_self_transfer: false,
            fare_policy: FarePolicy {
                is_change_allowed: true,
                is_partially_changeable: true,
                is_cancellation_allowed: false,
                is_partially_refundable: true,
            },
            tags: vec!["cheapest".to_string()],
            is_mash_up: false,
            has_flexible_options: false,
            score: 0.87,
        },
    ]
}

#[allow(clippy::too_many_arguments)]
fn hotel(
    id: &str,
    name: &str,
    stars: u8,
    rating: f64,
    review_count: u32,
    amount: f64,
    location: (&str, f64, f64),
    amenities: &[&str],
) -> Hotel {
    Hotel {
        id: id.to_string(),
        name: name.to_string(),
        stars,
        rating,
        review_count,
        price: HotelPrice {
            amount,
            currency: "USD".to_string(),
            formatted: format!("${}/night", amount),
        },
        location: HotelLocation {
            name: location.0.to_string(),
            coordinates: Coordinates {
                lat: location.1,
                lng: location.2,
            },
        },
        images: Vec::new(),
        amenities: amenities.iter().map(|a| a.to_string()).collect(),
    }
}

pub fn hotels() -> Vec<Hotel> {
    vec![
        hotel(
            "hotel-1",
            "Grand Plaza Hotel",
            5,
            4.5,
            1250,
            299.0,
            ("Downtown Manhattan", 40.7589, -73.9851),
            &["WiFi", "Pool", "Gym", "Spa", "Restaurant"],
        ),
        hotel(
            "hotel-2",
            "Boutique Inn",
            4,
            4.2,
            890,
            189.0,
            ("SoHo", 40.723, -74.003),
            &["WiFi", "Restaurant", "Bar"],
        ),
        hotel(
            "hotel-3",
            "Seaside Resort",
            5,
            4.8,
            2100,
            399.0,
            ("Santa Monica Beach", 34.0195, -118.4912),
            &["WiFi", "Pool", "Beach Access", "Spa", "Restaurant"],
        ),
        hotel(
            "hotel-4",
            "London Royal Suites",
            5,
            4.7,
            1750,
            350.0,
            ("Central London", 51.5074, -0.1278),
            &["WiFi", "Gym", "Bar", "Restaurant"],
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn car(
    id: &str,
    supplier: &str,
    car_type: &str,
    car_class: &str,
    doors: u8,
    seats: u8,
    bags: u8,
    total: f64,
    location: &str,
) -> CarRental {
    CarRental {
        id: id.to_string(),
        supplier: supplier.to_string(),
        car_type: car_type.to_string(),
        car_class: car_class.to_string(),
        doors,
        seats,
        bags,
        transmission: Transmission::Automatic,
        air_conditioning: true,
        price: CarPrice {
            total,
            currency: "USD".to_string(),
            formatted: format!("${}/day", total),
        },
        pickup_location: location.to_string(),
        dropoff_location: location.to_string(),
        image: String::new(),
    }
}

pub fn cars() -> Vec<CarRental> {
    vec![
        car("car-1", "Enterprise", "Economy", "Compact", 4, 5, 2, 45.0, "JFK Airport"),
        car("car-2", "Hertz", "SUV", "Full Size", 4, 7, 4, 89.0, "LAX Airport"),
        car("car-3", "Avis", "Luxury", "Sedan", 4, 5, 3, 120.0, "London Heathrow"),
        car("car-4", "Sixt", "Convertible", "Sports", 2, 2, 1, 150.0, "Paris Charles de Gaulle"),
    ]
}

// Popular destinations are searched from this airport
pub fn popular_origin() -> Airport {
    Airport::from_ids("JFK", "95565058", "JFK New York")
}

fn destination(code: &str, city: &str, country: &str, price: f64, trend: PriceTrend) -> PopularDestination {
    PopularDestination {
        code: code.to_string(),
        city: city.to_string(),
        country: country.to_string(),
        price,
        trend,
    }
}

pub fn popular_destinations() -> Vec<PopularDestination> {
    vec![
        destination("PAR", "Paris", "France", 549.0, PriceTrend::Stable),
        destination("MIL", "Milan", "Italy", 579.0, PriceTrend::Up),
        destination("SIN", "Singapore", "Singapore", 699.0, PriceTrend::Up),
        destination("BKK", "Bangkok", "Thailand", 499.0, PriceTrend::Down),
        destination("NYC", "New York", "USA", 799.0, PriceTrend::Up),
        destination("ICN", "Seoul", "South Korea", 599.0, PriceTrend::Up),
        destination("SHA", "Shanghai", "China", 649.0, PriceTrend::Stable),
        destination("LON", "London", "UK", 599.0, PriceTrend::Up),
        destination("DXB", "Dubai", "UAE", 699.0, PriceTrend::Up),
    ]
}

pub fn popular_destination(code: &str) -> Option<PopularDestination> {
    let code = code.trim();
    popular_destinations()
        .into_iter()
        .find(|destination| destination.code.eq_ignore_ascii_case(code))
}
