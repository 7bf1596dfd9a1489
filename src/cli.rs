use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::filter::{
    parse_sort, AirlineSelector, CarFiltersPatch, CarSortKey, DurationBracket, FilterOption,
    FlightFiltersPatch, FlightSortKey, HotelFiltersPatch, HotelSortKey, PriceBracket, Sort,
    StopsFilter,
};
use crate::model::Transmission;
use crate::search_params::{
    CabinClass, CarParamsPatch, FlightParamsPatch, HotelParamsPatch, SortBy, TripType,
};

#[derive(Parser)]
#[command(name = "travel-search")]
#[command(about = "Search flights, hotels and rental cars", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Call the live API instead of the built-in demo data
    #[arg(long, global = true)]
    pub live: bool,

    /// Directory for stored preferences and recent searches
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search flights between two airports
    Flights(FlightArgs),

    /// Search hotels at a destination
    Hotels(HotelArgs),

    /// Search rental cars at a pickup location
    Cars(CarArgs),

    /// Look up airports by name or code
    Airports {
        #[arg(required = true)]
        query: String,
    },

    /// List popular destinations, or search one a week from today
    Popular {
        /// Destination code, e.g. PAR
        code: Option<String>,
    },

    /// Show or clear recent flight searches
    Recent {
        #[arg(long)]
        clear: bool,

        /// Run the recent search at this position (1 = newest)
        #[arg(long)]
        rerun: Option<usize>,
    },

    /// Show or change stored preferences
    Prefs {
        /// light/dark
        #[arg(long)]
        theme: Option<String>,

        #[arg(long)]
        currency: Option<String>,

        #[arg(long)]
        page_size: Option<usize>,

        /// Show or hide a result column
        #[arg(long = "toggle-column")]
        toggle_columns: Vec<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct FlightArgs {
    /// Origin airport code (sky id)
    #[arg(long, required = true)]
    pub origin: String,

    /// Destination airport code (sky id)
    #[arg(long, required = true)]
    pub destination: String,

    /// Departure date (YYYY-MM-DD)
    #[arg(long, required = true)]
    pub date: String,

    /// Return date; makes the search a round trip
    #[arg(long)]
    pub return_date: Option<String>,

    #[arg(long, default_value = "1")]
    pub adults: u32,

    #[arg(long, default_value = "0")]
    pub children: u32,

    #[arg(long, default_value = "0")]
    pub infants: u32,

    /// economy/premium_economy/business/first
    #[arg(long)]
    pub cabin: Option<String>,

    /// Stops filter label, e.g. "Nonstop only"
    #[arg(long)]
    pub stops: Option<String>,

    /// Alliance label or carrier code; repeatable
    #[arg(long = "airline")]
    pub airlines: Vec<String>,

    /// Price bracket label, e.g. "$200-$500"
    #[arg(long)]
    pub price: Option<String>,

    /// Duration bracket label, e.g. "4-8h"
    #[arg(long)]
    pub duration: Option<String>,

    #[arg(long)]
    pub max_price: Option<f64>,

    /// Sort as field[:asc|desc] or an upstream sort name (price_low, best, ...)
    #[arg(long)]
    pub sort: Option<String>,

    #[arg(long, default_value = "1")]
    pub page: usize,
}

#[derive(Args, Debug, Clone)]
pub struct HotelArgs {
    #[arg(long, required = true)]
    pub destination: String,

    #[arg(long, required = true)]
    pub check_in: String,

    #[arg(long, required = true)]
    pub check_out: String,

    #[arg(long, default_value = "1")]
    pub guests: u32,

    #[arg(long, default_value = "1")]
    pub rooms: u32,

    #[arg(long)]
    pub max_price: Option<f64>,

    #[arg(long)]
    pub min_rating: Option<f64>,

    #[arg(long = "stars")]
    pub stars: Vec<u8>,

    #[arg(long = "amenity")]
    pub amenities: Vec<String>,

    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CarArgs {
    #[arg(long, required = true)]
    pub location: String,

    #[arg(long, required = true)]
    pub pickup: String,

    #[arg(long, required = true)]
    pub dropoff: String,

    #[arg(long)]
    pub max_price: Option<f64>,

    #[arg(long = "car-type")]
    pub car_types: Vec<String>,

    #[arg(long = "supplier")]
    pub suppliers: Vec<String>,

    /// manual/automatic
    #[arg(long)]
    pub transmission: Option<String>,

    #[arg(long)]
    pub sort: Option<String>,
}

// "price", "price:desc" or "rating:asc"
fn split_sort(value: &str) -> (&str, &str) {
    value.split_once(':').unwrap_or((value, "asc"))
}

impl FlightArgs {
    pub fn params_patch(&self) -> FlightParamsPatch {
        let return_date = self.return_date.clone().filter(|d| !d.trim().is_empty());
        let trip_type = if return_date.is_some() {
            TripType::RoundTrip
        } else {
            TripType::OneWay
        };

        FlightParamsPatch {
            date: Some(self.date.trim().to_string()),
            return_date: Some(return_date),
            adults: Some(self.adults),
            children: Some(self.children),
            infants: Some(self.infants),
            cabin_class: self.cabin.as_deref().and_then(CabinClass::parse),
            sort_by: self.sort.as_deref().and_then(SortBy::parse),
            trip_type: Some(trip_type),
            ..Default::default()
        }
    }

    pub fn filters_patch(&self) -> FlightFiltersPatch {
        FlightFiltersPatch {
            stops: self.stops.as_deref().map(StopsFilter::from_label),
            airlines: Some(
                self.airlines
                    .iter()
                    .filter_map(|value| AirlineSelector::parse(value))
                    .collect(),
            ),
            price: self.price.as_deref().map(PriceBracket::from_label),
            duration: self.duration.as_deref().map(DurationBracket::from_label),
            max_price: Some(self.max_price),
            ..Default::default()
        }
    }

    // Upstream sort names map to their view sort, anything else is field[:direction]
    pub fn view_sort(&self) -> Option<Sort<FlightSortKey>> {
        let value = self.sort.as_deref()?;
        if let Some(sort_by) = SortBy::parse(value) {
            return Some(Sort::<FlightSortKey>::from_sort_by(sort_by));
        }
        let (field, direction) = split_sort(value);
        parse_sort(field, direction, FlightSortKey::from_field)
    }
}

impl HotelArgs {
    pub fn params_patch(&self) -> HotelParamsPatch {
        HotelParamsPatch {
            destination: Some(self.destination.trim().to_string()),
            check_in: Some(self.check_in.trim().to_string()),
            check_out: Some(self.check_out.trim().to_string()),
            guests: Some(self.guests),
            rooms: Some(self.rooms),
        }
    }

    pub fn filters_patch(&self) -> HotelFiltersPatch {
        HotelFiltersPatch {
            max_price: Some(self.max_price),
            min_rating: Some(self.min_rating),
            stars: Some(self.stars.clone()),
            amenities: Some(self.amenities.clone()),
        }
    }

    pub fn view_sort(&self) -> Option<Sort<HotelSortKey>> {
        let (field, direction) = split_sort(self.sort.as_deref()?);
        parse_sort(field, direction, HotelSortKey::from_field)
    }
}

impl CarArgs {
    pub fn params_patch(&self) -> CarParamsPatch {
        CarParamsPatch {
            location: Some(self.location.trim().to_string()),
            pickup_date: Some(self.pickup.trim().to_string()),
            dropoff_date: Some(self.dropoff.trim().to_string()),
            ..Default::default()
        }
    }

    pub fn filters_patch(&self) -> CarFiltersPatch {
        CarFiltersPatch {
            max_price: Some(self.max_price),
            car_types: Some(self.car_types.clone()),
            suppliers: Some(self.suppliers.clone()),
            transmission: Some(
                self.transmission
                    .as_deref()
                    .and_then(Transmission::parse)
                    .into_iter()
                    .collect(),
            ),
        }
    }

    pub fn view_sort(&self) -> Option<Sort<CarSortKey>> {
        let (field, direction) = split_sort(self.sort.as_deref()?);
        parse_sort(field, direction, CarSortKey::from_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SortDirection;

    fn flight_args(extra: &[&str]) -> FlightArgs {
        let mut argv = vec![
            "travel-search",
            "flights",
            "--origin",
            "JFK",
            "--destination",
            "LAX",
            "--date",
            "2024-01-15",
        ];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Flights(args) => args,
            _ => panic!("expected flights command"),
        }
    }

    #[test]
    fn test_flight_args_to_patches() {
        let args = flight_args(&[
            "--stops",
            "Nonstop only",
            "--airline",
            "Oneworld",
            "--airline",
            "ua",
            "--max-price",
            "400",
            "--cabin",
            "business",
        ]);

        let params = args.params_patch();
        assert_eq!(params.trip_type, Some(TripType::OneWay));
        assert_eq!(params.return_date, Some(None));
        assert_eq!(params.cabin_class, Some(CabinClass::Business));

        let filters = args.filters_patch();
        assert_eq!(filters.stops, Some(StopsFilter::NonstopOnly));
        assert_eq!(filters.max_price, Some(Some(400.0)));
        assert_eq!(filters.airlines.as_ref().map(Vec::len), Some(2));
        assert_eq!(
            filters.airlines.unwrap()[1],
            AirlineSelector::Carrier("UA".to_string())
        );
    }

    #[test]
    fn test_round_trip_when_return_date_given() {
        let args = flight_args(&["--return-date", "2024-01-22"]);
        let params = args.params_patch();
        assert_eq!(params.trip_type, Some(TripType::RoundTrip));
        assert_eq!(params.return_date, Some(Some("2024-01-22".to_string())));
    }

    #[test]
    fn test_sort_arguments() {
        assert_eq!(
            flight_args(&["--sort", "price_high"]).view_sort(),
            Some(Sort::desc(FlightSortKey::Price))
        );
        assert_eq!(
            flight_args(&["--sort", "duration:desc"]).view_sort(),
            Some(Sort::desc(FlightSortKey::Duration))
        );
        assert_eq!(flight_args(&["--sort", "legroom"]).view_sort(), None);
        assert_eq!(flight_args(&[]).view_sort(), None);

        let sort = flight_args(&["--sort", "stops:sideways"]).view_sort().unwrap();
        assert_eq!(sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn test_hotel_and_car_args() {
        let cli = Cli::try_parse_from([
            "travel-search",
            "hotels",
            "--destination",
            "New York",
            "--check-in",
            "2024-01-15",
            "--check-out",
            "2024-01-18",
            "--stars",
            "5",
            "--amenity",
            "Pool",
            "--sort",
            "rating:desc",
        ])
        .unwrap();
        let Commands::Hotels(args) = cli.command else {
            panic!("expected hotels command");
        };
        assert_eq!(args.filters_patch().stars, Some(vec![5]));
        assert_eq!(args.view_sort(), Some(Sort::desc(HotelSortKey::Rating)));

        let cli = Cli::try_parse_from([
            "travel-search",
            "cars",
            "--location",
            "LAX",
            "--pickup",
            "2024-01-15",
            "--dropoff",
            "2024-01-18",
            "--transmission",
            "manual",
            "--live",
        ])
        .unwrap();
        assert!(cli.live);
        let Commands::Cars(args) = cli.command else {
            panic!("expected cars command");
        };
        assert_eq!(
            args.filters_patch().transmission,
            Some(vec![Transmission::Manual])
        );
        assert_eq!(args.params_patch().location.as_deref(), Some("LAX"));
    }

    #[test]
    fn test_popular_command() {
        let cli = Cli::try_parse_from(["travel-search", "popular", "bkk"]).unwrap();
        assert!(matches!(cli.command, Commands::Popular { code: Some(ref code) } if code == "bkk"));

        let cli = Cli::try_parse_from(["travel-search", "popular"]).unwrap();
        assert!(matches!(cli.command, Commands::Popular { code: None }));
    }

    #[test]
    fn test_missing_required_flag_is_rejected() {
        assert!(Cli::try_parse_from(["travel-search", "flights", "--origin", "JFK"]).is_err());
    }
}
