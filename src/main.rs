use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::future;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use travel_search::cli::{CarArgs, Cli, Commands, FlightArgs, HotelArgs};
use travel_search::config::AppConfig;
use travel_search::fetcher::{LiveFetcher, MockFetcher, ResultFetcher};
use travel_search::format::format_price;
use travel_search::mock_data;
use travel_search::model::Airport;
use travel_search::preferences::{FileStorage, PreferenceStore, RecentSearch, Theme};
use travel_search::session::{SearchOutcome, SearchSession, SuggestOutcome};
use travel_search::store::{CarAction, FlightAction, HotelAction, UiAction};
use travel_search::view::{
    car_cells, cars_available, flights_found, hotel_cells, hotels_found, price_points,
    render_grid, render_table, PriceSummary, ViewMode, CAR_HEADERS, HOTEL_HEADERS,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).init();

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(dir) = cli.storage_dir.clone() {
        config.storage_dir = dir;
    }
    if cli.live {
        config.demo_mode = false;
    }

    let fetcher: Arc<dyn ResultFetcher> = if config.demo_mode {
        info!("Using built-in demo data");
        Arc::new(MockFetcher::new(config.latency))
    } else {
        info!(host = %config.api_host, "Using live API");
        Arc::new(LiveFetcher::new(&config)?)
    };
    let preferences = PreferenceStore::new(Arc::new(FileStorage::new(config.storage_dir.clone())));
    let session = SearchSession::new(config, fetcher, preferences);

    match cli.command {
        Commands::Flights(args) => run_flights(&session, &args).await?,
        Commands::Hotels(args) => run_hotels(&session, &args).await?,
        Commands::Cars(args) => run_cars(&session, &args).await?,
        Commands::Airports { query } => run_airports(&session, &query).await,
        Commands::Popular { code } => run_popular(&session, code.as_deref()).await?,
        Commands::Recent { clear, rerun } => run_recent(&session, clear, rerun).await?,
        Commands::Prefs {
            theme,
            currency,
            page_size,
            toggle_columns,
        } => {
            if let Some(theme) = theme {
                let Some(theme) = Theme::parse(&theme) else {
                    bail!("Unknown theme '{}', expected light or dark", theme);
                };
                session.set_theme(theme);
            }
            if let Some(currency) = currency {
                session.set_currency(&currency);
            }
            if let Some(page_size) = page_size {
                session.set_page_size(page_size);
            }
            for column in &toggle_columns {
                session.toggle_column(column);
            }

            let ui = session.ui_state();
            println!("theme:     {}", ui.theme.as_str());
            println!("currency:  {}", ui.currency);
            println!("language:  {}", ui.language);
            println!("page size: {}", ui.page_size);
            println!("columns:   {}", ui.visible_columns.join(", "));
        }
    }

    Ok(())
}

fn check_outcome(outcome: SearchOutcome) -> Result<()> {
    match outcome {
        SearchOutcome::Failed { message } => bail!(message),
        SearchOutcome::Applied { .. } | SearchOutcome::Stale => Ok(()),
    }
}

async fn run_flights(session: &SearchSession, args: &FlightArgs) -> Result<()> {
    let (origin, destination) = future::join(
        session.resolve_airport(&args.origin),
        session.resolve_airport(&args.destination),
    )
    .await;
    let origin = origin.unwrap_or_else(|| Airport::from_ids(&args.origin.to_uppercase(), "", ""));
    let destination =
        destination.unwrap_or_else(|| Airport::from_ids(&args.destination.to_uppercase(), "", ""));

    session.dispatch_flights(FlightAction::SelectOrigin(Some(origin)));
    session.dispatch_flights(FlightAction::SelectDestination(Some(destination)));
    session.dispatch_flights(FlightAction::SetSearchParams(args.params_patch()));
    session.dispatch_flights(FlightAction::SetFilters(args.filters_patch()));
    session.dispatch_flights(FlightAction::SetSort(args.view_sort()));
    session.dispatch_ui(UiAction::SetPage(args.page));

    check_outcome(session.search_flights().await?)?;
    print_flights(session);
    Ok(())
}

fn print_flights(session: &SearchSession) {
    let state = session.flight_state();
    let page = session.flight_page();
    let currency = session.ui_state().currency;

    println!("{}", flights_found(page.total_items));
    let active = state.filters.active_dimensions();
    if !active.is_empty() {
        println!(
            "{} of {} results match filters on {}",
            page.total_items,
            state.flights.len(),
            active.join(", ")
        );
    }
    if page.total_items == 0 {
        return;
    }

    let points = price_points(&session.flight_view());
    if let Some(summary) = PriceSummary::from_points(&points) {
        let last_date = points.last().map(|point| point.date.as_str()).unwrap_or_default();
        println!(
            "Prices from {} to {}, {} on {}",
            format_price(summary.min, &currency),
            format_price(summary.max, &currency),
            format_price(summary.latest, &currency),
            last_date
        );
    }

    println!();
    println!("{}", render_table(&page.columns, &page.rows, &currency));
    println!();
    println!("Page {} of {}", page.page, page.total_pages);
    if page.mode == ViewMode::Virtualized {
        println!("Large result set, rendered as a scrolling window");
    }
}

async fn run_hotels(session: &SearchSession, args: &HotelArgs) -> Result<()> {
    session.dispatch_hotels(HotelAction::SetSearchParams(args.params_patch()));
    session.dispatch_hotels(HotelAction::SetFilters(args.filters_patch()));
    session.dispatch_hotels(HotelAction::SetSort(args.view_sort()));

    check_outcome(session.search_hotels().await?)?;

    let hotels = session.hotel_view();
    println!("{}", hotels_found(hotels.len()));
    if !hotels.is_empty() {
        let rows: Vec<Vec<String>> = hotels.iter().map(hotel_cells).collect();
        println!();
        println!("{}", render_grid(&HOTEL_HEADERS, &rows));
    }
    Ok(())
}

async fn run_cars(session: &SearchSession, args: &CarArgs) -> Result<()> {
    session.dispatch_cars(CarAction::SetSearchParams(args.params_patch()));
    session.dispatch_cars(CarAction::SetFilters(args.filters_patch()));
    session.dispatch_cars(CarAction::SetSort(args.view_sort()));

    check_outcome(session.search_cars().await?)?;

    let cars = session.car_view();
    println!("{}", cars_available(cars.len()));
    if !cars.is_empty() {
        let rows: Vec<Vec<String>> = cars.iter().map(car_cells).collect();
        println!();
        println!("{}", render_grid(&CAR_HEADERS, &rows));
    }
    Ok(())
}

async fn run_airports(session: &SearchSession, query: &str) {
    match session.suggest_airports(query).await {
        SuggestOutcome::Skipped => {
            println!("Type at least {} characters", session.config().min_airport_query_len);
            return;
        }
        SuggestOutcome::Failed { message } => {
            println!("{}", message);
            return;
        }
        _ => {}
    }

    let airports = session.flight_state().airports;
    if airports.is_empty() {
        println!("No airports found");
        return;
    }

    let rows: Vec<Vec<String>> = airports
        .iter()
        .map(|airport| {
            vec![
                airport.sky_id.clone(),
                airport.presentation.suggestion_title.clone(),
                airport.presentation.subtitle.clone(),
                airport.navigation.entity_type.clone(),
            ]
        })
        .collect();
    println!("{}", render_grid(&["Code", "Name", "Country", "Type"], &rows));
}

async fn run_popular(session: &SearchSession, code: Option<&str>) -> Result<()> {
    let Some(code) = code else {
        let rows: Vec<Vec<String>> = mock_data::popular_destinations()
            .iter()
            .map(|destination| {
                vec![
                    destination.code.clone(),
                    destination.city.clone(),
                    destination.country.clone(),
                    format_price(destination.price, "USD"),
                    destination.trend.as_str().to_string(),
                ]
            })
            .collect();
        println!("{}", render_grid(&["Code", "City", "Country", "From", "Trend"], &rows));
        return Ok(());
    };

    let today = chrono::Local::now().date_naive();
    check_outcome(session.search_popular(code, today).await?)?;
    print_flights(session);
    Ok(())
}

fn recent_row(position: usize, search: &RecentSearch) -> Vec<String> {
    let searched = chrono::DateTime::from_timestamp_millis(search.timestamp)
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    vec![
        position.to_string(),
        format!("{} -> {}", search.origin, search.destination),
        search.date.clone(),
        search.return_date.clone().unwrap_or_default(),
        search.trip_type.as_str().to_string(),
        searched,
    ]
}

async fn run_recent(session: &SearchSession, clear: bool, rerun: Option<usize>) -> Result<()> {
    if clear {
        session.clear_recent_searches();
        println!("Recent searches cleared");
        return Ok(());
    }

    let searches = session.recent_searches();
    if let Some(position) = rerun {
        let search = position
            .checked_sub(1)
            .and_then(|index| searches.get(index))
            .with_context(|| format!("No recent search at position {}", position))?;
        check_outcome(session.rerun_recent(search).await?)?;
        print_flights(session);
        return Ok(());
    }

    if searches.is_empty() {
        println!("No recent searches");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = searches
        .iter()
        .enumerate()
        .map(|(index, search)| recent_row(index + 1, search))
        .collect();
    println!(
        "{}",
        render_grid(&["#", "Route", "Date", "Return", "Trip", "Searched"], &rows)
    );
    Ok(())
}
