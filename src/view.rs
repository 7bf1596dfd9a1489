// Presentation layer
// Projects derived result lists into rows, columns, pages and text tables.
// Everything here is data; the CLI decides how to print it.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::format::{format_date, format_duration, format_price, format_time, stops_label};
use crate::model::{CarRental, FlightItinerary, Hotel, ResultItem};

pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const VIRTUALIZATION_THRESHOLD: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Airline,
    Departure,
    Arrival,
    Duration,
    Stops,
    Price,
    Tags,
    Actions,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::Airline,
        Column::Departure,
        Column::Arrival,
        Column::Duration,
        Column::Stops,
        Column::Price,
        Column::Tags,
        Column::Actions,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Column::Airline => "airline",
            Column::Departure => "departure",
            Column::Arrival => "arrival",
            Column::Duration => "duration",
            Column::Stops => "stops",
            Column::Price => "price",
            Column::Tags => "tags",
            Column::Actions => "actions",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Column::Airline => "Airline",
            Column::Departure => "Departure",
            Column::Arrival => "Arrival",
            Column::Duration => "Duration",
            Column::Stops => "Stops",
            Column::Price => "Price",
            Column::Tags => "Tags",
            Column::Actions => "Actions",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.id() == id.trim())
    }
}

// Resolve stored column ids, skipping unknown and repeated ones
pub fn visible_columns(ids: &[String]) -> Vec<Column> {
    let mut columns = Vec::with_capacity(ids.len());
    for column in ids.iter().filter_map(|id| Column::parse(id)) {
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    columns
}

// Add the column if hidden, remove it if shown. Unknown ids change nothing.
pub fn toggle_column(ids: &[String], id: &str) -> Vec<String> {
    let Some(column) = Column::parse(id) else {
        return ids.to_vec();
    };

    if ids.iter().any(|existing| existing == column.id()) {
        ids.iter()
            .filter(|existing| existing.as_str() != column.id())
            .cloned()
            .collect()
    } else {
        let mut toggled = ids.to_vec();
        toggled.push(column.id().to_string());
        toggled
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlightRow {
    pub id: String,
    pub airline: String,
    pub flight_numbers: String,
    pub departure: String,
    pub arrival: String,
    pub duration: u32,
    pub stops: u32,
    pub price: f64,
    pub formatted_price: String,
    pub origin: String,
    pub destination: String,
    pub tags: Vec<String>,
    pub score: f64,
    pub has_flexible_options: bool,
}

impl From<&FlightItinerary> for FlightRow {
    fn from(itinerary: &FlightItinerary) -> Self {
        let leg = itinerary.first_leg();
        Self {
            id: itinerary.id.clone(),
            airline: itinerary
                .first_segment()
                .map(|segment| segment.marketing_carrier.name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            flight_numbers: leg
                .map(|leg| {
                    leg.segments
                        .iter()
                        .map(|segment| segment.flight_number.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default(),
            departure: leg.map(|leg| leg.departure.clone()).unwrap_or_default(),
            arrival: leg.map(|leg| leg.arrival.clone()).unwrap_or_default(),
            duration: leg.map(|leg| leg.duration_in_minutes).unwrap_or_default(),
            stops: leg.map(|leg| leg.stop_count).unwrap_or_default(),
            price: itinerary.raw_price(),
            formatted_price: itinerary.price.formatted.clone(),
            origin: leg.map(|leg| leg.origin.display_code.clone()).unwrap_or_default(),
            destination: leg
                .map(|leg| leg.destination.display_code.clone())
                .unwrap_or_default(),
            tags: itinerary.tags.clone(),
            score: itinerary.score,
            has_flexible_options: itinerary.has_flexible_options,
        }
    }
}

impl FlightRow {
    pub fn cell(&self, column: Column, currency: &str) -> String {
        match column {
            Column::Airline => self.airline.clone(),
            Column::Departure => format_time(&self.departure),
            Column::Arrival => format_time(&self.arrival),
            Column::Duration => format_duration(self.duration),
            Column::Stops => stops_label(self.stops),
            Column::Price if self.formatted_price.is_empty() => format_price(self.price, currency),
            Column::Price => self.formatted_price.clone(),
            Column::Tags => self.tags.iter().take(2).cloned().collect::<Vec<_>>().join(", "),
            Column::Actions => "Select".to_string(),
        }
    }
}

pub fn flight_rows(itineraries: &[FlightItinerary]) -> Vec<FlightRow> {
    itineraries.iter().map(FlightRow::from).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<'a, T> {
    pub items: &'a [T],
    // 1-based
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> PageSlice<'_, T> {
    let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);

    let start = ((page - 1) * page_size).min(total_items);
    let end = (start + page_size).min(total_items);

    PageSlice {
        items: &items[start..end],
        page,
        page_size,
        total_items,
        total_pages,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Table,
    Virtualized,
}

impl ViewMode {
    pub fn for_len(len: usize, threshold: usize) -> Self {
        if len > threshold {
            ViewMode::Virtualized
        } else {
            ViewMode::Table
        }
    }
}

// Fixed-height row window for long result lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualWindow {
    pub row_height: usize,
    pub viewport_height: usize,
    pub overscan: usize,
}

impl Default for VirtualWindow {
    fn default() -> Self {
        Self {
            row_height: 120,
            viewport_height: 600,
            overscan: 2,
        }
    }
}

impl VirtualWindow {
    // Rows to materialize for a scroll offset (in the same unit as row height)
    pub fn visible_range(&self, scroll_offset: usize, item_count: usize) -> Range<usize> {
        let row_height = self.row_height.max(1);
        let first = (scroll_offset / row_height).min(item_count);
        let visible = self.viewport_height.div_ceil(row_height);

        let start = first.saturating_sub(self.overscan);
        let end = (first + visible + self.overscan).min(item_count);
        start..end
    }

    pub fn container_height(&self, item_count: usize) -> usize {
        self.viewport_height.min(item_count * self.row_height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: String,
    pub price: f64,
}

// Price calendar header: cheapest, dearest and the selected (last) date
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    pub min: f64,
    pub max: f64,
    pub latest: f64,
}

// Cheapest fare per departure day, in date order
pub fn price_points(itineraries: &[FlightItinerary]) -> Vec<PricePoint> {
    let mut cheapest: BTreeMap<&str, (&str, f64)> = BTreeMap::new();
    for itinerary in itineraries {
        let Some(leg) = itinerary.first_leg() else {
            continue;
        };
        let day = leg.departure.get(..10).unwrap_or(leg.departure.as_str());
        let price = itinerary.raw_price();
        cheapest
            .entry(day)
            .and_modify(|(_, best)| *best = best.min(price))
            .or_insert((leg.departure.as_str(), price));
    }

    cheapest
        .into_values()
        .map(|(departure, price)| PricePoint {
            date: format_date(departure),
            price,
        })
        .collect()
}

impl PriceSummary {
    pub fn from_points(points: &[PricePoint]) -> Option<Self> {
        let latest = points.last()?.price;
        let (min, max) = points
            .iter()
            .map(|point| point.price)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), price| {
                (min.min(price), max.max(price))
            });
        Some(Self { min, max, latest })
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

pub fn flights_found(count: usize) -> String {
    match count {
        0 => "No flights found".to_string(),
        n => format!("{} found", plural(n, "flight")),
    }
}

pub fn hotels_found(count: usize) -> String {
    match count {
        0 => "No hotels found".to_string(),
        n => format!("{} found", plural(n, "hotel")),
    }
}

pub fn cars_available(count: usize) -> String {
    match count {
        0 => "No cars found".to_string(),
        n => format!("{} available", plural(n, "car")),
    }
}

pub const HOTEL_HEADERS: [&str; 6] = ["Hotel", "Stars", "Rating", "Reviews", "Location", "Price"];

pub fn hotel_cells(hotel: &Hotel) -> Vec<String> {
    vec![
        hotel.name.clone(),
        "*".repeat(hotel.stars as usize),
        format!("{:.1}", hotel.rating),
        hotel.review_count.to_string(),
        hotel.location.name.clone(),
        if hotel.price.formatted.is_empty() {
            format_price(hotel.price.amount, &hotel.price.currency)
        } else {
            hotel.price.formatted.clone()
        },
    ]
}

pub const CAR_HEADERS: [&str; 7] = ["Supplier", "Type", "Class", "Seats", "Transmission", "Pickup", "Price"];

pub fn car_cells(car: &CarRental) -> Vec<String> {
    vec![
        car.supplier.clone(),
        car.car_type.clone(),
        car.car_class.clone(),
        car.seats.to_string(),
        car.transmission.as_str().to_string(),
        car.pickup_location.clone(),
        if car.price.formatted.is_empty() {
            format_price(car.price.total, &car.price.currency)
        } else {
            car.price.formatted.clone()
        },
    ]
}

// Left-aligned fixed-width text grid
pub fn render_grid(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render_line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_line(headers.to_vec()));
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        lines.push(render_line(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

pub fn render_table(columns: &[Column], rows: &[FlightRow], currency: &str) -> String {
    let headers: Vec<&str> = columns.iter().map(Column::label).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|column| row.cell(*column, currency)).collect())
        .collect();
    render_grid(&headers, &cells)
}
