use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{seq::SliceRandom, thread_rng, Rng};
use travel_search::filter::{
    apply, AirlineSelector, Alliance, DurationBracket, FlightFilters, FlightSortKey, PriceBracket,
    Sort, StopsFilter,
};
use travel_search::mock_data;
use travel_search::model::FlightItinerary;

// Randomized copies of the demo itineraries
fn generate_itineraries(count: usize) -> Vec<FlightItinerary> {
    let mut rng = thread_rng();
    let templates = mock_data::flights();

    (0..count)
        .map(|i| {
            let mut itinerary = templates.choose(&mut rng).cloned().unwrap_or_default();
            itinerary.id = format!("flight-{}", i);
            itinerary.price.raw = rng.gen_range(80.0..1500.0);
            itinerary.score = rng.gen_range(0.0..1.0);
            if let Some(leg) = itinerary.legs.first_mut() {
                leg.stop_count = rng.gen_range(0..3);
                leg.duration_in_minutes = rng.gen_range(60..900);
                leg.departure = format!(
                    "2024-01-15T{:02}:{:02}:00",
                    rng.gen_range(0..24),
                    rng.gen_range(0..60)
                );
            }
            itinerary
        })
        .collect()
}

pub fn filter_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("flight_result_view");

    let filters = FlightFilters {
        stops: StopsFilter::AtMostOne,
        airlines: vec![AirlineSelector::Alliance(Alliance::Oneworld)],
        price: PriceBracket::From200To500,
        duration: DurationBracket::FourToEightHours,
        ..Default::default()
    };
    let sort = Some(Sort::asc(FlightSortKey::Price));

    for size in [100, 1_000, 10_000].iter() {
        let itineraries = generate_itineraries(*size);

        group.bench_with_input(BenchmarkId::new("filtered", size), &itineraries, |b, items| {
            b.iter(|| black_box(apply(items, &filters, sort)));
        });

        // No active dimension, sort only
        group.bench_with_input(BenchmarkId::new("sorted", size), &itineraries, |b, items| {
            b.iter(|| {
                black_box(apply(
                    items,
                    &FlightFilters::default(),
                    Some(Sort::desc(FlightSortKey::Best)),
                ))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, filter_benchmark);
criterion_main!(benches);
