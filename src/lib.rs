// Travel search: parameter stores, result fetching, filtering and preferences

pub mod cli;
pub mod config;
pub mod fetcher;
pub mod filter;
pub mod format;
pub mod mock_data;
pub mod model;
pub mod preferences;
pub mod search_params;
pub mod session;
pub mod store;
pub mod view;

// Re-export key types for convenience
pub use config::{AppConfig, ConfigError};
pub use fetcher::{FetchError, LiveFetcher, MockFetcher, ResultFetcher};
pub use filter::{apply, FlightFilters, Predicate, Sort, SortDirection, SortKey};
pub use model::{Airport, CarRental, FlightItinerary, Hotel};
pub use preferences::{PreferenceStore, RecentSearch, StorageError, UserPreferences};
pub use search_params::{FlightSearchParams, SearchError};
pub use session::{SearchOutcome, SearchSession, StoreEvent};
