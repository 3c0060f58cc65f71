pub mod export;
pub mod logbook;
pub mod models;
pub mod paths;
pub mod store;
pub mod suggest;
pub mod views;

// Re-export commonly used types
pub use logbook::{Logbook, LogbookError, MIN_CATEGORY_LEN, MIN_DESCRIPTION_LEN, REQUESTS_KEY};
pub use models::{ServiceRequest, Status, StatusUpdate, INITIAL_UPDATE_NOTES};
pub use paths::determine_store_path;
pub use store::{ChangeEvent, KvStore, Mirror};
pub use suggest::{
    Categorize, DebouncedSuggester, SuggestClient, SuggestError, SuggestMode, KNOWN_CATEGORIES,
};
pub use views::{derive_view, SortDirection, SortKey, StatusFilter};
