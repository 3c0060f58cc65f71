//! Category Suggestion Module
//!
//! Turns a free-text request description into a suggested civic category by
//! calling an external text classifier. The classifier is a black box behind
//! the [`Categorize`] trait; the debounced wrapper keeps it from racing the
//! user's typing.

pub mod client;
pub mod debounce;

pub use client::{Categorize, SuggestClient, SuggestError, SuggestMode, KNOWN_CATEGORIES};
pub use debounce::DebouncedSuggester;

use std::time::Duration;

/// Description length a caller must exceed before a suggestion is attempted
pub const MIN_SUGGEST_LEN: usize = 16;

/// Default quiet period between the last input and the classifier call
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(1);
