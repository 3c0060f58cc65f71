use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{ServiceRequest, Status, StatusUpdate};
use crate::store::{KvStore, Mirror};

/// Storage key holding the whole request collection
pub const REQUESTS_KEY: &str = "civiclog-requests";

/// Minimum description length accepted by the intake validation
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// Minimum category length accepted by the intake validation
pub const MIN_CATEGORY_LEN: usize = 2;

/// Validation and lookup errors for logbook mutations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LogbookError {
    #[error("please provide a detailed description (at least {MIN_DESCRIPTION_LEN} characters)")]
    DescriptionTooShort,

    #[error("category is required")]
    CategoryRequired,

    #[error("notes are required")]
    NotesRequired,

    #[error("request not found: {0}")]
    RequestNotFound(Uuid),
}

/// Owns the authoritative request collection and its two mutations
///
/// The collection lives in a [`Mirror`] over the `civiclog-requests` key;
/// every successful mutation writes the whole collection through to the
/// durable store. Consumers render only the read-only views this type hands
/// out - nobody else holds a copy.
pub struct Logbook {
    mirror: Mirror<Vec<ServiceRequest>>,
}

impl Logbook {
    /// Opens the logbook over `store` and performs the first read
    pub fn open(store: Arc<KvStore>) -> Self {
        let mut logbook = Self::open_deferred(store);
        logbook.hydrate();
        logbook
    }

    /// Opens the logbook without reading the store yet
    ///
    /// `requests` stays empty until [`Self::hydrate`] runs; a front-end can
    /// use the un-hydrated phase to hold off rendering real content.
    pub fn open_deferred(store: Arc<KvStore>) -> Self {
        Self {
            mirror: Mirror::new(store, REQUESTS_KEY, Vec::new()),
        }
    }

    /// Whether the first read from the durable store has completed
    pub fn is_hydrated(&self) -> bool {
        self.mirror.is_hydrated()
    }

    /// Reads the collection from the durable store
    pub fn hydrate(&mut self) {
        self.mirror.hydrate();
    }

    /// Picks up changes written by other consumers of the same store
    ///
    /// Returns whether the collection was re-read.
    pub fn refresh(&mut self) -> bool {
        self.mirror.refresh()
    }

    /// Read-only view of the collection, newest-created first
    pub fn requests(&self) -> &[ServiceRequest] {
        self.mirror.value().map(Vec::as_slice).unwrap_or_default()
    }

    /// Looks up a request by id
    pub fn find(&self, id: Uuid) -> Option<&ServiceRequest> {
        self.requests().iter().find(|r| r.id == id)
    }

    /// Logs a new request and writes the collection through
    ///
    /// The new request carries a fresh id, `created_at = now`, and a
    /// synthesized initial "Submitted" update. It is prepended to the
    /// collection, so storage order is newest-created first.
    pub fn create_request(
        &mut self,
        description: &str,
        category: &str,
        reference_number: Option<String>,
    ) -> Result<ServiceRequest, LogbookError> {
        let description = description.trim();
        let category = category.trim();

        if description.chars().count() < MIN_DESCRIPTION_LEN {
            return Err(LogbookError::DescriptionTooShort);
        }
        if category.chars().count() < MIN_CATEGORY_LEN {
            return Err(LogbookError::CategoryRequired);
        }

        let reference_number = reference_number
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let request = ServiceRequest::new(description, category, reference_number);

        let mut requests = self.requests().to_vec();
        requests.insert(0, request.clone());
        self.mirror.set(requests);

        Ok(request)
    }

    /// Appends a status update to the request with `request_id`
    ///
    /// Rejects empty notes with no mutation. The matched request gets a new
    /// update prepended and its `current_status` overwritten; every other
    /// request is left untouched.
    pub fn append_status_update(
        &mut self,
        request_id: Uuid,
        status: Status,
        notes: &str,
    ) -> Result<ServiceRequest, LogbookError> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(LogbookError::NotesRequired);
        }

        let mut requests = self.requests().to_vec();
        let request = requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or(LogbookError::RequestNotFound(request_id))?;

        request.append_update(StatusUpdate::new(status, notes));
        let updated = request.clone();

        self.mirror.set(requests);

        Ok(updated)
    }
}
