use std::fmt;

use crate::models::{ServiceRequest, Status};

/// Status filter applied before sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    fn matches(&self, request: &ServiceRequest) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => request.current_status == *status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "All"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse::<Status>().map(StatusFilter::Only)
        }
    }
}

/// Sort key for the derived view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Chronological, by creation time
    #[default]
    CreatedAt,
    /// By the display name of the current status
    CurrentStatus,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" | "created" | "createdat" | "created-at" => Ok(SortKey::CreatedAt),
            "status" | "currentstatus" | "current-status" => Ok(SortKey::CurrentStatus),
            _ => Err(format!("Unknown sort key: {}", s)),
        }
    }
}

/// Sort direction; `Desc` (newest first) is the display default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Derives a filtered, sorted view of the collection
///
/// Pure: the input is untouched and no side effects happen. The sort is
/// stable and uses no secondary key, so requests comparing equal keep their
/// incoming relative order - accepted nondeterminism for equal keys.
pub fn derive_view(
    requests: &[ServiceRequest],
    filter: StatusFilter,
    key: SortKey,
    direction: SortDirection,
) -> Vec<ServiceRequest> {
    let mut view: Vec<ServiceRequest> = requests
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();

    view.sort_by(|a, b| {
        let ordering = match key {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::CurrentStatus => a
                .current_status
                .to_string()
                .cmp(&b.current_status.to_string()),
        };
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    view
}
