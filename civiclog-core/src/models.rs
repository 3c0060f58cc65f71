use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Notes text of the update synthesized when a request is created.
pub const INITIAL_UPDATE_NOTES: &str = "Request created.";

/// Represents the lifecycle status of a service request
///
/// The set is closed: a request moves through these four stages and nothing
/// else. The order below is the logical progression, but transitions are not
/// enforced - any status may be set at any time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    Submitted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Rejected,
}

impl Status {
    /// All statuses in progression order
    pub const ALL: [Status; 4] = [
        Status::Submitted,
        Status::InProgress,
        Status::Completed,
        Status::Rejected,
    ];
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Submitted => write!(f, "Submitted"),
            Status::InProgress => write!(f, "In Progress"),
            Status::Completed => write!(f, "Completed"),
            Status::Rejected => write!(f, "Rejected"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], " ").as_str() {
            "submitted" => Ok(Status::Submitted),
            "in progress" | "inprogress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            "rejected" => Ok(Status::Rejected),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// A single entry in a request's status history
///
/// Immutable once created; histories only ever grow by prepending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Unique identifier for the update (UUID)
    pub id: Uuid,

    /// Status the request moved to with this update
    pub status: Status,

    /// Free-text notes, never empty
    pub notes: String,

    /// When the update was recorded
    pub date: DateTime<Utc>,
}

impl StatusUpdate {
    /// Creates a new update stamped with the current time
    pub fn new(status: Status, notes: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status,
            notes: notes.into(),
            date: Utc::now(),
        }
    }
}

/// Represents a single service request in the logbook
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    /// Unique identifier for the request (UUID)
    pub id: Uuid,

    /// What was reported to the municipality
    pub description: String,

    /// Civic category, e.g. "Pothole Repair"
    pub category: String,

    /// Ticket or reference number provided by the city
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,

    /// When the request was logged
    pub created_at: DateTime<Utc>,

    /// Status of the most recent update; always equals `updates[0].status`
    pub current_status: Status,

    /// Status history, newest first; never empty
    pub updates: Vec<StatusUpdate>,
}

impl ServiceRequest {
    /// Creates a new request with a synthesized initial "Submitted" update
    pub fn new(
        description: impl Into<String>,
        category: impl Into<String>,
        reference_number: Option<String>,
    ) -> Self {
        let now = Utc::now();
        let initial = StatusUpdate {
            id: Uuid::new_v4(),
            status: Status::Submitted,
            notes: INITIAL_UPDATE_NOTES.to_string(),
            date: now,
        };

        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            category: category.into(),
            reference_number,
            created_at: now,
            current_status: Status::Submitted,
            updates: vec![initial],
        }
    }

    /// Prepends `update` to the history and takes its status as current
    ///
    /// This is the only mutation a request supports; going through it keeps
    /// `current_status` and `updates[0]` in lockstep.
    pub fn append_update(&mut self, update: StatusUpdate) {
        self.current_status = update.status;
        self.updates.insert(0, update);
    }

    /// The most recent update
    pub fn latest_update(&self) -> &StatusUpdate {
        &self.updates[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_has_initial_update() {
        let req = ServiceRequest::new(
            "Large pothole on Main St",
            "Pothole Repair",
            Some("SR-12345".to_string()),
        );

        assert_eq!(req.current_status, Status::Submitted);
        assert_eq!(req.updates.len(), 1);
        assert_eq!(req.updates[0].status, Status::Submitted);
        assert_eq!(req.updates[0].notes, INITIAL_UPDATE_NOTES);
        assert_eq!(req.updates[0].date, req.created_at);
        assert_eq!(req.reference_number, Some("SR-12345".to_string()));
    }

    #[test]
    fn test_append_update_keeps_status_in_lockstep() {
        let mut req = ServiceRequest::new("Broken streetlight at 5th and Oak", "Streetlight Outage", None);
        let update = StatusUpdate::new(Status::InProgress, "City crew dispatched");
        let update_id = update.id;

        req.append_update(update);

        assert_eq!(req.current_status, Status::InProgress);
        assert_eq!(req.updates.len(), 2);
        assert_eq!(req.updates[0].id, update_id);
        assert_eq!(req.updates[0].status, Status::InProgress);
        assert_eq!(req.latest_update().notes, "City crew dispatched");
        // the original submission entry is untouched underneath
        assert_eq!(req.updates[1].status, Status::Submitted);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = ServiceRequest::new("Graffiti on the underpass wall", "Graffiti Removal", None);
        let b = ServiceRequest::new("Graffiti on the underpass wall", "Graffiti Removal", None);

        assert_ne!(a.id, b.id);
        assert_ne!(a.updates[0].id, b.updates[0].id);
    }

    #[test]
    fn test_status_display_round_trips_through_from_str() {
        for status in Status::ALL {
            let parsed: Status = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert_eq!("in-progress".parse::<Status>().unwrap(), Status::InProgress);
        assert!("escalated".parse::<Status>().is_err());
    }

    #[test]
    fn test_wire_format_matches_original_json() {
        let mut req = ServiceRequest::new("Overflowing trash bins in Elm Park", "Trash & Recycling", None);
        req.append_update(StatusUpdate::new(Status::InProgress, "Crew scheduled"));

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"currentStatus\":\"In Progress\""));
        // absent reference number is omitted entirely, not serialized as null
        assert!(!json.contains("referenceNumber"));

        let back: ServiceRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, req);
    }
}
