//! Suggestion Client Module
//!
//! Handles communication with the external text classifier via a CLI
//! subprocess.

use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

/// Civic categories the classifier is asked to choose between
pub const KNOWN_CATEGORIES: [&str; 8] = [
    "Pothole Repair",
    "Streetlight Outage",
    "Graffiti Removal",
    "Trash & Recycling",
    "Water & Sewer",
    "Parks & Trees",
    "Noise Complaint",
    "Other",
];

/// Errors that can occur while asking for a category suggestion
#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("classifier CLI not found at {0}")]
    CliNotFound(PathBuf),

    #[error("classifier execution failed: {0}")]
    ExecFailed(String),

    #[error("invalid response from classifier: {0}")]
    InvalidResponse(String),

    #[error("category suggestion not available")]
    NotAvailable,
}

/// Boundary contract: free-text description in, category label out
pub trait Categorize {
    fn categorize(&self, description: &str) -> Result<String, SuggestError>;
}

/// Suggestion operating mode
#[derive(Debug, Clone, Default)]
pub enum SuggestMode {
    /// External classifier CLI invoked per request
    ClassifierCli { path: PathBuf },
    /// Suggestions disabled
    #[default]
    Disabled,
}

/// Client for the external category classifier
#[derive(Debug, Clone)]
pub struct SuggestClient {
    mode: SuggestMode,
}

impl Default for SuggestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SuggestClient {
    /// Creates a client with an auto-detected mode
    pub fn new() -> Self {
        Self {
            mode: Self::detect_mode(),
        }
    }

    /// Creates a client with a specific mode
    pub fn with_mode(mode: SuggestMode) -> Self {
        Self { mode }
    }

    /// Detects the best available classifier
    fn detect_mode() -> SuggestMode {
        // Explicit override wins
        if let Ok(configured) = std::env::var("CIVICLOG_CLASSIFIER") {
            let path = PathBuf::from(configured);
            if path.exists() {
                return SuggestMode::ClassifierCli { path };
            }
        }

        if let Some(path) = Self::find_classifier_cli() {
            return SuggestMode::ClassifierCli { path };
        }

        SuggestMode::Disabled
    }

    /// Finds the classifier CLI executable
    fn find_classifier_cli() -> Option<PathBuf> {
        // First check if 'claude' is in PATH
        if let Ok(output) = Command::new("which").arg("claude").output() {
            if output.status.success() {
                let path_str = String::from_utf8_lossy(&output.stdout);
                let path = PathBuf::from(path_str.trim());
                if path.exists() {
                    return Some(path);
                }
            }
        }

        // Check common locations
        for candidate in ["/usr/local/bin/claude", "/usr/bin/claude"] {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Check if suggestions are available
    pub fn is_available(&self) -> bool {
        match &self.mode {
            SuggestMode::ClassifierCli { path } => path.exists(),
            SuggestMode::Disabled => false,
        }
    }

    /// Get the current mode
    pub fn mode(&self) -> &SuggestMode {
        &self.mode
    }

    /// Get a description of the current mode
    pub fn mode_description(&self) -> String {
        match &self.mode {
            SuggestMode::ClassifierCli { path } => format!("Classifier CLI ({})", path.display()),
            SuggestMode::Disabled => "Disabled".to_string(),
        }
    }

    fn build_prompt(description: &str) -> String {
        format!(
            "Classify this civic service request into exactly one of the following categories: {}.\n\
             Respond with the category name only, no punctuation or explanation.\n\n\
             Request: {}",
            KNOWN_CATEGORIES.join(", "),
            description
        )
    }

    /// The suggested label is the first non-empty line of the response
    fn parse_response(raw: &str) -> Result<String, SuggestError> {
        let label = raw
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| SuggestError::InvalidResponse("empty response".to_string()))?;

        Ok(label.trim_matches(&['"', '.', '`'][..]).to_string())
    }
}

impl Categorize for SuggestClient {
    fn categorize(&self, description: &str) -> Result<String, SuggestError> {
        match &self.mode {
            SuggestMode::ClassifierCli { path } => {
                // --print for non-interactive output, -p to pass the prompt
                let output = Command::new(path)
                    .arg("--print")
                    .arg("-p")
                    .arg(Self::build_prompt(description))
                    .output()
                    .map_err(|e| SuggestError::ExecFailed(e.to_string()))?;

                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(SuggestError::ExecFailed(format!(
                        "Exit code: {:?}, stderr: {}",
                        output.status.code(),
                        stderr
                    )));
                }

                Self::parse_response(&String::from_utf8_lossy(&output.stdout))
            }
            SuggestMode::Disabled => Err(SuggestError::NotAvailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_detection() {
        let client = SuggestClient::new();
        // Just ensure it doesn't panic
        let _ = client.is_available();
        let _ = client.mode_description();
    }

    #[test]
    fn test_disabled_mode() {
        let client = SuggestClient::with_mode(SuggestMode::Disabled);
        assert!(!client.is_available());
        assert_eq!(client.mode_description(), "Disabled");
        assert!(matches!(
            client.categorize("Large pothole on Main St"),
            Err(SuggestError::NotAvailable)
        ));
    }

    #[test]
    fn test_parse_response_takes_first_nonempty_line() {
        assert_eq!(
            SuggestClient::parse_response("\n Pothole Repair \nextra").unwrap(),
            "Pothole Repair"
        );
        assert_eq!(
            SuggestClient::parse_response("\"Parks & Trees\".").unwrap(),
            "Parks & Trees"
        );
        assert!(SuggestClient::parse_response("  \n  ").is_err());
    }

    #[test]
    fn test_prompt_names_every_known_category() {
        let prompt = SuggestClient::build_prompt("Large pothole on Main St");
        for category in KNOWN_CATEGORIES {
            assert!(prompt.contains(category));
        }
        assert!(prompt.contains("Large pothole on Main St"));
    }
}
