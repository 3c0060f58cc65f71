use anyhow::Result;
use inquire::autocompletion::{Autocomplete, Replacement};
use inquire::validator::Validation;
use inquire::{CustomUserError, Select, Text};
use std::sync::Arc;
use uuid::Uuid;

use civiclog_core::{
    DebouncedSuggester, ServiceRequest, Status, SuggestClient, MIN_CATEGORY_LEN,
    MIN_DESCRIPTION_LEN,
};

/// Feeds every keystroke of the description field into the debounced
/// suggester. Offers no completions of its own; it exists purely to observe
/// typing so a suggestion is ready by the time the category field comes up.
#[derive(Clone)]
struct SuggestFeed {
    suggester: Arc<DebouncedSuggester>,
}

impl Autocomplete for SuggestFeed {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        self.suggester.submit(input);
        Ok(Vec::new())
    }

    fn get_completion(
        &mut self,
        _input: &str,
        _highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(Replacement::None)
    }
}

/// Prompts the user for a new service request
///
/// Returns `(description, category, reference_number)` with validation
/// already applied inline at each field.
pub fn prompt_new_request() -> Result<(String, String, Option<String>)> {
    let suggester = Arc::new(DebouncedSuggester::new(Arc::new(SuggestClient::new())));

    let description = Text::new("Description:")
        .with_placeholder("e.g. 'Large pothole on the corner of Main St and 1st Ave.'")
        .with_autocomplete(SuggestFeed {
            suggester: Arc::clone(&suggester),
        })
        .with_validator(|input: &str| {
            if input.trim().chars().count() < MIN_DESCRIPTION_LEN {
                Ok(Validation::Invalid(
                    "Please provide a detailed description (at least 10 characters).".into(),
                ))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?;

    // A suggestion from the pause in typing pre-fills the category; the user
    // is free to overwrite it.
    let mut category_prompt = Text::new("Category:")
        .with_placeholder("e.g. 'Pothole Repair'")
        .with_validator(|input: &str| {
            if input.trim().chars().count() < MIN_CATEGORY_LEN {
                Ok(Validation::Invalid("Category is required.".into()))
            } else {
                Ok(Validation::Valid)
            }
        });

    let suggested = suggester.latest();
    if let Some(suggestion) = &suggested {
        category_prompt = category_prompt.with_initial_value(suggestion);
    }
    let category = category_prompt.prompt()?;
    suggester.close();

    let reference = Text::new("Reference number (optional):")
        .with_placeholder("e.g. 'SR-12345'")
        .prompt()?;
    let reference = if reference.trim().is_empty() {
        None
    } else {
        Some(reference.trim().to_string())
    };

    Ok((description, category, reference))
}

/// Prompts for a status update: new status plus non-empty notes
pub fn prompt_status_update(current: Status) -> Result<(Status, String)> {
    let options = Status::ALL.to_vec();
    let start = options.iter().position(|s| *s == current).unwrap_or(0);

    let status = Select::new("New status:", options)
        .with_starting_cursor(start)
        .prompt()?;

    let notes = Text::new("Notes:")
        .with_placeholder("e.g. 'Received an email confirmation from the city.'")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Ok(Validation::Invalid("Notes are required.".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?;

    Ok((status, notes))
}

/// Prompts the user to select a request from the collection
pub fn prompt_select_request(requests: &[ServiceRequest]) -> Result<Uuid> {
    let options: Vec<String> = requests
        .iter()
        .map(|r| {
            let short_id = r.id.to_string().chars().take(8).collect::<String>();
            format!(
                "{}  {} - {} [{}]",
                short_id,
                r.category,
                truncate(&r.description, 40),
                r.current_status
            )
        })
        .collect();

    let options_clone = options.clone();
    let selection = Select::new("Select a request:", options_clone).prompt()?;

    let index = options
        .iter()
        .position(|o| o == &selection)
        .expect("selection came from the offered options");
    Ok(requests[index].id)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut.trim_end())
    }
}
