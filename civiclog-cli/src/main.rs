mod cli;
mod prompts;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use colored::{ColoredString, Colorize};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use civiclog_core::{
    derive_view, determine_store_path, export, KvStore, Logbook, ServiceRequest, SortDirection,
    SortKey, Status, StatusFilter,
};

use crate::cli::{Cli, Command};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Determine which store file to use
    let store_path = match &cli.file {
        Some(path) => path.clone(),
        None => determine_store_path()?,
    };
    let store = Arc::new(KvStore::open(store_path));
    let mut logbook = Logbook::open(store);

    match &cli.command {
        Command::Add {
            description,
            category,
            reference,
            interactive,
        } => {
            // Default to interactive mode if no specific arguments are provided
            let should_be_interactive =
                *interactive || (description.is_none() && category.is_none() && reference.is_none());

            if should_be_interactive {
                add_request_interactive(&mut logbook)?;
            } else {
                add_request_cli(&mut logbook, description, category, reference)?;
            }
        }
        Command::Update { id, status, notes } => {
            update_request(&mut logbook, id.as_deref(), status.as_deref(), notes.as_deref())?;
        }
        Command::List { status, sort, asc } => {
            list_requests(&logbook, status, sort, *asc)?;
        }
        Command::Show { id } => {
            show_request(&logbook, id)?;
        }
        Command::Export { output } => {
            export_requests(&logbook, output.clone())?;
        }
    }

    Ok(())
}

fn add_request_interactive(logbook: &mut Logbook) -> Result<()> {
    let (description, category, reference) = prompts::prompt_new_request()?;

    let request = logbook.create_request(&description, &category, reference)?;

    println!("{}", "Request logged successfully!".green());
    println!("ID: {}", request.id);
    println!("Category: {}", request.category);
    println!("Status: {}", status_badge(request.current_status));

    Ok(())
}

fn add_request_cli(
    logbook: &mut Logbook,
    description: &Option<String>,
    category: &Option<String>,
    reference: &Option<String>,
) -> Result<()> {
    let description = match description {
        Some(d) => d.clone(),
        None => anyhow::bail!("Description is required. Use --description to specify one."),
    };
    let category = match category {
        Some(c) => c.clone(),
        None => anyhow::bail!("Category is required. Use --category to specify one."),
    };

    let request = logbook.create_request(&description, &category, reference.clone())?;

    println!("{}", "Request logged successfully!".green());
    println!("ID: {}", request.id);

    Ok(())
}

fn update_request(
    logbook: &mut Logbook,
    id: Option<&str>,
    status: Option<&str>,
    notes: Option<&str>,
) -> Result<()> {
    if logbook.requests().is_empty() {
        anyhow::bail!("The logbook is empty - nothing to update.");
    }

    let request_id = match id {
        Some(id) => resolve_request_id(logbook, id)?,
        None => prompts::prompt_select_request(logbook.requests())?,
    };
    let current = logbook
        .find(request_id)
        .map(|r| r.current_status)
        .unwrap_or(Status::Submitted);

    let (status, notes) = match (status, notes) {
        (Some(status), Some(notes)) => {
            let status: Status = status
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid --status value")?;
            (status, notes.to_string())
        }
        _ => prompts::prompt_status_update(current)?,
    };

    let updated = logbook.append_status_update(request_id, status, &notes)?;

    println!("{}", "Status update added!".green());
    println!(
        "{} is now {}",
        updated.category,
        status_badge(updated.current_status)
    );

    Ok(())
}

fn list_requests(logbook: &Logbook, status: &str, sort: &str, asc: bool) -> Result<()> {
    let filter: StatusFilter = status
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("Invalid --status value")?;
    let sort_key: SortKey = sort
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("Invalid --sort value")?;
    let direction = if asc {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    };

    let view = derive_view(logbook.requests(), filter, sort_key, direction);

    if view.is_empty() {
        println!("Your logbook is empty. Log your first request with 'civiclog add'.");
        return Ok(());
    }

    println!(
        "{} request(s){}",
        view.len(),
        match filter {
            StatusFilter::All => String::new(),
            StatusFilter::Only(s) => format!(" with status {}", s),
        }
    );
    println!();

    for request in &view {
        print_request_line(request);
    }

    Ok(())
}

fn show_request(logbook: &Logbook, id: &str) -> Result<()> {
    let request_id = resolve_request_id(logbook, id)?;
    let request = logbook
        .find(request_id)
        .context("Request disappeared between lookup and display")?;

    println!("{}", request.category.bold());
    println!("ID: {}", request.id);
    println!("Status: {}", status_badge(request.current_status));
    println!("Opened: {}", request.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(reference) = &request.reference_number {
        println!("Ref: {}", reference);
    }
    println!();
    println!("{}", request.description);
    println!();
    println!("{} update(s):", request.updates.len());

    for update in &request.updates {
        println!(
            "  {}  {}  {}",
            update.date.format("%Y-%m-%d %H:%M"),
            status_badge(update.status),
            update.notes
        );
    }

    Ok(())
}

fn export_requests(logbook: &Logbook, output: Option<PathBuf>) -> Result<()> {
    let requests = logbook.requests();
    if requests.is_empty() {
        anyhow::bail!("The logbook is empty - nothing to export.");
    }

    let output_path = output
        .unwrap_or_else(|| PathBuf::from(export::export_filename(Local::now().date_naive())));

    export::export_json(requests, &output_path)
        .with_context(|| format!("Failed to export to {:?}", output_path))?;

    println!("Exported to JSON: {}", output_path.display());
    println!("  Total requests: {}", requests.len());

    Ok(())
}

/// Resolves a full UUID or a unique prefix of one to a request id
fn resolve_request_id(logbook: &Logbook, id: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        if logbook.find(uuid).is_some() {
            return Ok(uuid);
        }
        anyhow::bail!("Request not found: {}", id);
    }

    let prefix = id.to_lowercase();
    let matches: Vec<&ServiceRequest> = logbook
        .requests()
        .iter()
        .filter(|r| r.id.to_string().starts_with(&prefix))
        .collect();

    match matches.len() {
        0 => anyhow::bail!("Request not found: {}", id),
        1 => Ok(matches[0].id),
        n => anyhow::bail!("ID prefix '{}' is ambiguous ({} matches)", id, n),
    }
}

fn print_request_line(request: &ServiceRequest) {
    let short_id = request.id.to_string().chars().take(8).collect::<String>();
    let reference = request
        .reference_number
        .as_deref()
        .map(|r| format!(" (Ref: {})", r))
        .unwrap_or_default();

    println!(
        "{}  {}  {}  {}{}",
        short_id.dimmed(),
        request.created_at.format("%Y-%m-%d"),
        status_badge(request.current_status),
        request.category.bold(),
        reference
    );
    println!("          {}", request.description);
}

/// Status color map: the same palette the logbook has always used
fn status_badge(status: Status) -> ColoredString {
    let label = status.to_string();
    match status {
        Status::Submitted => label.blue(),
        Status::InProgress => label.yellow(),
        Status::Completed => label.green(),
        Status::Rejected => label.red(),
    }
}
