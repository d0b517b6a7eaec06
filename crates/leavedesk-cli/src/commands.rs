//! Command handlers. Each one builds a store from the config, runs a single
//! operation and prints the result.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use leavedesk_core::{
    ApiClient, FileStore, LifecycleStore, NotificationSink, Request, RequestDraft, RequestEdit,
    RequestFilter, RequestRepository, RequestStatus, RequestType, Role, TracingSink, TtlCache,
    User, UserRef,
};
use serde::Serialize;
use tracing::warn;

use crate::config::Config;
use crate::output::{self, ConsoleSink};
use crate::OutputFormat;

type Store = LifecycleStore<ApiClient>;

// ============================================================================
// Arguments
// ============================================================================

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only requests with this status
    #[arg(long, value_parser = parse_status)]
    pub status: Option<RequestStatus>,

    /// Only requests of this type
    #[arg(long = "type", value_parser = parse_request_type)]
    pub request_type: Option<RequestType>,

    /// Only requests ending on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Only requests starting on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Match reason or employee name
    #[arg(long)]
    pub search: Option<String>,
}

impl ListArgs {
    fn filter(&self) -> RequestFilter {
        RequestFilter {
            status: self.status,
            request_type: self.request_type,
            from: self.from,
            to: self.to,
            search: self.search.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// paid_time_off, sick_leave, time_edit or other
    #[arg(long = "type", value_parser = parse_request_type)]
    pub request_type: RequestType,

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day, defaults to the first day
    #[arg(long)]
    pub end: Option<NaiveDate>,

    #[arg(long)]
    pub reason: String,

    /// Requested clock-in time for a time edit (HH:MM)
    #[arg(long)]
    pub clock_in: Option<String>,

    /// Requested clock-out time for a time edit (HH:MM)
    #[arg(long)]
    pub clock_out: Option<String>,

    /// Recorded clock-in time being corrected (HH:MM)
    #[arg(long)]
    pub original_in: Option<String>,

    /// Recorded clock-out time being corrected (HH:MM)
    #[arg(long)]
    pub original_out: Option<String>,
}

impl SubmitArgs {
    fn into_draft(self, employee: UserRef) -> RequestDraft {
        RequestDraft {
            employee,
            request_type: self.request_type,
            start_date: Some(self.start),
            end_date: Some(self.end.unwrap_or(self.start)),
            reason: self.reason,
            original_clock_in: self.original_in,
            original_clock_out: self.original_out,
            requested_clock_in: self.clock_in,
            requested_clock_out: self.clock_out,
        }
    }
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Request id or unique id prefix
    pub id: String,

    #[arg(long = "type", value_parser = parse_request_type)]
    pub request_type: Option<RequestType>,

    #[arg(long)]
    pub start: Option<NaiveDate>,

    #[arg(long)]
    pub end: Option<NaiveDate>,

    #[arg(long)]
    pub reason: Option<String>,

    #[arg(long)]
    pub clock_in: Option<String>,

    #[arg(long)]
    pub clock_out: Option<String>,

    #[arg(long)]
    pub original_in: Option<String>,

    #[arg(long)]
    pub original_out: Option<String>,
}

impl EditArgs {
    fn to_edit(&self) -> RequestEdit {
        RequestEdit {
            request_type: self.request_type,
            start_date: self.start,
            end_date: self.end,
            reason: self.reason.clone(),
            original_clock_in: self.original_in.clone(),
            original_clock_out: self.original_out.clone(),
            requested_clock_in: self.clock_in.clone(),
            requested_clock_out: self.clock_out.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct RejectArgs {
    /// Request id or unique id prefix
    pub id: String,

    /// Shown to the employee; a placeholder is stored when omitted
    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the current configuration
    Show,
    /// Set the API base URL
    SetUrl { url: String },
    /// Set the user requests are submitted and reviewed as
    SetUser {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_role, default_value = "employee")]
        role: Role,
    },
    /// Set how long fetched requests stay fresh, in seconds
    SetTtl {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        secs: i64,
    },
}

fn parse_request_type(s: &str) -> Result<RequestType, String> {
    RequestType::from_str(s).ok_or_else(|| {
        let known: Vec<&str> = RequestType::ALL.iter().map(|t| t.as_str()).collect();
        format!("unknown request type '{}' (expected one of: {})", s, known.join(", "))
    })
}

fn parse_status(s: &str) -> Result<RequestStatus, String> {
    RequestStatus::from_str(s)
        .ok_or_else(|| format!("unknown status '{}' (expected pending, approved or rejected)", s))
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::from_str(s)
        .ok_or_else(|| format!("unknown role '{}' (expected employee, manager or admin)", s))
}

// ============================================================================
// Helpers
// ============================================================================

/// JSON output keeps stdout clean, so notices go to the log instead.
fn build_store(config: &Config, format: OutputFormat) -> Result<Store> {
    let mut client = ApiClient::new(config.base_url()?)?;
    if let Some(ref token) = config.api_token {
        client.set_token(token.clone());
    }
    // Cache entries live on disk so the TTL spans separate invocations
    let cache = TtlCache::with_backing(
        chrono::Duration::seconds(config.cache_ttl_secs),
        Box::new(FileStore::cache_location()?),
    );
    let repository = RequestRepository::with_cache(client, cache);
    let storage = FileStore::default_location()?;
    let sink: Box<dyn NotificationSink> = match format {
        OutputFormat::Text => Box::new(ConsoleSink),
        OutputFormat::Json => Box::new(TracingSink),
    };
    Ok(LifecycleStore::new(repository, Box::new(storage), sink))
}

/// Load through the cache; when the API is unreachable keep the saved collection.
async fn load_or_saved(store: &mut Store) {
    if let Err(e) = store.load().await {
        warn!(error = %e, "Using saved requests");
        eprintln!("[warning] Could not reach the API, showing saved requests");
    }
}

/// Match a full id, or a prefix that names exactly one request.
fn resolve_id<'a>(requests: impl IntoIterator<Item = &'a Request>, input: &str) -> Result<String> {
    let input = input.trim();
    let candidates: Vec<&Request> = requests.into_iter().collect();
    if let Some(request) = candidates.iter().find(|r| r.id == input) {
        return Ok(request.id.clone());
    }
    let matches: Vec<&&Request> = candidates
        .iter()
        .filter(|r| r.id.starts_with(input))
        .collect();
    match matches.as_slice() {
        [] => bail!("No request matches '{}'", input),
        [request] => Ok(request.id.clone()),
        _ => bail!(
            "'{}' matches {} requests, use a longer prefix",
            input,
            matches.len()
        ),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

fn print_request(request: &Request, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(request),
        OutputFormat::Text => {
            println!("{}", output::request_detail(request));
            Ok(())
        }
    }
}

fn print_requests(requests: &[&Request], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(requests),
        OutputFormat::Text => {
            if requests.is_empty() {
                println!("No requests.");
            } else {
                print!("{}", output::request_table(requests));
            }
            Ok(())
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

pub async fn list(args: ListArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let user = config.current_user()?;
    let mut store = build_store(config, format)?;
    load_or_saved(&mut store).await;

    let requests = args.filter().apply(store.visible(user));
    print_requests(&requests, format)
}

pub async fn show(id: &str, config: &Config, format: OutputFormat) -> Result<()> {
    let user = config.current_user()?;
    let mut store = build_store(config, format)?;
    load_or_saved(&mut store).await;

    let id = resolve_id(store.visible(user), id)?;
    let request = store
        .get(&id)
        .with_context(|| format!("Request {} not found", id))?;
    print_request(request, format)
}

pub async fn submit(args: SubmitArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let user = config.current_user()?;
    let mut store = build_store(config, format)?;

    let created = store.add_request(args.into_draft(user.to_ref())).await?;
    print_request(&created, format)
}

pub async fn edit(args: EditArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let user = config.current_user()?;
    let mut store = build_store(config, format)?;
    load_or_saved(&mut store).await;

    let id = resolve_id(store.requests(), &args.id)?;
    let updated = store.edit_request(&id, args.to_edit(), user).await?;
    print_request(&updated, format)
}

pub async fn approve(id: &str, config: &Config, format: OutputFormat) -> Result<()> {
    review(id, RequestStatus::Approved, None, config, format).await
}

pub async fn reject(args: RejectArgs, config: &Config, format: OutputFormat) -> Result<()> {
    review(
        &args.id,
        RequestStatus::Rejected,
        args.reason.as_deref(),
        config,
        format,
    )
    .await
}

async fn review(
    id: &str,
    status: RequestStatus,
    reason: Option<&str>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let user = config.current_user()?;
    let mut store = build_store(config, format)?;
    load_or_saved(&mut store).await;

    let id = resolve_id(store.requests(), id)?;
    let updated = store.update_request_status(&id, status, user, reason).await?;
    print_request(&updated, format)
}

pub async fn refresh(config: &Config, format: OutputFormat) -> Result<()> {
    let user = config.current_user()?;
    let mut store = build_store(config, format)?;
    store.refresh().await?;

    let summary = store.summary(user);
    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Text => {
            println!("Refreshed. {}", output::summary_line(&summary));
            Ok(())
        }
    }
}

pub async fn notifications(config: &Config, format: OutputFormat) -> Result<()> {
    let mut store = build_store(config, format)?;
    let notifications = store.notifications().await?;

    match format {
        OutputFormat::Json => print_json(&notifications),
        OutputFormat::Text => {
            if notifications.is_empty() {
                println!("No notifications.");
            }
            for n in &notifications {
                println!(
                    "{} {}  [{}] {}",
                    if n.read { " " } else { "*" },
                    n.created_at.format("%Y-%m-%d %H:%M"),
                    n.kind,
                    n.message
                );
            }
            Ok(())
        }
    }
}

pub async fn summary(config: &Config, format: OutputFormat) -> Result<()> {
    let user = config.current_user()?;
    let mut store = build_store(config, format)?;
    load_or_saved(&mut store).await;

    let summary = store.summary(user);
    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Text => {
            println!("{}", output::summary_line(&summary));
            Ok(())
        }
    }
}

pub fn config(cmd: ConfigCommand, config: &mut Config, format: OutputFormat) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            match format {
                OutputFormat::Json => print_json(&*config)?,
                OutputFormat::Text => {
                    println!("Config file: {}", Config::config_path()?.display());
                    println!(
                        "API URL:     {}",
                        config.api_base_url.as_deref().unwrap_or("(not set)")
                    );
                    println!("Cache TTL:   {}s", config.cache_ttl_secs);
                    match config.user {
                        Some(ref user) => {
                            println!("User:        {} ({}, {})", user.name, user.id, user.role)
                        }
                        None => println!("User:        (not set)"),
                    }
                }
            }
            return Ok(());
        }
        ConfigCommand::SetUrl { url } => {
            let url = url.trim().trim_end_matches('/').to_string();
            if url.is_empty() {
                bail!("API URL cannot be empty");
            }
            config.api_base_url = Some(url);
        }
        ConfigCommand::SetUser { id, name, role } => {
            let user = User::new(id.trim(), name.trim(), role);
            if user.id.is_empty() {
                bail!("User id cannot be empty");
            }
            config.user = Some(user);
        }
        ConfigCommand::SetTtl { secs } => config.cache_ttl_secs = secs,
    }
    config.save()?;
    println!("Saved {}", Config::config_path()?.display());
    Ok(())
}
