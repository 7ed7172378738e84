//! Demo command line client for the TickTick open API.
//!
//! Reuses the access token cached by a previous run while it is valid;
//! otherwise runs the browser authorization flow and caches the new token.

mod listing;
mod token_cache;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use ticktick_core::auth::DEFAULT_AUTH_URL;
use ticktick_core::{
    ApplicationConfig, Authenticator, OAuthToken, ProjectCreationRequest, Scope,
    TaskCreationRequest, TaskUpdateRequest, TickTickClient, TickTickService, UreqTransport, DEFAULT_API_URL,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use token_cache::TokenCache;

#[derive(Parser, Debug)]
#[command(name = "ticktick-sample", version, about = "Browse and edit TickTick projects")]
struct Cli {
    /// OAuth client id of the registered application
    #[arg(long, env = "TICKTICK_API_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth client secret of the registered application
    #[arg(long, env = "TICKTICK_API_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Redirect URL registered for the application; served locally
    #[arg(long, default_value = "http://localhost:8889/ticktick-callback")]
    redirect_url: String,

    /// File caching the access token between runs
    #[arg(long, default_value = "token_cache.json")]
    token_cache: PathBuf,

    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    #[arg(long, default_value = DEFAULT_AUTH_URL)]
    auth_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List projects with their undone tasks (default)
    List,
    /// Create a project
    CreateProject {
        name: String,
        /// Color such as "#F18181"
        #[arg(long)]
        color: Option<String>,
    },
    /// Create a task, in the inbox unless a project name is given
    CreateTask {
        title: String,
        #[arg(long)]
        project: Option<String>,
    },
    /// Rename a task or replace its content
    UpdateTask {
        project_id: String,
        task_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Mark a task as completed
    CompleteTask { project_id: String, task_id: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let access_token = access_token(&cli)?;
    let api = TickTickService::new(
        TickTickClient::new(&cli.api_url),
        UreqTransport::new().with_bearer_token(&access_token),
    );

    match cli.command.unwrap_or(Command::List) {
        Command::List => list(&api),
        Command::CreateProject { name, color } => {
            let project = api
                .create_project(&ProjectCreationRequest {
                    color,
                    ..ProjectCreationRequest::new(name)
                })
                .context("failed to create project")?;
            println!("Project {} (#{}) created", project.name, project.id);
            Ok(())
        }
        Command::CreateTask { title, project } => {
            let project_id = match project {
                Some(name) => Some(project_id_by_name(&api, &name)?),
                None => None,
            };
            let task = api
                .create_task(&TaskCreationRequest {
                    project_id,
                    ..TaskCreationRequest::new(title)
                })
                .context("failed to create task")?;
            println!("Task {} (#{}) created in #{}", task.title, task.id, task.project_id);
            Ok(())
        }
        Command::UpdateTask {
            project_id,
            task_id,
            title,
            content,
        } => {
            let input = update_request(&project_id, &task_id, title, content)?;
            let task = api
                .update_task(&task_id, &input)
                .context("failed to update task")?;
            println!("Task {} (#{}) updated", task.title, task.id);
            Ok(())
        }
        Command::CompleteTask {
            project_id,
            task_id,
        } => {
            api.complete_task(&project_id, &task_id)
                .context("failed to complete task")?;
            println!("Task #{task_id} completed");
            Ok(())
        }
    }
}

fn list(api: &TickTickService<UreqTransport>) -> Result<()> {
    let mut projects = api.get_projects().context("failed to list projects")?;
    if projects.is_empty() {
        println!("No project found, creating one");
        let project = api
            .create_project(&ProjectCreationRequest::new("My whole new project"))
            .context("failed to create project")?;
        println!("Project {} (#{}) created", project.name, project.id);
        return Ok(());
    }

    listing::sort_projects(&mut projects);
    for project in &projects {
        println!("{}", listing::project_header(project));
        let data = api
            .get_project_data(&project.id)
            .with_context(|| format!("failed to load project {}", project.id))?;
        for line in listing::task_lines(&data.tasks) {
            println!("{line}");
        }
    }
    Ok(())
}

fn update_request(
    project_id: &str,
    task_id: &str,
    title: Option<String>,
    content: Option<String>,
) -> Result<TaskUpdateRequest> {
    if title.is_none() && content.is_none() {
        bail!("nothing to update: pass --title or --content");
    }
    Ok(TaskUpdateRequest {
        title,
        content,
        ..TaskUpdateRequest::new(task_id, project_id)
    })
}

fn project_id_by_name(api: &TickTickService<UreqTransport>, name: &str) -> Result<String> {
    let projects = api.get_projects().context("failed to list projects")?;
    match projects.into_iter().find(|p| p.name == name) {
        Some(project) => Ok(project.id),
        None => bail!("no project named {name:?}"),
    }
}

fn access_token(cli: &Cli) -> Result<String> {
    let now = Utc::now().timestamp_millis();
    if let Some(cache) = TokenCache::load(&cli.token_cache)? {
        if let Some(token) = cache.valid_token(now) {
            debug!(path = %cli.token_cache.display(), "reusing cached access token");
            return Ok(token.to_string());
        }
    }

    let t0 = now;
    let token = run_authentication_flow(cli)?;
    let cache = TokenCache::from_token(&token, t0);
    if let Some(expires_at) = Utc.timestamp_millis_opt(cache.expiration_time_millis).single() {
        println!(
            "Token expires in {}s ({expires_at})",
            token.expires_in.unwrap_or(0)
        );
    }
    cache.store(&cli.token_cache)?;
    Ok(token.access_token)
}

fn run_authentication_flow(cli: &Cli) -> Result<OAuthToken> {
    let client_id = cli
        .client_id
        .clone()
        .context("no client id: pass --client-id or set TICKTICK_API_CLIENT_ID")?;
    let client_secret = cli
        .client_secret
        .clone()
        .context("no client secret: pass --client-secret or set TICKTICK_API_CLIENT_SECRET")?;
    let authenticator = Authenticator::with_root_url(
        ApplicationConfig {
            redirect_url: cli.redirect_url.clone(),
            client_id,
            client_secret,
        },
        &cli.auth_url,
    );

    // An authorization code is single use: always authorize again.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let code = runtime
        .block_on(authenticator.authorize(&Scope::ALL, open_browser))
        .context("authorization failed")?;

    info!("exchanging authorization code for a token");
    authenticator
        .get_token(&UreqTransport::new(), &code, &Scope::ALL)
        .context("token exchange failed")
}

fn open_browser(url: &str) {
    println!("Opening the browser to authorize access...");
    if let Err(e) = open::that(url) {
        warn!(error = %e, "could not open a browser");
        println!("Open this URL to authorize access:\n{url}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_task_arguments() {
        let cli = Cli::try_parse_from([
            "ticktick-sample",
            "update-task",
            "p1",
            "t1",
            "--title",
            "renamed",
        ])
        .unwrap();
        let Some(Command::UpdateTask {
            project_id,
            task_id,
            title,
            content,
        }) = cli.command
        else {
            panic!("expected update-task");
        };

        let input = update_request(&project_id, &task_id, title, content).unwrap();
        assert_eq!(input.id, "t1");
        assert_eq!(input.project_id, "p1");
        assert_eq!(input.title.as_deref(), Some("renamed"));
        assert_eq!(input.content, None);
    }

    #[test]
    fn update_task_needs_a_change() {
        assert!(update_request("p1", "t1", None, None).is_err());
    }
}
