mod db;
mod export;
mod interpret;
mod models;
mod websearch;
mod xray;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use db::Database;
use interpret::default_interpreter;
use models::{ProfileStatus, SearchSpec};
use std::path::PathBuf;
use websearch::BraveSearchClient;
use xray::{build_queries, normalize_linkedin_url};

// Shown on every search created from a prompt; the interpreter itself stays
// silent about how the filters were chosen.
const SEARCH_SUMMARY: &str = "I set these filters based on your prompt.";

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Talent sourcing - build X-ray searches, capture candidates, export shortlists")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Manage sourcing projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Manage searches and their compiled queries
    Search {
        #[command(subcommand)]
        command: SearchCommands,
    },

    /// Capture a candidate profile into a project
    Capture {
        /// Project ID
        project_id: i64,

        /// LinkedIn profile URL (dedup key after normalization)
        #[arg(long)]
        url: String,

        /// Search that surfaced this profile
        #[arg(long)]
        search: Option<i64>,

        /// Candidate full name
        #[arg(long)]
        name: Option<String>,

        /// Current company
        #[arg(long)]
        company: Option<String>,

        /// Current title
        #[arg(long)]
        title: Option<String>,

        /// Location
        #[arg(long)]
        location: Option<String>,

        /// Free-text note to attach
        #[arg(long)]
        notes: Option<String>,
    },

    /// List and update captured profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Export profiles as CSV
    Export {
        /// Project ID
        project_id: i64,

        /// Filter by status (not_contacted, shortlisted, contacted, rejected)
        #[arg(short, long)]
        status: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Create a project
    Add {
        /// Project name
        name: String,

        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List all projects
    List,

    /// Show project details
    Show {
        /// Project ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum SearchCommands {
    /// Create a search from a free-text prompt
    Add {
        /// Project ID
        project_id: i64,

        /// Free-text sourcing brief
        #[arg(short, long)]
        prompt: Option<String>,

        /// Search name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List searches in a project
    List {
        /// Project ID
        project_id: i64,
    },

    /// Show a search and its latest spec
    Show {
        /// Search ID
        id: i64,
    },

    /// Save an edited spec (new version) and regenerate queries
    SetSpec {
        /// Search ID
        id: i64,

        /// Path to a spec JSON file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Inline spec JSON
        #[arg(short, long)]
        json: Option<String>,
    },

    /// Show the compiled query set
    Queries {
        /// Search ID
        id: i64,
    },

    /// Run the primary query against the web search provider
    Run {
        /// Search ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// List captured profiles
    List {
        /// Filter by project
        #[arg(long)]
        project: Option<i64>,

        /// Filter by search
        #[arg(long)]
        search: Option<i64>,

        /// Filter by status (not_contacted, shortlisted, contacted, rejected)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show profile details and notes
    Show {
        /// Profile ID
        id: i64,
    },

    /// Move a profile onto the shortlist
    Shortlist {
        /// Profile ID
        id: i64,
    },

    /// Set a profile's pipeline status
    Status {
        /// Profile ID
        id: i64,

        /// New status (not_contacted, shortlisted, contacted, rejected)
        status: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let db = Database::open()?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Project { command } => {
            db.ensure_initialized()?;
            run_project_command(&db, command)?;
        }

        Commands::Search { command } => {
            db.ensure_initialized()?;
            run_search_command(&db, command)?;
        }

        Commands::Capture {
            project_id,
            url,
            search,
            name,
            company,
            title,
            location,
            notes,
        } => {
            db.ensure_initialized()?;

            db.get_project(project_id)?
                .ok_or_else(|| anyhow!("Project #{} not found", project_id))?;

            let normalised = normalize_linkedin_url(&url);
            if normalised.is_empty() {
                return Err(anyhow!("A non-empty LinkedIn URL is required"));
            }

            let profile = db.upsert_profile(
                project_id,
                search,
                name.as_deref(),
                company.as_deref(),
                title.as_deref(),
                location.as_deref(),
                &url,
                &normalised,
            )?;

            if let Some(note) = notes {
                db.add_profile_note(profile.id, &note, "user")?;
            }

            println!(
                "Captured {} as profile #{} ({})",
                profile.full_name.as_deref().unwrap_or(&profile.linkedin_url),
                profile.id,
                profile.status
            );
        }

        Commands::Profile { command } => {
            db.ensure_initialized()?;
            run_profile_command(&db, command)?;
        }

        Commands::Export {
            project_id,
            status,
            output,
        } => {
            db.ensure_initialized()?;

            db.get_project(project_id)?
                .ok_or_else(|| anyhow!("Project #{} not found", project_id))?;

            let status = status.as_deref().map(parse_status).transpose()?;
            let profiles = db.list_profiles(Some(project_id), None, status.map(|s| s.as_str()))?;
            let csv = export::to_csv(&profiles);

            match output {
                Some(path) => {
                    std::fs::write(&path, &csv)
                        .with_context(|| format!("Failed to write to {}", path.display()))?;
                    println!(
                        "Exported {} profile(s) to {} ({})",
                        profiles.len(),
                        path.display(),
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
                    );
                }
                None => {
                    println!("{}", csv);
                }
            }
        }
    }

    Ok(())
}

fn run_project_command(db: &Database, command: ProjectCommands) -> Result<()> {
    match command {
        ProjectCommands::Add { name, description } => {
            let project_id = db.create_project(&name, description.as_deref())?;
            println!("Created project #{} '{}'", project_id, name);
        }

        ProjectCommands::List => {
            let projects = db.list_projects()?;
            if projects.is_empty() {
                println!("No projects found.");
            } else {
                println!("{:<6} {:<25} {:<40}", "ID", "NAME", "DESCRIPTION");
                println!("{}", "-".repeat(71));
                for project in projects {
                    println!(
                        "{:<6} {:<25} {:<40}",
                        project.id,
                        truncate(&project.name, 23),
                        truncate(&project.description.unwrap_or_default(), 38)
                    );
                }
            }
        }

        ProjectCommands::Show { id } => match db.get_project(id)? {
            Some(project) => {
                println!("Project #{}", project.id);
                println!("Name: {}", project.name);
                if let Some(description) = &project.description {
                    println!("Description: {}", description);
                }
                println!("Created: {}", project.created_at);

                let searches = db.list_searches(project.id)?;
                if !searches.is_empty() {
                    println!("\nSearches ({}):", searches.len());
                    for search in searches {
                        println!("  #{} - {}", search.id, search.name);
                    }
                }
            }
            None => {
                println!("Project #{} not found.", id);
            }
        },
    }
    Ok(())
}

fn run_search_command(db: &Database, command: SearchCommands) -> Result<()> {
    match command {
        SearchCommands::Add {
            project_id,
            prompt,
            name,
        } => {
            db.get_project(project_id)?
                .ok_or_else(|| anyhow!("Project #{} not found", project_id))?;

            let prompt = prompt.unwrap_or_default();
            let name = name.unwrap_or_else(|| "New Search".to_string());

            let interpreter = default_interpreter();
            let spec = interpreter.interpret(&prompt);

            let search_id = db.create_search(project_id, &name, &prompt, SEARCH_SUMMARY)?;
            let version = db.insert_spec_version(search_id, &spec)?;
            let queries = build_queries(&spec);
            db.replace_queries(search_id, &queries)?;

            println!(
                "Created search #{} '{}' (spec v{}, {} queries)",
                search_id,
                name,
                version,
                queries.len()
            );
            print_compiled_queries(&queries);
        }

        SearchCommands::List { project_id } => {
            let searches = db.list_searches(project_id)?;
            if searches.is_empty() {
                println!("No searches found.");
            } else {
                println!("{:<6} {:<25} {:<40}", "ID", "NAME", "PROMPT");
                println!("{}", "-".repeat(71));
                for search in searches {
                    println!(
                        "{:<6} {:<25} {:<40}",
                        search.id,
                        truncate(&search.name, 23),
                        truncate(&search.nl_prompt, 38)
                    );
                }
            }
        }

        SearchCommands::Show { id } => match db.get_search(id)? {
            Some(search) => {
                println!("Search #{}", search.id);
                println!("Name: {}", search.name);
                if !search.nl_prompt.is_empty() {
                    println!("Prompt: {}", search.nl_prompt);
                }
                if !search.summary.is_empty() {
                    println!("Summary: {}", search.summary);
                }
                println!("Created: {}", search.created_at);

                match db.latest_spec(search.id)? {
                    Some(spec_version) => {
                        println!("\nSpec v{} (saved {}):", spec_version.version, spec_version.created_at);
                        println!("{}", serde_json::to_string_pretty(&spec_version.spec)?);
                    }
                    None => {
                        println!("\nNo spec saved yet.");
                    }
                }
            }
            None => {
                println!("Search #{} not found.", id);
            }
        },

        SearchCommands::SetSpec { id, file, json } => {
            db.get_search(id)?
                .ok_or_else(|| anyhow!("Search #{} not found", id))?;

            let spec_json = match (file, json) {
                (Some(path), None) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read spec file: {}", path.display()))?,
                (None, Some(inline)) => inline,
                _ => return Err(anyhow!("Provide exactly one of --file or --json")),
            };

            let spec: SearchSpec =
                serde_json::from_str(&spec_json).context("Failed to parse spec JSON")?;

            let version = db.insert_spec_version(id, &spec)?;
            let queries = build_queries(&spec);
            db.replace_queries(id, &queries)?;

            println!(
                "Saved spec v{} for search #{}; regenerated {} queries",
                version,
                id,
                queries.len()
            );
        }

        SearchCommands::Queries { id } => {
            db.get_search(id)?
                .ok_or_else(|| anyhow!("Search #{} not found", id))?;

            let queries = db.list_queries(id)?;
            if queries.is_empty() {
                println!("No queries compiled for search #{}.", id);
            } else {
                for query in queries {
                    println!("[{}] {}", query.label, query.query_text);
                }
            }
        }

        SearchCommands::Run { id } => {
            db.get_search(id)?
                .ok_or_else(|| anyhow!("Search #{} not found", id))?;

            let spec = db
                .latest_spec(id)?
                .map(|v| v.spec)
                .ok_or_else(|| anyhow!("No spec saved for search #{}", id))?;

            let queries = build_queries(&spec);
            let query_text = queries
                .first()
                .map(|q| q.query_text.as_str())
                .unwrap_or("");
            if query_text.is_empty() {
                return Err(anyhow!(
                    "Add at least one title, company, or keyword before running the search."
                ));
            }

            let client = BraveSearchClient::from_env()?;
            println!("Running: {}", query_text);
            let hits = client.search(query_text)?;

            if hits.is_empty() {
                println!("No results.");
            } else {
                for (i, hit) in hits.iter().enumerate() {
                    println!("\n{}. {}", i + 1, hit.title);
                    println!("   {}", hit.url);
                    if !hit.description.is_empty() {
                        println!("   {}", truncate(&hit.description, 120));
                    }
                }
            }
        }
    }
    Ok(())
}

fn run_profile_command(db: &Database, command: ProfileCommands) -> Result<()> {
    match command {
        ProfileCommands::List {
            project,
            search,
            status,
        } => {
            if project.is_none() && search.is_none() {
                return Err(anyhow!("Provide --project or --search"));
            }

            let status = status.as_deref().map(parse_status).transpose()?;
            let profiles = db.list_profiles(project, search, status.map(|s| s.as_str()))?;

            if profiles.is_empty() {
                println!("No profiles found.");
            } else {
                println!(
                    "{:<6} {:<14} {:<22} {:<22} {:<18}",
                    "ID", "STATUS", "NAME", "COMPANY", "LOCATION"
                );
                println!("{}", "-".repeat(82));
                for profile in profiles {
                    println!(
                        "{:<6} {:<14} {:<22} {:<22} {:<18}",
                        profile.id,
                        profile.status,
                        truncate(&profile.full_name.unwrap_or_default(), 20),
                        truncate(&profile.current_company.unwrap_or_default(), 20),
                        truncate(&profile.location.unwrap_or_default(), 16)
                    );
                }
            }
        }

        ProfileCommands::Show { id } => match db.get_profile(id)? {
            Some(profile) => {
                println!("Profile #{}", profile.id);
                if let Some(name) = &profile.full_name {
                    println!("Name: {}", name);
                }
                if let Some(company) = &profile.current_company {
                    println!("Company: {}", company);
                }
                if let Some(title) = &profile.current_title {
                    println!("Title: {}", title);
                }
                if let Some(location) = &profile.location {
                    println!("Location: {}", location);
                }
                println!("URL: {}", profile.linkedin_url);
                println!("Status: {}", profile.status);
                println!("Captured: {}", profile.created_at);

                let notes = db.list_profile_notes(profile.id)?;
                if !notes.is_empty() {
                    println!("\nNotes ({}):", notes.len());
                    for note in notes {
                        println!("  [{}] {}", note.created_at, note.note);
                    }
                }
            }
            None => {
                println!("Profile #{} not found.", id);
            }
        },

        ProfileCommands::Shortlist { id } => {
            db.set_profile_status(id, ProfileStatus::Shortlisted.as_str())?;
            println!("Profile #{} shortlisted.", id);
        }

        ProfileCommands::Status { id, status } => {
            let status = parse_status(&status)?;
            db.set_profile_status(id, status.as_str())?;
            println!("Profile #{} marked {}.", id, status);
        }
    }
    Ok(())
}

fn parse_status(value: &str) -> Result<ProfileStatus> {
    ProfileStatus::parse(value).ok_or_else(|| {
        anyhow!(
            "Unknown status '{}'. Available: not_contacted, shortlisted, contacted, rejected",
            value
        )
    })
}

fn print_compiled_queries(queries: &[xray::CompiledQuery]) {
    for query in queries {
        println!("  [{}] {}", query.label, query.query_text);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    // Cut on a char boundary; names and prompts are routinely non-ASCII.
    let mut end = max.saturating_sub(3);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_strings_unchanged() {
        assert_eq!(truncate("Jane Doe", 20), "Jane Doe");
        assert_eq!(truncate("", 5), "");
    }

    #[test]
    fn test_truncate_long_ascii() {
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn test_truncate_does_not_split_multibyte_chars() {
        // 'é' spans bytes 19-20; a byte-offset slice at 20 would panic.
        let name = "aaaaaaaaaaaaaaaaaaaéaaaa";
        assert_eq!(truncate(name, 23), "aaaaaaaaaaaaaaaaaaa...");

        let cyrillic = "Алексей Михайлович Петров";
        let shortened = truncate(cyrillic, 12);
        assert!(shortened.ends_with("..."));
        assert!(shortened.len() <= 12);
    }
}
