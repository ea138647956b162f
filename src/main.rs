use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use mentor_connect::client::{
    load_mentors, search_mentors, status_counts, ApiClient, FileSessionStore, MeetingApi,
    MeetingDraft, MeetingWorkflow, SessionContext, StatusFilter,
};
use mentor_connect::model::{Decision, MeetingId, ProfileUpdate, RegisterRequest, Role, UserId};
use mentor_connect::{create_router, AppState, Config, Directory};
use tracing::info;

#[derive(Parser)]
#[command(name = "mentor-connect", about = "Student and alumni mentor matching")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/mentor-connect")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the REST service
    Serve,
    #[command(flatten)]
    Client(ClientCommand),
}

/// Subcommands that talk to a running service
#[derive(Subcommand)]
enum ClientCommand {
    /// Create a student or mentor account
    Register {
        #[arg(long)]
        role: Role,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
        /// Skills offered (mentors only)
        #[arg(long = "skill")]
        skills: Vec<String>,
    },
    Login {
        #[arg(long)]
        role: Role,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show who is logged in
    Whoami,
    /// List mentors, optionally matching a skill
    Mentors {
        #[arg(long)]
        skill: Option<String>,
    },
    /// List your meeting requests
    Requests {
        /// all, pending, approved, rejected, completed or cancelled
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
    /// Ask a mentor for a meeting (students)
    Request {
        #[arg(long)]
        mentor: UserId,
        #[arg(long = "skill", required = true)]
        skills: Vec<String>,
        #[arg(long)]
        question: String,
    },
    /// Accept or reject a request (mentors)
    Resolve { meeting: MeetingId, decision: Decision },
    /// Cancel one of your meetings
    Cancel { meeting: MeetingId },
    /// Show a mentor's scheduling link
    Link { mentor: UserId },
    /// Show your profile, or update it when any option is given
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        password: Option<String>,
        /// Add offered skills (mentors only)
        #[arg(long = "add-skill")]
        add_skills: Vec<String>,
        /// Remove offered skills (mentors only)
        #[arg(long = "remove-skill")]
        remove_skills: Vec<String>,
        /// Set your scheduling link (mentors only)
        #[arg(long)]
        scheduling_link: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Command::Serve => serve(&cfg).await,
        Command::Client(command) => run_client(&cfg, command).await,
    }
}

async fn serve(cfg: &Config) -> Result<()> {
    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let state = AppState::new(Directory::new(cfg.session_ttl()));
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

async fn run_client(cfg: &Config, command: ClientCommand) -> Result<()> {
    let api = ApiClient::new(&cfg.client.base_url)?;
    let session = SessionContext::new(FileSessionStore::new(cfg.session_path()?), cfg.session_ttl());
    let mut workflow = MeetingWorkflow::new(api, session);
    let now = Utc::now();

    match command {
        ClientCommand::Register {
            role,
            name,
            email,
            password,
            phone,
            skills,
        } => {
            let req = RegisterRequest {
                name,
                email,
                phone,
                password,
                skills,
            };
            let id = workflow.api().register(role, &req).await?;
            println!("Registered {} #{}", role, id);
        }
        ClientCommand::Login {
            role,
            email,
            password,
        } => {
            let identity = workflow.login(role, &email, &password, now).await?;
            println!("Welcome, {} ({} #{})", identity.name, identity.user_type, identity.id);
        }
        ClientCommand::Logout => {
            workflow.logout(now).await?;
            println!("Logged out");
        }
        ClientCommand::Whoami => match workflow.identity(now) {
            Some(identity) => println!(
                "{} <{}> ({} #{})",
                identity.name, identity.email, identity.user_type, identity.id
            ),
            None => println!("Not logged in"),
        },
        ClientCommand::Mentors { skill } => {
            let mentors = load_mentors(workflow.api()).await?;
            let term = skill.unwrap_or_default();
            let found = search_mentors(&mentors, &term);
            if !term.is_empty() {
                println!("Showing {} mentor(s) with \"{}\" skill", found.len(), term);
            }
            for mentor in found {
                println!("#{:<4} {:<24} {}", mentor.id, mentor.name, mentor.skills.join(", "));
            }
        }
        ClientCommand::Requests { status } => {
            let Some(identity) = workflow.identity(now) else {
                bail!("Not logged in");
            };
            let loaded = workflow.list_requests(now).await.map(|list| list.len());
            if let Err(e) = loaded {
                bail!(
                    "{} (run the command again to retry)",
                    workflow.load_error().unwrap_or(&e.to_string())
                );
            }

            let all = workflow.requests();
            let counts: Vec<String> = status_counts(all)
                .into_iter()
                .map(|(s, n)| format!("{} ({})", s, n))
                .collect();
            println!("{}", counts.join("  "));

            let shown = status.apply(all);
            if shown.is_empty() {
                println!("No {} meeting requests found.", status);
            }
            for detail in shown {
                let m = &detail.meeting;
                println!(
                    "#{:<4} {:<10} {:<20} [{}] {}",
                    m.id,
                    m.status,
                    detail.counterpart_name(identity.user_type).unwrap_or("-"),
                    m.skills.join(", "),
                    m.question
                );
                if identity.user_type == Role::Student {
                    println!("      {}", m.status.student_message());
                }
            }
        }
        ClientCommand::Request {
            mentor,
            skills,
            question,
        } => {
            let summary = workflow.api().mentor(mentor).await?;
            let mut draft = MeetingDraft::new(&summary);
            for skill in &skills {
                draft.toggle_skill(skill);
            }
            draft.set_question(question);

            let result = workflow.create_request(&mut draft, now).await;
            print_notice(&mut workflow, now);
            result?;
        }
        ClientCommand::Resolve { meeting, decision } => {
            let result = workflow.resolve_request(meeting, decision, now).await;
            print_notice(&mut workflow, now);
            result?;
        }
        ClientCommand::Cancel { meeting } => {
            let result = workflow.cancel_request(meeting, now).await;
            print_notice(&mut workflow, now);
            result?;
        }
        ClientCommand::Link { mentor } => match workflow.scheduling_link(mentor, now).await? {
            Some(link) => println!("Book your session at {}", link),
            None => println!("Mentor #{} has not shared a scheduling link yet", mentor),
        },
        ClientCommand::Profile {
            name,
            email,
            phone,
            password,
            add_skills,
            remove_skills,
            scheduling_link,
        } => {
            let Some(session) = workflow.session().current(now) else {
                bail!("Not logged in");
            };
            let identity = &session.identity;
            let token = session.token.as_str();
            let update = ProfileUpdate {
                name,
                email,
                phone,
                password,
            };
            let changes_profile = update.name.is_some()
                || update.email.is_some()
                || update.phone.is_some()
                || update.password.is_some();
            let api = workflow.api();

            match identity.user_type {
                Role::Student => {
                    if !add_skills.is_empty() || !remove_skills.is_empty() || scheduling_link.is_some()
                    {
                        bail!("Only mentors have skills and scheduling links");
                    }
                    let profile = if changes_profile {
                        api.update_student(token, identity.id, &update).await?
                    } else {
                        api.student(token, identity.id).await?
                    };
                    println!("{} <{}>", profile.name, profile.email);
                    if let Some(phone) = profile.phone {
                        println!("Phone: {}", phone);
                    }
                }
                Role::Mentor => {
                    if changes_profile {
                        api.update_mentor(token, identity.id, &update).await?;
                    }
                    if !add_skills.is_empty() {
                        api.add_skills(token, identity.id, &add_skills).await?;
                    }
                    for skill in &remove_skills {
                        api.remove_skill(token, identity.id, skill).await?;
                    }
                    if let Some(link) = scheduling_link {
                        api.set_scheduling_link(token, identity.id, Some(link)).await?;
                        println!("Scheduling link updated");
                    }

                    let summary = api.mentor(identity.id).await?;
                    println!("{} <{}>", summary.name, summary.email);
                    if let Some(phone) = summary.phone {
                        println!("Phone: {}", phone);
                    }
                    println!("Skills: {}", summary.skills.join(", "));
                    match api.scheduling_link(token, identity.id).await? {
                        Some(link) => println!("Scheduling link: {}", link),
                        None => println!("Scheduling link: not set"),
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_notice<A: MeetingApi>(workflow: &mut MeetingWorkflow<A>, now: chrono::DateTime<Utc>) {
    if let Some(notice) = workflow.notice(now) {
        println!("{}", notice.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn client_subcommands_sit_at_the_top_level() {
        let cli = Cli::try_parse_from(["mentor-connect", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));

        let cli = Cli::try_parse_from(["mentor-connect", "cancel", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Client(ClientCommand::Cancel { meeting: 7 })
        ));

        let cli = Cli::try_parse_from([
            "mentor-connect",
            "profile",
            "--remove-skill",
            "Machine Learning",
        ])
        .unwrap();
        match cli.command {
            Command::Client(ClientCommand::Profile { remove_skills, .. }) => {
                assert_eq!(remove_skills, vec!["Machine Learning".to_string()])
            }
            _ => panic!("profile did not parse as a client command"),
        }
    }
}
