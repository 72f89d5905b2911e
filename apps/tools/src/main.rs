use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use shared::domain::{SpeakerId, TrackId};
use storage::{NewSession, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/conference.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateTrack {
        name: String,
    },
    CreateSpeaker {
        name: String,
        #[arg(long, default_value = "")]
        bio: String,
        #[arg(long)]
        web_site: Option<String>,
    },
    CreateSession {
        title: String,
        #[arg(long = "abstract", default_value = "")]
        abstract_text: String,
        /// RFC 3339, e.g. 2024-05-01T09:00:00Z
        #[arg(long)]
        starts_at: Option<DateTime<Utc>>,
        #[arg(long)]
        ends_at: Option<DateTime<Utc>>,
        #[arg(long)]
        track_id: Option<i64>,
        #[arg(long = "speaker-id")]
        speaker_ids: Vec<i64>,
    },
    ListSessions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::CreateTrack { name } => {
            let track_id = storage.create_track(&name).await?;
            println!("created track_id={track_id}");
        }
        Command::CreateSpeaker {
            name,
            bio,
            web_site,
        } => {
            let speaker_id = storage
                .create_speaker(&name, &bio, web_site.as_deref())
                .await?;
            println!("created speaker_id={speaker_id}");
        }
        Command::CreateSession {
            title,
            abstract_text,
            starts_at,
            ends_at,
            track_id,
            speaker_ids,
        } => {
            if let (Some(start), Some(end)) = (starts_at, ends_at) {
                if end < start {
                    bail!("--ends-at must not be before --starts-at");
                }
            }
            let track_id = track_id.map(TrackId);
            if let Some(track_id) = track_id {
                if !storage.track_exists(track_id).await? {
                    bail!("unknown track_id={track_id}");
                }
            }
            let speaker_ids: Vec<SpeakerId> = speaker_ids.into_iter().map(SpeakerId).collect();
            for speaker_id in &speaker_ids {
                if !storage.speaker_exists(*speaker_id).await? {
                    bail!("unknown speaker_id={speaker_id}");
                }
            }

            let session_id = storage
                .create_session(&NewSession {
                    title: &title,
                    abstract_text: &abstract_text,
                    starts_at,
                    ends_at,
                    track_id,
                    speaker_ids: &speaker_ids,
                })
                .await?;
            println!("created session_id={session_id}");
        }
        Command::ListSessions => {
            for session in storage.list_sessions().await? {
                let starts_at = session
                    .starts_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "unscheduled".to_string());
                println!("{}\t{}\t{}", session.session_id, starts_at, session.title);
            }
        }
    }

    Ok(())
}
