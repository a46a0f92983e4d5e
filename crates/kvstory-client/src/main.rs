//! `kvstory`: command-line front end for the story API.
//!
//! # Usage
//!
//! ```
//! kvstory --url http://localhost:8787 list
//! kvstory get 42
//! kvstory save --title "标题" --content "正文"
//! kvstory delete 42
//! ```

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kvstory_client::{ApiConfig, StoryClient};
use kvstory_core::{Story, story::now_timestamp};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "kvstory", about = "Command-line client for the kvstory API")]
struct Args {
  /// Path to a TOML config file (url, timeout_secs).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the kvstory server (default: http://localhost:8787).
  #[arg(long, env = "KVSTORY_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List every story.
  List,
  /// Show one story.
  Get { id: String },
  /// Create a story, or update it if the id already exists.
  Save {
    /// Story id; a random one is generated when omitted.
    #[arg(long)]
    id:         Option<String>,
    #[arg(long)]
    title:      String,
    #[arg(long)]
    content:    String,
    #[arg(long)]
    intro:      Option<String>,
    #[arg(long)]
    author:     Option<String>,
    #[arg(long)]
    story_type: Option<String>,
    #[arg(long)]
    cover:      Option<String>,
  },
  /// Delete a story.
  Delete { id: String },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:          String,
  timeout_secs: Option<u64>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let defaults = ApiConfig::default();
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or(defaults.base_url),
    timeout:  file_cfg
      .timeout_secs
      .map(Duration::from_secs)
      .unwrap_or(defaults.timeout),
  };

  let client = StoryClient::new(api_config)?;
  run(&client, args.command).await
}

async fn run(client: &StoryClient, command: Command) -> Result<()> {
  match command {
    Command::List => {
      let stories = client.fetch_stories().await?;
      for story in &stories {
        println!("{}\t{}\t{}", story.id, story.title, story.update_time);
      }
      eprintln!("{} stories", client.story_count());
    }
    Command::Get { id } => {
      let story = client.fetch_story_by_id(&id).await?;
      println!("{}", serde_json::to_string_pretty(&story)?);
    }
    Command::Save {
      id,
      title,
      content,
      intro,
      author,
      story_type,
      cover,
    } => {
      let existing = match &id {
        Some(id) => client.fetch_story_by_id(id).await.ok(),
        None => None,
      };
      let is_update = existing.is_some();

      let mut story = existing.unwrap_or_else(|| {
        let now = now_timestamp();
        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Story {
          create_time: now.clone(),
          update_time: now,
          ..Story::new(id, "", "")
        }
      });
      story.title = title;
      story.content = content;
      if let Some(v) = intro {
        story.intro = v;
      }
      if let Some(v) = author {
        story.author = v;
      }
      if let Some(v) = story_type {
        story.story_type = v;
      }
      if let Some(v) = cover {
        story.cover = v;
      }

      if is_update {
        client.update_story(&mut story).await?;
      } else {
        client.save_story(&story).await?;
      }
      println!("{}", story.id);
    }
    Command::Delete { id } => {
      client.delete_story(&id).await?;
      eprintln!("deleted {id}");
    }
  }
  Ok(())
}
