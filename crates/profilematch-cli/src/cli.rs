use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use profilematch_core::config::{Config, BASE_URL_ENV};
use profilematch_core::models::Skill;

#[derive(Debug, Parser)]
#[command(name = "profilematch", version, about = "Profile matcher API client")]
pub struct Cli {
    /// Use this bearer token instead of the stored session
    #[arg(long, global = true, env = "PROFILEMATCH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API base URL (overrides the config file)
    #[arg(long, global = true, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session token
    Login {
        #[arg(long, short)]
        username: Option<String>,
    },
    /// Clear the stored session token
    Logout,
    /// Show whether a usable session is stored
    Status,
    /// Check API health
    Health,
    /// List all profiles
    List,
    /// Show one profile
    Get { user_id: String },
    /// Search profiles
    Search { query: String },
    /// Create a profile
    Create {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        bio: Option<String>,
        /// Skill as NAME:LEVEL, repeatable
        #[arg(long = "skill", value_parser = parse_skill)]
        skills: Vec<Skill>,
    },
    /// Update fields of a profile
    Update {
        user_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        /// Replace skills; NAME:LEVEL, repeatable
        #[arg(long = "skill", value_parser = parse_skill)]
        skills: Vec<Skill>,
    },
    /// Delete a profile
    Delete { user_id: String },
}

impl Cli {
    /// Base URL for this run. `--base-url` applies only to this invocation
    /// and is never written back to the config file.
    pub fn api_base_url(&self, config: &Config) -> String {
        self.base_url.clone().unwrap_or_else(|| config.base_url())
    }
}

/// Parse `NAME:LEVEL`. The level must be an integer; its range is not checked.
pub fn parse_skill(s: &str) -> Result<Skill, String> {
    let (name, level) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected NAME:LEVEL, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing skill name in '{}'", s));
    }
    let level = level
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("skill level must be an integer in '{}'", s))?;
    Ok(Skill {
        name: name.to_string(),
        level,
    })
}

/// Read a line from stdin after printing `label` to stderr.
pub fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    let line = line.trim().to_string();
    if line.is_empty() {
        anyhow::bail!("No input given");
    }
    Ok(line)
}
