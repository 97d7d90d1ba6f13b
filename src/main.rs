mod badge;
mod config;
mod error;
mod github;
mod logging;
mod model;
mod render;
mod retry;
mod snapshot;
mod stats;

use anyhow::{Context, Result};
use config::Config;
use github::GithubClient;
use snapshot::Snapshot;
use stats::Stats;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};

const TEMPLATE_DIR: &str = "templates";
const OUTPUT_DIR: &str = "generated";
const OVERVIEW: &str = "overview.svg";
const LANGUAGES: &str = "languages.svg";

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = logging::init("info") {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env().context("Failed loading required configuration")?;
    info!("Collecting GitHub statistics for {}", config.user);

    let client = GithubClient::new(&config.access_token);
    let mut snapshot = Snapshot::new(client, config.clone());

    let stats = snapshot.stats().await?;
    let languages = snapshot.languages().await?;

    let templates = Path::new(TEMPLATE_DIR);
    let output = Path::new(OUTPUT_DIR);
    ensure_output_dir(output)?;

    generate_overview(templates, output, &stats)?;
    generate_languages(templates, output, languages, config.include_profile_views)?;

    info!(
        "Generated {} and {}",
        output.join(OVERVIEW).display(),
        output.join(LANGUAGES).display()
    );

    Ok(())
}

fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

fn read_template(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    fs::read_to_string(&path)
        .with_context(|| format!("Failed to read template {}", path.display()))
}

fn write_output(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

fn generate_overview(templates: &Path, output: &Path, stats: &Stats) -> Result<()> {
    let template = read_template(templates, OVERVIEW)?;
    write_output(output, OVERVIEW, &render::render_overview(&template, stats))
}

fn generate_languages(
    templates: &Path,
    output: &Path,
    languages: &HashMap<String, model::LanguageStat>,
    include_profile_views: bool,
) -> Result<()> {
    let template = read_template(templates, LANGUAGES)?;
    let rendered = render::render_languages(&template, languages, include_profile_views);
    write_output(output, LANGUAGES, &rendered)
}
