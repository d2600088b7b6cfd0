//! postboi-post - Publish one image to several platforms at once

use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use libpostboi::adjust::is_remote;
use libpostboi::{summarize, Config, PostboiError, PublishRequest, Result, Workflow};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "postboi-post")]
#[command(version)]
#[command(about = "Publish an image with a caption to multiple platforms")]
#[command(long_about = "\
postboi-post - Publish an image with a caption to multiple platforms

DESCRIPTION:
    Adjusts the caption and image for each selected platform, posts them
    concurrently and retries each platform independently on failure.
    A summary of every platform's outcome is printed to stdout.

USAGE:
    # Post to the platforms listed in [defaults]
    postboi-post photo.jpg \"Golden hour at the pier #sunset\"

    # Pick platforms explicitly
    postboi-post photo.jpg \"New menu!\" --platform blog,business_account

    # Read the caption from stdin
    cat caption.txt | postboi-post photo.jpg

    # Instagram can fetch an image that is already online
    postboi-post https://cdn.example.com/photo.jpg \"Hello\" --platform instagram

    # JSON report for scripting
    postboi-post photo.jpg \"Hello\" --format json | jq '.results.page.success'

PLATFORMS:
    blog              WordPress site          (alias: wordpress)
    page              Facebook page           (alias: facebook)
    business_account  Instagram business      (alias: instagram)

CONFIGURATION:
    Configuration file: ~/.config/postboi/config.toml
    Override with --config or the POSTBOI_CONFIG environment variable.

EXIT CODES:
    0 - Every platform succeeded
    1 - At least one platform failed, or configuration error
    2 - Authentication error
    3 - Invalid input (no platforms, unknown platform, missing image)
")]
struct Cli {
    /// Image file to publish, or an http(s) URL for Instagram
    image: PathBuf,

    /// Caption text (reads from stdin if not provided)
    caption: Option<String>,

    /// Target platform(s) (comma-separated)
    #[arg(short, long, value_name = "PLATFORMS")]
    #[arg(help = "Platforms to publish to, comma-separated (default: [defaults].platforms)")]
    platform: Option<String>,

    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Override [workflow].max_attempts
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,

    /// Override [workflow].max_workers
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libpostboi::logging::init_default(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Returns whether every platform succeeded
async fn run(cli: Cli) -> Result<bool> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    if let Some(max_attempts) = cli.max_attempts {
        config.workflow.max_attempts = max_attempts;
    }
    if let Some(workers) = cli.workers {
        config.workflow.max_workers = workers;
    }
    config.workflow.validate()?;

    let platforms = selected_platforms(cli.platform.as_deref(), &config);
    let caption = read_caption(cli.caption)?;

    let request = PublishRequest::parse(&cli.image, caption, &platforms)?;
    if !is_remote(&cli.image) && !cli.image.is_file() {
        return Err(PostboiError::InvalidInput(format!(
            "Image not found: {}",
            cli.image.display()
        )));
    }
    debug!(platforms = ?request.platforms, "Publishing");

    let report = Workflow::new(&config).run(request).await?;

    match cli.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&report).map_err(|e| {
                PostboiError::InvalidInput(format!("Failed to serialize report: {}", e))
            })?;
            println!("{}", json);
        }
        _ => print!("{}", summarize(&report)),
    }

    Ok(report.all_succeeded())
}

/// Platform names from `--platform`, else `[defaults]`, else every enabled section
fn selected_platforms(flag: Option<&str>, config: &Config) -> Vec<String> {
    if let Some(list) = flag {
        return list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
    }

    if !config.defaults.platforms.is_empty() {
        return config.defaults.platforms.clone();
    }

    config
        .enabled_platforms()
        .into_iter()
        .map(|platform| platform.as_str().to_string())
        .collect()
}

fn read_caption(arg: Option<String>) -> Result<String> {
    if let Some(caption) = arg {
        return Ok(caption);
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(PostboiError::InvalidInput(
            "No caption provided. Pass it as an argument or pipe it via stdin".to_string(),
        ));
    }

    let mut caption = String::new();
    stdin.lock().read_to_string(&mut caption).map_err(|e| {
        PostboiError::InvalidInput(format!("Failed to read caption from stdin: {}", e))
    })?;
    Ok(caption.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_flag_split() {
        let config = Config::default();
        assert_eq!(
            selected_platforms(Some("blog, page,,"), &config),
            vec!["blog".to_string(), "page".to_string()]
        );
        assert!(selected_platforms(Some(""), &config).is_empty());
    }

    #[test]
    fn test_defaults_then_enabled_sections() {
        let config = Config::from_toml(
            r#"
            [facebook]
            enabled = true
            page_id = "1"
            access_token = "t"
            "#,
        )
        .unwrap();
        assert_eq!(selected_platforms(None, &config), vec!["page".to_string()]);

        let config = Config::from_toml(
            r#"
            [defaults]
            platforms = ["instagram"]
            "#,
        )
        .unwrap();
        assert_eq!(selected_platforms(None, &config), vec!["instagram".to_string()]);
    }

    #[test]
    fn test_caption_argument_wins() {
        assert_eq!(read_caption(Some("hi".to_string())).unwrap(), "hi");
    }
}
