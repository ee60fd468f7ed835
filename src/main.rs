mod app;
mod assets;
mod cli;
mod contact;
mod content;
mod gallery;
mod listeners;
mod logging;
mod page;
mod renderer;
mod scroll_lock;
mod terminal;
mod viewer;
mod watcher;

use anyhow::Context;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(logging::default_log_path);
    logging::init(&log_path, cli.verbose)?;

    // Handle --check mode
    if cli.check {
        handle_check(&cli)?;
        return Ok(());
    }

    let mut app = app::App::new(&cli)?;
    app.run()?;

    Ok(())
}

/// Validate the content file and its screenshots without starting the TUI.
fn handle_check(cli: &cli::Cli) -> anyhow::Result<()> {
    let portfolio = content::Portfolio::load(&cli.content)
        .with_context(|| format!("checking {}", cli.content.display()))?;

    let root = cli.asset_root();
    let assets = assets::AssetIndex::scan(&root);

    println!("Content: {}", cli.content.display());
    println!("Assets:  {} ({} images)", assets.root().display(), assets.len());
    println!();

    let mut missing = 0usize;
    for project in &portfolio.projects {
        println!(
            "  {:<20} {} screenshots, {} chips",
            project.id,
            project.screenshots.len(),
            project.chips.len()
        );
        if !project.has_screenshots() {
            println!("    warning: no screenshots, gallery disabled");
        }
        for shot in &project.screenshots {
            if !assets.contains(shot.src()) {
                tracing::warn!(project = %project.id, src = shot.src(), "unresolved screenshot");
                println!("    missing: {}", shot.src());
                missing += 1;
            }
        }
    }

    println!();
    println!(
        "{} projects, {} unresolved screenshots",
        portfolio.projects.len(),
        missing
    );

    if missing > 0 {
        anyhow::bail!("{} screenshots could not be resolved", missing);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_check_missing_content_keeps_error_chain() {
        let cli = cli::Cli::try_parse_from(["folio", "/no/such/portfolio.json", "--check"]).unwrap();
        let err = handle_check(&cli).unwrap_err();

        assert!(err.to_string().starts_with("checking /no/such/portfolio.json"));
        assert!(matches!(
            err.downcast_ref::<content::ContentError>(),
            Some(content::ContentError::Io { .. })
        ));
    }

    #[test]
    fn test_check_reports_unresolved_screenshots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.json");
        std::fs::write(
            &path,
            r#"{ "projects": [ { "id": "a", "title": "A", "screenshots": [ { "src": "/gone.png" } ] } ] }"#,
        )
        .unwrap();

        let args = [OsStr::new("folio"), path.as_os_str(), OsStr::new("--check")];
        let cli = cli::Cli::try_parse_from(args).unwrap();
        let err = handle_check(&cli).unwrap_err();
        assert!(err.to_string().contains("1 screenshots"));
    }
}
