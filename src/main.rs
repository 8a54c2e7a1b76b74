use anyhow::Result;
use colored::Colorize;
use route_limit_patcher::{run, FileStatus};
use std::path::Path;

/// Fixed configuration: the tool takes no arguments, flags, or environment
/// variables. The route tree lives under `<PROJECT_ROOT>/app/api`.
const PROJECT_ROOT: &str = "/srv/servicedesk";

fn main() -> Result<()> {
    let project_root = Path::new(PROJECT_ROOT);

    println!(
        "{}",
        "Applying rate limiting to all API routes...".bold()
    );
    println!();

    let report = run(project_root);

    println!("Found {} API route files", report.total());
    println!();

    for file in &report.files {
        let relative = file
            .path
            .strip_prefix(project_root)
            .unwrap_or(&file.path)
            .display();
        match &file.status {
            FileStatus::Updated { import_missing, .. } => {
                if *import_missing {
                    println!("{} {}: {}", "✓".green(), relative, file.status.to_string().yellow());
                } else {
                    println!("{} {}: {}", "✓".green(), relative, file.status);
                }
            }
            FileStatus::AlreadyPatched | FileStatus::Unchanged => {
                println!("{} {}: {}", "⊘".cyan(), relative, file.status);
            }
            FileStatus::Error(_) => {
                eprintln!("{} {}: {}", "✗".red(), relative, file.status);
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} updated", format!("{}", report.updated).green());
    println!("  {} skipped", format!("{}", report.skipped).cyan());
    println!("  {} errors", format!("{}", report.errors).red());
    println!("  {} total", report.total());

    // Per-file errors are informational; the batch itself succeeded.
    Ok(())
}
