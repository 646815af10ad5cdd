use anilog_core::models::Title;
use anilog_core::repository::Repository;
use anyhow::Result;
use owo_colors::{OwoColorize, Style};

pub async fn delete_title(repo: &impl Repository, title: Title) -> Result<()> {
    let outcome = repo.delete_title(title.id).await?;
    if outcome.removed {
        println!(
            "{} Deleted title: {}",
            "✓".style(Style::new().green().bold()),
            title.name.bright_white().bold()
        );
    } else {
        println!("Title '{}' was already gone.", title.name);
    }
    Ok(())
}
