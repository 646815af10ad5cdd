use anilog_core::error::CoreError;
use anilog_core::models::Title;
use anilog_core::repository::Repository;
use anyhow::{anyhow, Result};

/// Resolves a user-typed reference: an exact title name, or an id prefix of
/// at least two characters.
pub async fn resolve_title(repo: &impl Repository, reference: &str) -> Result<Title> {
    if let Some(title) = repo.find_title_by_name(reference).await? {
        return Ok(title);
    }

    if reference.trim().len() < 2 {
        return Err(anyhow!(CoreError::Validation(
            "ID prefix must be at least 2 characters long.".to_string()
        )));
    }

    let mut titles = repo.find_titles_by_id_prefix(reference.trim()).await?;
    match titles.len() {
        0 => Err(anyhow!(CoreError::NotFound(format!(
            "No title named '{}' or with that ID prefix",
            reference
        )))),
        1 => Ok(titles.remove(0)),
        _ => {
            let candidates: Vec<(String, String)> = titles
                .into_iter()
                .map(|t| (t.id.to_string(), t.name))
                .collect();
            Err(anyhow!(CoreError::AmbiguousId(candidates)))
        }
    }
}
