//! Prompt loader: built-in definitions with workspace overrides.

use crate::types::{PromptDefinition, PromptOrigin};
use peerconnect_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Prompt used to label a user's mood entry.
pub const TONE_ENTRY_PROMPT_ID: &str = "tone.entry";

/// Prompt used to label an ingested article.
pub const TONE_ARTICLE_PROMPT_ID: &str = "tone.article";

const TONE_ENTRY_TEMPLATE: &str =
    "Classify the emotional tone of this entry in 1-2 words:\n\"{{text}}\"\nTone:";

const TONE_ARTICLE_TEMPLATE: &str =
    "What is the emotional tone of this text? Respond with one word:\n\n{{text}}";

/// All prompts compiled into the binary.
pub fn builtin_prompts() -> Vec<PromptDefinition> {
    vec![
        PromptDefinition {
            id: TONE_ENTRY_PROMPT_ID.to_string(),
            title: "Mood entry tone".to_string(),
            api_version: "1.0".to_string(),
            system: None,
            template: TONE_ENTRY_TEMPLATE.to_string(),
        },
        PromptDefinition {
            id: TONE_ARTICLE_PROMPT_ID.to_string(),
            title: "Article tone".to_string(),
            api_version: "1.0".to_string(),
            system: None,
            template: TONE_ARTICLE_TEMPLATE.to_string(),
        },
    ]
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".peerconnect").join("prompts")
}

/// Load a prompt definition by ID.
///
/// A file named `<id>.yml` in `.peerconnect/prompts/` replaces the built-in
/// definition of the same ID.
///
/// # Example
/// ```no_run
/// use peerconnect_prompt::{load_prompt, TONE_ENTRY_PROMPT_ID};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (prompt, _origin) = load_prompt(Path::new("."), TONE_ENTRY_PROMPT_ID)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(
    workspace_path: &Path,
    prompt_id: &str,
) -> AppResult<(PromptDefinition, PromptOrigin)> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);
        let definition = read_prompt_file(&prompt_file)?;

        if definition.id != prompt_id {
            return Err(AppError::Prompt(format!(
                "Prompt file {:?} declares id '{}', expected '{}'",
                prompt_file, definition.id, prompt_id
            )));
        }

        tracing::info!("Using workspace prompt: {} ({})", definition.id, definition.title);
        return Ok((definition, PromptOrigin::Workspace));
    }

    builtin_prompts()
        .into_iter()
        .find(|p| p.id == prompt_id)
        .map(|p| (p, PromptOrigin::Builtin))
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))
}

fn read_prompt_file(path: &Path) -> AppResult<PromptDefinition> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", path, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
