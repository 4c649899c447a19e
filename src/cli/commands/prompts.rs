//! Prompts command - list registered templates.

use console::style;

use crate::config::Settings;
use crate::pipeline::build_prompt_registry;
use crate::prompts::PromptRegistry;

pub fn run(config: &Settings) -> anyhow::Result<()> {
    let registry = build_prompt_registry(config)?;
    print!("{}", format_listing(&registry, &config.llm.model));
    Ok(())
}

/// One line per (model, language) pair, the active model marked with `*`.
fn format_listing(registry: &PromptRegistry, active_model: &str) -> String {
    let mut out = format!("{} prompt template(s):\n", registry.len());
    for (model, language) in registry.keys() {
        let marker = if model == active_model { "*" } else { " " };
        out.push_str(&format!(
            "{marker} {model} [{}]\n",
            style(language).cyan()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::builtin::BIELIK_11B_INSTRUCT;

    #[test]
    fn test_listing_marks_active_model() {
        console::set_colors_enabled(false);
        let registry = PromptRegistry::with_builtin();
        let listing = format_listing(&registry, BIELIK_11B_INSTRUCT);

        assert!(listing.starts_with(&format!("{} prompt template(s)", registry.len())));
        assert!(listing.contains(&format!("* {BIELIK_11B_INSTRUCT} [polish]")));
        assert_eq!(listing.matches('*').count(), 1);
    }
}
