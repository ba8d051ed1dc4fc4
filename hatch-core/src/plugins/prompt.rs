//! Operator confirmation for plugins on neither policy list

use std::io::IsTerminal;

use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;

/// Asks whether an unlisted plugin should be activated
pub trait PluginPrompt {
    fn confirm(&mut self, plugin_name: &str) -> bool;
}

impl<F> PluginPrompt for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, plugin_name: &str) -> bool {
        self(plugin_name)
    }
}

/// Interactive yes/no question on the terminal.
///
/// Answers "no" when stdin is not a terminal or the prompt fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl PluginPrompt for TerminalPrompt {
    fn confirm(&mut self, plugin_name: &str) -> bool {
        if !std::io::stdin().is_terminal() {
            tracing::warn!(plugin = %plugin_name, "Not in the allow list and no terminal to ask, skipping");
            return false;
        }

        let answer = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Plugin {plugin_name} found but not in the allow list. Load?"
            ))
            .default(false)
            .interact();

        match answer {
            Ok(load) => load,
            Err(e) => {
                tracing::warn!(plugin = %plugin_name, error = %e, "Prompt failed, skipping");
                false
            }
        }
    }
}

/// Declines every unlisted plugin; only the allow list activates anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct PolicyOnlyPrompt;

impl PluginPrompt for PolicyOnlyPrompt {
    fn confirm(&mut self, plugin_name: &str) -> bool {
        tracing::info!(plugin = %plugin_name, "Not in the allow list, skipping");
        false
    }
}
