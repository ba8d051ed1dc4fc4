//! The abstract plugin template

use crate::{Plugin, PluginManifest};

/// Base plugin every hook of which is a no-op.
///
/// Useful as a starting point to copy from and as a reference for the
/// default behaviour. It reports itself as a template, so registering it
/// has no effect.
#[derive(Debug, Default, Clone, Copy)]
pub struct PluginTemplate;

impl Plugin for PluginTemplate {
    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            name: "PluginTemplate".to_string(),
            description: "Template for hatch plugins".to_string(),
            ..Default::default()
        }
    }

    fn is_template(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_marked() {
        let mut template = PluginTemplate;
        assert!(template.is_template());
        assert_eq!(template.on_response("unchanged"), "unchanged");
    }
}
