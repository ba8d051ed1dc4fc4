//! Plugin management commands

use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use hatch_core::plugins::{
    BindOnlyGenerator, CandidateKind, ClientProjectConfig, Convention, PluginCandidate,
};
use hatch_core::{
    PluginHost, PluginHostConfig, PluginPolicy, PluginPrompt, PolicyOnlyPrompt, TerminalPrompt,
    init_plugins,
};

use crate::config::{ConfigLoader, HatchConfig, PolicyList};

/// Plugin management arguments
#[derive(Args)]
pub struct PluginArgs {
    #[command(subcommand)]
    pub command: PluginCommands,
}

/// Plugin subcommands
#[derive(Subcommand)]
pub enum PluginCommands {
    /// List discovered plugins and their policy status (loads and writes nothing)
    List,
    /// Discover and activate plugins
    Init {
        /// Never ask; only allow-listed plugins are activated
        #[arg(long)]
        no_prompt: bool,
    },
    /// Add a plugin to the allow list
    Allow {
        /// Plugin name (its directory name)
        name: String,
        /// Edit the project config instead of the user config
        #[arg(long)]
        project: bool,
    },
    /// Add a plugin to the deny list
    Deny {
        /// Plugin name (its directory name)
        name: String,
        /// Edit the project config instead of the user config
        #[arg(long)]
        project: bool,
    },
}

/// Run plugin command
pub fn run(args: PluginArgs) -> Result<()> {
    match args.command {
        PluginCommands::List => list_plugins(&ConfigLoader::load()?),
        PluginCommands::Init { no_prompt } => init(ConfigLoader::load()?, no_prompt),
        PluginCommands::Allow { name, project } => update_policy(&name, PolicyList::Allow, project),
        PluginCommands::Deny { name, project } => update_policy(&name, PolicyList::Deny, project),
    }
}

fn host_for(config: &HatchConfig) -> PluginHost {
    PluginHost::new(PluginHostConfig {
        plugins_root: config.plugins.dir.clone(),
        client_config: ClientProjectConfig::default(),
    })
}

/// Policy status shown next to a plugin name
fn policy_status(policy: &PluginPolicy, name: &str) -> &'static str {
    if policy.is_denied(name) {
        "denied"
    } else if policy.is_allowed(name) {
        "allowed"
    } else {
        "ask"
    }
}

fn source_of(candidate: &PluginCandidate) -> String {
    match &candidate.kind {
        CandidateKind::CodeArchive { archive_path, .. } => archive_path.display().to_string(),
        CandidateKind::ApiSpec(bundle) => bundle.client.base_url().to_string(),
    }
}

fn list_plugins(config: &HatchConfig) -> Result<()> {
    let host = host_for(config).with_generator(Box::new(BindOnlyGenerator));
    let policy = &config.plugins.policy;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Convention").fg(Color::Cyan),
        Cell::new("Policy").fg(Color::Cyan),
        Cell::new("Source").fg(Color::Cyan),
    ]);

    let mut found = 0;
    for convention in [Convention::ApiSpec, Convention::CodeArchive] {
        let catalog = match host.discover(convention) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(%convention, error = %e, "Cannot scan plugin directory");
                continue;
            }
        };

        for candidate in catalog.candidates.values() {
            found += 1;
            table.add_row(vec![
                Cell::new(&candidate.name),
                Cell::new(convention),
                Cell::new(policy_status(policy, &candidate.name)),
                Cell::new(source_of(candidate)),
            ]);
        }

        for rejected in &catalog.rejected {
            found += 1;
            table.add_row(vec![
                Cell::new(&rejected.name),
                Cell::new(convention),
                Cell::new("error").fg(Color::Red),
                Cell::new(rejected.error.to_string()),
            ]);
        }
    }

    if found == 0 {
        let root = host.plugins_root().display();
        println!("No plugins found");
        println!();
        println!("Plugin root: {root}");
        println!();
        println!("To install a plugin:");
        println!("  code archive: {root}/generic/<name>/<name>.zip");
        println!("  remote API:   {root}/openai/<name>/openapi.yaml");
        return Ok(());
    }

    println!("{table}");
    Ok(())
}

fn init(mut config: HatchConfig, no_prompt: bool) -> Result<()> {
    let host = host_for(&config);

    let mut prompt: Box<dyn PluginPrompt> = if no_prompt || !config.plugins.prompt {
        Box::new(PolicyOnlyPrompt)
    } else {
        Box::new(TerminalPrompt)
    };

    init_plugins(&host, &mut config, prompt.as_mut())?;

    if config.activated.is_empty() {
        println!("No plugins activated");
        return Ok(());
    }

    println!("Activated {} plugin(s):", config.activated.len());
    for plugin in &config.activated {
        println!("  [{}] {}", plugin.convention(), plugin.summary());
    }
    Ok(())
}

fn update_policy(name: &str, list: PolicyList, project: bool) -> Result<()> {
    let path = if project {
        ConfigLoader::project_config_path()
    } else {
        ConfigLoader::user_config_path()
            .ok_or_else(|| anyhow!("Could not determine user config path"))?
    };

    ConfigLoader::update_policy(&path, name, list)?;

    let verb = match list {
        PolicyList::Allow => "Allowed",
        PolicyList::Deny => "Denied",
    };
    println!("{verb} plugin: {name} ({})", path.display());
    Ok(())
}
