//! Command execution handlers
//!
//! `execute_command` works on the process-wide configuration;
//! `execute_command_with_config` takes any `GlobalConfig` so tests can run
//! commands against a temporary directory.

use crate::analytics::AnalyticsEvent;
use crate::application::cli::{AnalyticsCommand, ConfigCommand, LoggingCommand};
use crate::application::config::LOGGING_VERBOSITY_ENV;
use crate::application::{CliConfig, Commands};
use crate::config::instance::lock;
use crate::config::{CONFIG_PATH_ENV, ENV_PREFIX, GlobalConfig, STORE_ENV_PREFIX, StoreConfig};
use crate::display;
use crate::logger::Logger;
use crate::primitives::{ConfigError, LogLevel};
use anyhow::{Context, Result, bail};

/// Store options of `keel config set`
#[derive(Debug, Clone, Default)]
pub struct StoreArgs {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub project: Option<String>,
    pub local_store: bool,
}

pub fn execute_command(config: CliConfig) -> Result<()> {
    Logger::init(config.app_config.to_logger_config()).context("Failed to initialize logging")?;

    let command = match config.command {
        Some(cmd) => cmd,
        None => {
            display::message("keel - global configuration manager");
            display::subtle("Run 'keel --help' for usage information");
            return Ok(());
        }
    };

    let shared = GlobalConfig::instance().context("Failed to load the global configuration")?;
    let mut global = lock(&shared);
    execute_command_with_config(command, &mut global)
}

/// Execute a command against an explicit configuration (for testing)
pub fn execute_command_with_config(command: Commands, config: &mut GlobalConfig) -> Result<()> {
    match command {
        Commands::Analytics { action } => match action {
            AnalyticsCommand::Get => handle_analytics_get(config),
            AnalyticsCommand::OptIn => handle_analytics_opt(config, true),
            AnalyticsCommand::OptOut => handle_analytics_opt(config, false),
        },
        Commands::Logging {
            action: LoggingCommand::SetVerbosity { verbosity },
        } => handle_set_verbosity(&verbosity),
        Commands::Config { action } => match action {
            ConfigCommand::Describe => handle_describe(config),
            ConfigCommand::Explain => handle_explain(config),
            ConfigCommand::Set {
                url,
                username,
                password,
                project,
                local_store,
            } => handle_config_set(
                config,
                StoreArgs {
                    url,
                    username,
                    password,
                    project,
                    local_store,
                },
            ),
        },
    }
}

fn handle_analytics_get(config: &GlobalConfig) -> Result<()> {
    let state = if config.analytics_opt_in() {
        "opted in"
    } else {
        "opted out"
    };
    display::info(&format!("Analytics are currently {state}."));
    Ok(())
}

fn handle_analytics_opt(config: &mut GlobalConfig, opt_in: bool) -> Result<()> {
    config
        .set_analytics_opt_in(opt_in)
        .context("Failed to update the analytics setting")?;

    if opt_in {
        config.track_event(AnalyticsEvent::OptInAnalytics, None);
        display::success("Analytics", "opted in");
    } else {
        config.track_event(AnalyticsEvent::OptOutAnalytics, None);
        display::success("Analytics", "opted out");
    }
    Ok(())
}

fn handle_set_verbosity(verbosity: &str) -> Result<()> {
    let level = LogLevel::parse_verbosity(verbosity)?;
    let name = level.verbosity_name();

    display::success("Logging verbosity", &name);
    display::subtle(&format!(
        "Export {LOGGING_VERBOSITY_ENV}={name} to apply it to later keel commands"
    ));
    Ok(())
}

fn handle_describe(config: &mut GlobalConfig) -> Result<()> {
    display::section("Global configuration");
    display::message(&format!(
        "Config file: {}",
        config.config_file().display()
    ));

    match config.store_config() {
        Some(store) => {
            display::message("Store:");
            for (key, value) in store.describe() {
                display::key_value(&key, &value);
            }
        }
        None => display::info("No store configured yet; the default local store is used on first use."),
    }

    match config.active_stack_id() {
        Some(stack_id) => match config.zen_store()?.get_stack(stack_id) {
            Ok(stack) => display::success("Active stack", &format!("'{}' (global)", stack.name)),
            Err(e) if e.is_not_found() => {
                display::warning(&format!("Active stack {stack_id} no longer exists"))
            }
            Err(e) => return Err(e.into()),
        },
        None => display::info("No active stack is set."),
    }

    match config.active_project() {
        Ok(project) => display::success("Active project", &format!("'{}' (global)", project.name)),
        Err(ConfigError::NoActiveProject) => display::warning(&ConfigError::NoActiveProject.to_string()),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn handle_explain(config: &GlobalConfig) -> Result<()> {
    display::section("How keel finds its configuration");
    let lines = [
        format!("Settings are stored in {}", config.config_file().display()),
        format!("{CONFIG_PATH_ENV} moves the configuration directory"),
        format!(
            "{ENV_PREFIX}<FIELD> overrides a single setting for reads only, e.g. {ENV_PREFIX}USER_EMAIL"
        ),
        format!(
            "{STORE_ENV_PREFIX}<PARAM> variables define the default store, e.g. {STORE_ENV_PREFIX}URL"
        ),
        "Without a configured store, a local store under local_stores/default_store is created on first use".to_string(),
    ];
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    display::list(&lines);
    Ok(())
}

fn handle_config_set(config: &mut GlobalConfig, args: StoreArgs) -> Result<()> {
    if args.local_store {
        config
            .set_default_store()
            .context("Failed to set up the default store")?;
        display::success("Store", "using the default local store");
    } else if let Some(url) = args.url {
        let store = StoreConfig::from_url(url).with_credentials(args.username, args.password);
        store.validate()?;
        let target = store.url.clone();
        config
            .set_store(store, false)
            .with_context(|| format!("Failed to connect to the store at {target}"))?;
        display::success("Store", &format!("connected to {target}"));
    } else if args.project.is_none() {
        bail!("Provide `--url` to connect to a store or `--local-store` to use the default one");
    }

    if let Some(name) = args.project {
        let project = config
            .zen_store()?
            .get_project(&name)
            .with_context(|| format!("Project '{name}' does not exist in the connected store"))?;
        config.set_active_project(project)?;
        display::success("Active project", &name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    include!("commands.test.rs");
}
