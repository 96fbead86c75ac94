use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

/// What the process should run once the command line has been handled.
#[derive(Debug, PartialEq, Eq)]
pub enum EntryPoint {
    Console,
    Server,
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_chat() -> Command {
    return Command::new("chat").about(
        "Start an interactive console chat. Uses Groq when a token is configured, otherwise the local Ollama CLI. Type 'exit' to quit.",
    );
}

fn subcommand_serve() -> Command {
    return Command::new("serve").about("Start the HTTP session service.");
}

fn arg_bool(key: ConfigKey, env: &'static str, help: String) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(help)
        .value_parser(PossibleValuesParser::new(["true", "false", "1", "0", "yes", "no"]))
        .global(true);
}

fn arg_string(key: ConfigKey, env: &'static str, help: String) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(help)
        .global(true);
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("parley")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_serve())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("PARLEY_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::Port.to_string())
                .short('p')
                .long(ConfigKey::Port.to_string())
                .env("PARLEY_PORT")
                .num_args(1)
                .help(format!("Port the HTTP session service listens on. [default: {}]", Config::default(ConfigKey::Port)))
                .global(true),
        )
        .arg(arg_string(
            ConfigKey::DataDir,
            "PARLEY_DATA_DIR",
            format!("Directory holding the session index and per-session logs. [default: {}]", Config::default(ConfigKey::DataDir)),
        ))
        .arg(arg_string(
            ConfigKey::OllamaURL,
            "PARLEY_OLLAMA_URL",
            format!("Ollama API URL used by the HTTP session service. [default: {}]", Config::default(ConfigKey::OllamaURL)),
        ))
        .arg(arg_string(
            ConfigKey::OllamaModel,
            "PARLEY_OLLAMA_MODEL",
            format!("Model to run on Ollama. [default: {}]", Config::default(ConfigKey::OllamaModel)),
        ))
        .arg(arg_string(
            ConfigKey::GroqURL,
            "PARLEY_GROQ_URL",
            format!("Groq API URL. Can be swapped to any OpenAI compatible proxy. [default: {}]", Config::default(ConfigKey::GroqURL)),
        ))
        .arg(arg_string(
            ConfigKey::GroqModel,
            "PARLEY_GROQ_MODEL",
            format!("Model to run on Groq. [default: {}]", Config::default(ConfigKey::GroqModel)),
        ))
        .arg(arg_string(
            ConfigKey::GroqToken,
            "PARLEY_GROQ_TOKEN",
            "Groq API token. Enables the Groq backend.".to_string(),
        ))
        .arg(arg_bool(
            ConfigKey::UseGroq,
            "PARLEY_USE_GROQ",
            "Use Groq as the default provider for new sessions. When unset, Groq is used whenever a token is configured.".to_string(),
        ))
        .arg(arg_bool(
            ConfigKey::RestoreSessions,
            "PARLEY_RESTORE_SESSIONS",
            format!("Reload sessions from the index file when the HTTP session service starts. [default: {}]", Config::default(ConfigKey::RestoreSessions)),
        ))
        .arg(arg_string(
            ConfigKey::BackendHealthCheckTimeout,
            "PARLEY_BACKEND_HEALTH_CHECK_TIMEOUT",
            format!("Time to wait in milliseconds before timing out when doing a healthcheck for a backend. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)),
        ));
}

pub async fn parse() -> Result<Option<EntryPoint>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(EntryPoint::Console));
        }
        Some(("serve", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(EntryPoint::Server));
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
            }
            _ => {
                subcommand_config().print_long_help()?;
            }
        },
        _ => {
            build().print_long_help()?;
        }
    }

    return Ok(None);
}
