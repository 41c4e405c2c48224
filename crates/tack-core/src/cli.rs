use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::category::CategoryFilter;
use crate::commands::{expand_command_abbrev, known_command_names};
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tack",
    version,
    about = "tack: a small categorized to-do list",
    disable_help_subcommand = true,
    arg_required_else_help = false
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "tackrc")]
    pub tackrc: Option<PathBuf>,

    /// Task file to use instead of `data.file`.
    #[arg(long = "file")]
    pub file: Option<PathBuf>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<OsString>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` / `rc.key:value` overrides out of argv.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub filter: CategoryFilter,
    pub command: String,
    pub command_args: Vec<String>,
}

impl Invocation {
    #[tracing::instrument(skip(cfg, rest))]
    pub fn parse(cfg: &Config, rest: Vec<OsString>) -> anyhow::Result<Self> {
        let tokens: Vec<String> = rest
            .into_iter()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect();
        Self::from_tokens(cfg, tokens)
    }

    pub fn from_tokens(cfg: &Config, tokens: Vec<String>) -> anyhow::Result<Self> {
        let (filter_terms, command, command_args) = split_filter_command(&tokens);

        let filter = match filter_terms.as_slice() {
            [] => CategoryFilter::All,
            [term] => term
                .parse::<CategoryFilter>()
                .with_context(|| format!("invalid filter: {term}"))?,
            [_, second, ..] => {
                return Err(anyhow!(
                    "expected at most one category filter, also got: {second}"
                ));
            }
        };

        let command = match command {
            Some(command) => command,
            None => {
                let cmd = cfg
                    .get("default.command")
                    .unwrap_or_else(|| "list".to_string());
                debug!(command = %cmd, "no explicit command, using default");
                cmd
            }
        };

        Ok(Self {
            filter,
            command,
            command_args,
        })
    }
}

fn split_filter_command(tokens: &[String]) -> (Vec<String>, Option<String>, Vec<String>) {
    let known = known_command_names();

    for (i, token) in tokens.iter().enumerate() {
        if let Some(full) = expand_command_abbrev(token, &known) {
            debug!(
                token = %token,
                expanded = %full,
                split_index = i,
                "resolved command token"
            );
            return (
                tokens[..i].to_vec(),
                Some(full.to_string()),
                tokens[i + 1..].to_vec(),
            );
        }
    }

    (tokens.to_vec(), None, vec![])
}

#[cfg(test)]
mod tests {
    use super::{Invocation, preprocess_args};
    use crate::category::{Category, CategoryFilter};
    use crate::config::Config;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn filter_precedes_command_and_prefixes_expand() {
        let cfg = Config::default();
        let inv = Invocation::from_tokens(&cfg, tokens(&["work", "don", "2"])).expect("parse");
        assert_eq!(inv.filter, CategoryFilter::Only(Category::Work));
        assert_eq!(inv.command, "done");
        assert_eq!(inv.command_args, vec!["2".to_string()]);
    }

    #[test]
    fn words_after_the_command_are_arguments() {
        let cfg = Config::default();
        let inv = Invocation::from_tokens(&cfg, tokens(&["add", "list", "groceries"]))
            .expect("parse");
        assert_eq!(inv.filter, CategoryFilter::All);
        assert_eq!(inv.command, "add");
        assert_eq!(inv.command_args, tokens(&["list", "groceries"]));
    }

    #[test]
    fn bare_filter_uses_default_command() {
        let cfg = Config::default();
        let inv = Invocation::from_tokens(&cfg, tokens(&["study"])).expect("parse");
        assert_eq!(inv.filter, CategoryFilter::Only(Category::Study));
        assert_eq!(inv.command, "list");
    }

    #[test]
    fn unknown_filter_and_ambiguous_prefix_fail() {
        let cfg = Config::default();
        assert!(Invocation::from_tokens(&cfg, tokens(&["chores", "list"])).is_err());
        // "d" matches both done and delete, so it is read as a filter term.
        assert!(Invocation::from_tokens(&cfg, tokens(&["d"])).is_err());
    }

    #[test]
    fn positional_rc_overrides_are_extracted() {
        let raw: Vec<std::ffi::OsString> = vec![
            "tack".into(),
            "rc.color=off".into(),
            "list".into(),
            "rc.default.category:work".into(),
        ];
        let pre = preprocess_args(&raw).expect("preprocess");
        assert_eq!(pre.cleaned_args.len(), 2);
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.color".to_string(), "off".to_string()),
                ("rc.default.category".to_string(), "work".to_string()),
            ]
        );
    }
}
