use std::str::FromStr;

use clap::{Parser, ValueEnum};
use url::Url;

use crate::config::{HubConfig, Runtime};
use crate::loader::ValidationPolicy;
use crate::prelude::*;
use crate::quality::Thresholds;

const OPTIONS: [&str; 9] = [
    "data.policy",
    "hub.endpoint",
    "hub.private",
    "hub.repo-id",
    "hub.revision",
    "hub.split",
    "quality.max-question-length",
    "quality.min-question-length",
    "runtime.num-jobs",
];

/// Get and set config options.
#[derive(Debug, Parser)]
pub(crate) struct Config {
    /// Get the value for the given key.
    #[arg(long, conflicts_with_all = ["value", "unset", "set"])]
    get: bool,

    /// Remove the key from the config (reset it to its default).
    #[arg(long, conflicts_with_all = ["value", "get", "set"])]
    unset: bool,

    /// Set the value for the given key.
    #[arg(long, requires = "value", conflicts_with_all = ["get", "unset"])]
    set: bool,

    /// List all supported config options and their values.
    #[arg(long, conflicts_with_all = ["get", "unset", "set", "name"])]
    list: bool,

    /// The name of the config option.
    #[arg(required_unless_present = "list")]
    name: Option<String>,

    /// The (new) value of the config option.
    #[arg(conflicts_with_all = ["get", "unset"])]
    value: Option<String>,
}

#[inline]
fn print_option<T>(key: &str, value: Option<T>)
where
    T: ToString,
{
    println!(
        "{key} = {}",
        match value {
            Some(value) => value.to_string(),
            None => "None".to_string(),
        }
    );
}

#[inline]
fn parse<T: FromStr>(value: &str) -> DatasetResult<T> {
    match value.parse::<T>() {
        Ok(value) => Ok(value),
        Err(_) => bail!("invalid value `{value}`"),
    }
}

fn get(config: &crate::config::Config, name: &str) -> Option<String> {
    match name {
        "data.policy" => config
            .data
            .policy
            .to_possible_value()
            .map(|value| value.get_name().to_string()),
        "hub.endpoint" => Some(config.hub.endpoint.to_string()),
        "hub.private" => Some(config.hub.private.to_string()),
        "hub.repo-id" => config.hub.repo_id.clone(),
        "hub.revision" => Some(config.hub.revision.clone()),
        "hub.split" => Some(config.hub.split.clone()),
        "quality.max-question-length" => {
            Some(config.quality.max_question_length.to_string())
        }
        "quality.min-question-length" => {
            Some(config.quality.min_question_length.to_string())
        }
        "runtime.num-jobs" => config
            .runtime
            .as_ref()
            .and_then(|rt| rt.num_jobs)
            .map(|n| n.to_string()),
        _ => unreachable!(),
    }
}

fn set(
    config: &mut crate::config::Config,
    name: &str,
    value: &str,
) -> DatasetResult<()> {
    match name {
        "data.policy" => {
            config.data.policy =
                <ValidationPolicy as ValueEnum>::from_str(value, true)
                    .map_err(|_| {
                        DatasetError::config(format!(
                            "invalid policy `{value}` (expected `skip` \
                                or `fail-fast`)"
                        ))
                    })?;
        }
        "hub.endpoint" => config.hub.endpoint = parse::<Url>(value)?,
        "hub.private" => config.hub.private = parse::<bool>(value)?,
        "hub.repo-id" => config.hub.repo_id = Some(value.into()),
        "hub.revision" => config.hub.revision = value.into(),
        "hub.split" => config.hub.split = value.into(),
        "quality.max-question-length" => {
            config.quality.max_question_length = parse(value)?;
        }
        "quality.min-question-length" => {
            config.quality.min_question_length = parse(value)?;
        }
        "runtime.num-jobs" => {
            let num_jobs = Some(parse::<usize>(value)?);
            match config.runtime {
                Some(ref mut runtime) => runtime.num_jobs = num_jobs,
                None => config.runtime = Some(Runtime { num_jobs }),
            }
        }
        _ => unreachable!(),
    }

    Ok(())
}

fn unset(config: &mut crate::config::Config, name: &str) {
    let hub = HubConfig::default();
    let quality = Thresholds::default();

    match name {
        "data.policy" => config.data.policy = ValidationPolicy::default(),
        "hub.endpoint" => config.hub.endpoint = hub.endpoint,
        "hub.private" => config.hub.private = hub.private,
        "hub.repo-id" => config.hub.repo_id = None,
        "hub.revision" => config.hub.revision = hub.revision,
        "hub.split" => config.hub.split = hub.split,
        "quality.max-question-length" => {
            config.quality.max_question_length =
                quality.max_question_length
        }
        "quality.min-question-length" => {
            config.quality.min_question_length =
                quality.min_question_length
        }
        "runtime.num-jobs" => config.runtime = None,
        _ => unreachable!(),
    }
}

impl Config {
    pub(crate) fn execute(
        self,
        mut config: crate::config::Config,
    ) -> DatasetResult<()> {
        if self.list {
            for name in OPTIONS {
                print_option(name, get(&config, name));
            }

            return Ok(());
        }

        let name = match self.name.as_deref() {
            Some(name) if OPTIONS.contains(&name) => name,
            Some(name) => bail!("unknown config option `{name}`"),
            None => unreachable!(),
        };

        if let Some(ref value) = self.value {
            set(&mut config, name, value)?;
            config.save()?;
        } else if self.unset {
            unset(&mut config, name);
            config.save()?;
        } else {
            print_option(name, get(&config, name));
        }

        Ok(())
    }
}
