use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use selector::{Preferences, WaitPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use tokio::sync::OnceCell;

pub const PROGNAME: &str = "trackd";
pub const CONFIG_NAME: &str = "config.toml";
pub const STORE_NAME: &str = "saved_selections";

static CONF: OnceCell<Config> = OnceCell::const_new();

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Config {
    socket: Option<PathBuf>,
    store: Option<PathBuf>,
    #[serde(default)]
    languages: Preferences,
    #[serde(default)]
    wait: Wait,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
struct Wait {
    poll_interval_ms: u64,
    max_attempts: u32,
}

impl Default for Wait {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

fn parse_config(conts: &str) -> anyhow::Result<Config> {
    let conf: Config = toml::from_str(conts).context("parsing config file as TOML")?;
    if conf.wait.max_attempts == 0 {
        anyhow::bail!("wait.max_attempts must be at least 1");
    }
    Ok(conf)
}

fn read_config(conf_file: &Path) -> anyhow::Result<Config> {
    match fs::read_to_string(conf_file) {
        Ok(conts) => parse_config(&conts),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("There is no config file at {:?}, using defaults", conf_file);
            Ok(Config::default())
        }
        Err(e) => {
            Err(e).with_context(|| format!("reading config file at {:?}", conf_file))
        }
    }
}

/// Reads the config from `path`, or from the default location. A `socket` given here
/// wins over the one in the file.
pub fn init_config(path: Option<&Path>, socket: Option<PathBuf>) -> anyhow::Result<()> {
    let conf_file = match path {
        Some(p) => p.to_path_buf(),
        None => conf_dir()?.join(CONFIG_NAME),
    };

    let mut conf = read_config(&conf_file)?;
    if socket.is_some() {
        conf.socket = socket;
    }

    log::debug!("Using config: {:?}", conf);
    CONF.set(conf).context("setting the global conf variable")?;
    Ok(())
}

fn get_instance() -> &'static Config {
    CONF.get().expect("Config was not initialized")
}

pub fn socket() -> anyhow::Result<&'static Path> {
    get_instance()
        .socket
        .as_deref()
        .context("no mpv socket configured, set 'socket' or pass --socket")
}

pub fn preferences() -> &'static Preferences {
    &get_instance().languages
}

pub fn wait_policy() -> WaitPolicy {
    let wait = &get_instance().wait;
    WaitPolicy::new(
        Duration::from_millis(wait.poll_interval_ms),
        wait.max_attempts,
    )
}

pub fn store_file() -> anyhow::Result<PathBuf> {
    match &get_instance().store {
        Some(p) => Ok(p.clone()),
        None => Ok(cache_dir()?.join(STORE_NAME)),
    }
}

pub fn conf_dir() -> anyhow::Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("could not get config dir")?
        .join(PROGNAME))
}

pub fn cache_dir() -> anyhow::Result<PathBuf> {
    Ok(dirs::cache_dir()
        .context("could not get cache dir")?
        .join(PROGNAME))
}
