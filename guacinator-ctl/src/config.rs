use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};

pub const DEFAULT_CONFIG_DIR: &str = ".guacinator";
pub const DEFAULT_CONFIG_NAME: &str = "guacinator-config.yaml";

/// Written out on first run
pub const DEFAULT_CONFIG: &str = include_str!("../config/guacinator-config.yaml");

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Settings {
    pub guac: GuacSettings,
    pub log: LogSettings,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct GuacSettings {
    pub scheme: String,
    pub url: String,
    pub vnc_port: u16,
}

impl Default for GuacSettings {
    fn default() -> GuacSettings {
        GuacSettings {
            scheme: String::from("https"),
            url: String::from("localhost:8080"),
            vnc_port: 5900,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub format: String,
    /// Empty means stdout only
    pub path: String,
}

impl Default for LogSettings {
    fn default() -> LogSettings {
        LogSettings {
            level: String::from("info"),
            format: String::from("text"),
            path: String::new(),
        }
    }
}

impl Settings {
    /// Overrides each key with `GUAC_SCHEME`, `GUAC_URL`, ... when `env` has it
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(v) = env("GUAC_SCHEME") {
            self.guac.scheme = v;
        }
        if let Some(v) = env("GUAC_URL") {
            self.guac.url = v;
        }
        if let Some(v) = env("GUAC_VNC_PORT") {
            self.guac.vnc_port = v
                .parse()
                .with_context(|| format!("parsing GUAC_VNC_PORT {v:?} as a port number"))?;
        }
        if let Some(v) = env("LOG_LEVEL") {
            self.log.level = v;
        }
        if let Some(v) = env("LOG_FORMAT") {
            self.log.format = v;
        }
        if let Some(v) = env("LOG_PATH") {
            self.log.path = v;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Loaded {
    pub settings: Settings,
    pub path: PathBuf,
    /// Whether the file had to be written from the embedded template
    pub created: bool,
}

pub fn default_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(home.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_NAME))
}

/// Reads `path` (or the default path) and the process environment
pub fn load(path: Option<&Path>) -> anyhow::Result<Loaded> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_path()?,
    };
    load_from(path, |key| std::env::var(key).ok())
}

pub fn load_from(
    path: PathBuf,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Loaded> {
    let created = !path.exists();
    if created {
        write_default(&path)?;
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let mut settings = parse(&contents)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    settings.apply_env(env)?;
    Ok(Loaded {
        settings,
        path,
        created,
    })
}

pub fn parse(contents: &str) -> anyhow::Result<Settings> {
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    Ok(serde_yaml::from_str(contents)?)
}

pub fn write_default(path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating config directory {}", dir.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("writing default config to {}", path.display()))
}
