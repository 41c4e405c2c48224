use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::category::Category;

pub const DEFAULT_DATA_FILE: &str =
  "tasks.json";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "data.file".to_string(),
      DEFAULT_DATA_FILE.to_string()
    );
    map.insert(
      "default.command".to_string(),
      "list".to_string()
    );
    map.insert(
      "default.category".to_string(),
      Category::General
        .label()
        .to_string()
    );
    map.insert(
      "color".to_string(),
      "on".to_string()
    );

    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    tackrc_override
  ))]
  pub fn load(
    tackrc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let tackrc = resolve_tackrc_path(
      tackrc_override
    )?;
    if let Some(path) = tackrc {
      info!(tackrc = %path.display(), "loading tackrc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no tackrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> anyhow::Result<Option<bool>> {
    let Some(raw) = self.map.get(key)
    else {
      return Ok(None);
    };
    parse_bool(raw)
      .map(Some)
      .ok_or_else(|| {
        anyhow!(
          "invalid value for {key}: {raw} \
           (expected on/off)"
        )
      })
  }

  pub fn default_category(
    &self
  ) -> anyhow::Result<Category> {
    match self.get("default.category")
    {
      | Some(raw) => {
        raw.parse().with_context(|| {
          format!(
            "invalid \
             default.category \
             setting: {raw}"
          )
        })
      }
      | None => Ok(Category::default())
    }
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

/// Picks the task file and makes sure its directory exists.
#[tracing::instrument(skip(
  cfg,
  override_file
))]
pub fn resolve_data_file(
  cfg: &Config,
  override_file: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let file = if let Some(path) =
    override_file
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.get("data.file")
  {
    expand_tilde(Path::new(&cfg_value))
  } else {
    PathBuf::from(DEFAULT_DATA_FILE)
  };

  if let Some(dir) = file.parent()
    && !dir.as_os_str().is_empty()
    && !dir.exists()
  {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(file)
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_tackrc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(tackrc_env) =
    std::env::var("TACKRC")
  {
    if tackrc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      tackrc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping ~/.tackrc"
    );
    return Ok(None);
  };
  let candidate = home.join(".tackrc");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}
