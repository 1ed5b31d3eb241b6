/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2026 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{
    env,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

/// Name of the directory under the user config dir holding our files.
const CONFIG_DIR_NAME: &str = "donachain";

#[cfg(not(windows))]
const HOME_VAR: &str = "HOME";
#[cfg(windows)]
const HOME_VAR: &str = "USERPROFILE";

/// The user's home directory, if the environment names one.
fn home_dir() -> Option<PathBuf> {
    env::var_os(HOME_VAR).filter(|h| !h.is_empty()).map(PathBuf::from)
}

/// An absolute `$XDG_CONFIG_HOME` wins, then `<home>/.config`.
fn config_dir(xdg: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
    xdg.filter(|p| p.is_absolute()).or_else(|| home.map(|h| h.join(".config")))
}

/// Expand a leading `~` into the user's home directory.
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let Some(remains) = path.strip_prefix('~') else { return Ok(PathBuf::from(path)) };

    let Some(homedir) = home_dir() else {
        return Err(Error::ConfigInvalid("Could not fetch path for home directory".to_string()))
    };

    match remains.strip_prefix('/') {
        Some(rest) if !rest.is_empty() => Ok(homedir.join(rest)),
        _ => Ok(homedir),
    }
}

/// `file` under the `donachain` directory of the user config dir.
fn join_config_path(file: &Path) -> PathBuf {
    let xdg = env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
    let base = config_dir(xdg, home_dir()).unwrap_or_default();
    base.join(CONFIG_DIR_NAME).join(file)
}

/// Use the given path if any, otherwise fall back to the default config file.
pub fn get_config_path(arg: Option<String>, fallback: &str) -> Result<PathBuf> {
    match arg {
        Some(a) => expand_path(&a),
        None => Ok(join_config_path(Path::new(fallback))),
    }
}
