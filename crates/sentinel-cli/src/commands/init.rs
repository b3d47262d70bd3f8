//! `sentinel init`: write a starter configuration.

use crate::cli::InitArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::{Path, PathBuf};

/// Execute the init command.
pub fn execute_init(args: &InitArgs, path: Option<&Path>, formatter: &Formatter) -> Result<()> {
    let path = write_sample(args, path)?;
    println!("{}", formatter.success(&format!("Wrote {}", path.display())));
    Ok(())
}

/// Write [`Config::sample`] to `path` (or the default location).
pub fn write_sample(args: &InitArgs, path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::default_path()?,
    };

    if path.exists() && !args.force {
        return Err(CliError::Config(format!(
            "{} already exists, pass --force to overwrite",
            path.display()
        )));
    }

    Config::sample().save(&path)?;
    Ok(path)
}
