use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use clap_complete::{generate, Shell};

use crate::errors::CliError;

const BIN_NAME: &str = "tool-tracker";

/// Where a shell picks up completion scripts without rc-file edits, plus
/// anything the user still has to do once.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InstallTarget {
    path: PathBuf,
    hint: Option<&'static str>,
}

fn install_target(shell: Shell, home: &Path) -> Option<InstallTarget> {
    let target = match shell {
        Shell::Bash => InstallTarget {
            path: home
                .join(".local/share/bash-completion/completions")
                .join(BIN_NAME),
            hint: None,
        },
        // zsh autoloads `_name` files from any directory on $fpath.
        Shell::Zsh => InstallTarget {
            path: home.join(".zfunc").join(format!("_{BIN_NAME}")),
            hint: Some("add `fpath=(~/.zfunc $fpath)` before `compinit` in ~/.zshrc"),
        },
        Shell::Fish => InstallTarget {
            path: home
                .join(".config/fish/completions")
                .join(format!("{BIN_NAME}.fish")),
            hint: None,
        },
        _ => return None,
    };
    Some(target)
}

fn write_script(shell: Shell, buf: &mut dyn Write) {
    let mut cmd = crate::cli::styled_command();
    generate(shell, &mut cmd, BIN_NAME, buf);
}

fn install_into(shell: Shell, home: &Path) -> Result<InstallTarget, CliError> {
    let target = install_target(shell, home).ok_or_else(|| {
        CliError::InvalidArgument(format!(
            "no install location for {shell}; print the script and place it yourself"
        ))
    })?;
    if let Some(parent) = target.path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut script = Vec::new();
    write_script(shell, &mut script);
    std::fs::write(&target.path, script)?;
    tracing::info!(%shell, path = %target.path.display(), "installed completions");
    Ok(target)
}

fn resolve_shell(shell_arg: Option<&str>) -> Result<Shell, CliError> {
    match shell_arg {
        Some(name) => <Shell as ValueEnum>::from_str(name.trim(), true)
            .map_err(|_| CliError::InvalidArgument(format!("unknown shell '{name}'"))),
        None => Shell::from_env().ok_or_else(|| {
            CliError::InvalidArgument(
                "unable to detect shell from $SHELL; pass a shell name".to_string(),
            )
        }),
    }
}

pub fn run_completions_command(shell_arg: Option<&str>, install: bool) -> Result<(), CliError> {
    let shell = resolve_shell(shell_arg)?;
    if !install {
        write_script(shell, &mut io::stdout().lock());
        return Ok(());
    }

    let home = std::env::var_os("HOME").ok_or_else(|| {
        CliError::InvalidArgument("HOME is not set; cannot pick an install location".to_string())
    })?;
    let target = install_into(shell, Path::new(&home))?;
    println!("completions installed to {}", target.path.display());
    if let Some(hint) = target.hint {
        println!("  {hint}");
    }
    Ok(())
}
