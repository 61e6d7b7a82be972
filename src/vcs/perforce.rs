//! Perforce (`p4`) commands.

use super::{TOOL_NOT_FOUND, write_header};
use crate::locators::{Env, Locator, LookupOptions};
use crate::run::run_command;
use crate::strutils::convert_to_windows_path;
use colored::*;
use std::path::{Path, PathBuf};

/// True if `p4 -s where` reports success for `...`.
pub fn parse_where_exit(output: &str) -> bool {
    output
        .lines()
        .filter_map(|line| line.strip_prefix("exit: "))
        .any(|code| code.trim().parse::<i32>() == Ok(0))
}

/// True if `working_directory` is mapped in the current Perforce client.
///
/// p4 can take many seconds to answer for unmapped folders.
pub fn is_under_p4_control<E: Env>(locator: &mut Locator<E>, working_directory: &Path) -> bool {
    let Some(p4) = locator.where_is_p4(&LookupOptions::default()) else {
        return false;
    };
    let p4 = p4.to_string_lossy().into_owned();
    let result = run_command(
        &[p4.as_str(), "-s", "where", "..."],
        Some(working_directory),
        true,
        true,
        true,
    );
    parse_where_exit(&result.stdout)
}

/// Run `p4 <command> <file>` for each file, stopping at the first failure.
///
/// Returns `10` if p4 isn't installed, otherwise the last exit code.
pub fn perforce_command<E: Env>(
    locator: &mut Locator<E>,
    files: &[PathBuf],
    command: &str,
    verbose: bool,
) -> i32 {
    let opts = LookupOptions {
        verbose,
        ..Default::default()
    };
    let Some(p4) = locator.where_is_p4(&opts) else {
        return TOOL_NOT_FOUND;
    };
    let p4 = p4.to_string_lossy().into_owned();
    let cwd = locator.working_dir();

    let mut error = 0;
    for file in files {
        let mut item = cwd.join(file).to_string_lossy().into_owned();
        // p4.exe under Linux for Windows wants Windows paths
        if !p4.ends_with("p4") {
            item = convert_to_windows_path(&item);
        }
        let cmd = [p4.as_str(), command, item.as_str()];
        if verbose {
            println!("{}", cmd.join(" "));
        }
        error = run_command(&cmd, None, !verbose, false, false).code;
        if error != 0 {
            break;
        }
    }
    error
}

/// Open files for edit.
pub fn perforce_edit<E: Env>(locator: &mut Locator<E>, files: &[PathBuf], verbose: bool) -> i32 {
    perforce_command(locator, files, "edit", verbose)
}

/// Mark files for add.
pub fn perforce_add<E: Env>(locator: &mut Locator<E>, files: &[PathBuf], verbose: bool) -> i32 {
    perforce_command(locator, files, "add", verbose)
}

/// Depot paths from `p4 opened` output, revision suffixes removed.
pub fn parse_opened(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").to_string())
        .collect()
}

/// Files currently opened in Perforce, limited to `files` if not empty.
///
/// Any error output gives an empty list.
pub fn perforce_opened<E: Env>(
    locator: &mut Locator<E>,
    files: &[String],
    verbose: bool,
) -> Vec<String> {
    let opts = LookupOptions {
        verbose,
        ..Default::default()
    };
    let Some(p4) = locator.where_is_p4(&opts) else {
        return Vec::new();
    };
    let mut cmd = vec![p4.to_string_lossy().into_owned(), "opened".to_string()];
    cmd.extend(files.iter().cloned());
    let result = run_command(&cmd, None, !verbose, true, true);
    if !result.stderr.is_empty() {
        if verbose {
            eprintln!("{} {}", "!".yellow(), result.stderr.trim_end());
        }
        return Vec::new();
    }
    parse_opened(&result.stdout)
}

/// Change number, date and time from `p4 changes -m 1 -t`.
///
/// `Change 3361 on 2012/05/15 13:20:12 by user@client 'message'`
pub fn parse_changes(output: &str) -> Option<(String, String, String)> {
    let parts: Vec<&str> = output.trim().split(' ').collect();
    (parts.len() > 4).then(|| {
        (
            parts[1].to_string(),
            parts[3].to_string(),
            parts[4].to_string(),
        )
    })
}

/// Value from `p4 set NAME`, as in `P4USER=burger (config)`.
pub fn parse_set(output: &str) -> Option<String> {
    let first = output.trim().split(' ').next()?;
    first.split('=').nth(1).map(str::to_string)
}

/// `#define` lines for the Perforce version header.
pub fn version_defines(
    changes: Option<(String, String, String)>,
    client: Option<String>,
    user: Option<String>,
) -> Vec<String> {
    let mut defines = Vec::new();
    if let Some((change, date, time)) = changes {
        defines.push(format!("#define P4_CHANGELIST {}", change));
        defines.push(format!("#define P4_CHANGEDATE \"{}\"", date));
        defines.push(format!("#define P4_CHANGETIME \"{}\"", time));
    }
    if let Some(client) = client {
        defines.push(format!("#define P4_CLIENT \"{}\"", client));
    }
    if let Some(user) = user {
        defines.push(format!("#define P4_USER \"{}\"", user));
    }
    defines
}

/// Write a C header describing the last synced changelist.
///
/// Returns `0` on success, `10` if p4 is missing, the p4 exit code if a
/// query failed or `2` if the header couldn't be written.
pub fn make_version_header<E: Env>(
    locator: &mut Locator<E>,
    working_dir: &Path,
    output_file: &Path,
    verbose: bool,
) -> i32 {
    let Some(p4) = locator.where_is_p4(&LookupOptions::default()) else {
        return TOOL_NOT_FOUND;
    };
    let p4 = p4.to_string_lossy().into_owned();

    let query = |args: &[&str]| {
        let mut cmd = vec![p4.as_str()];
        cmd.extend_from_slice(args);
        if verbose {
            println!("{}", cmd.join(" "));
        }
        let result = run_command(&cmd, Some(working_dir), false, true, false);
        if result.success() {
            Ok(result.stdout)
        } else {
            Err(result.code)
        }
    };

    let changes = match query(&["changes", "-m", "1", "-t", "-l", "...#have"]) {
        Ok(out) => parse_changes(&out),
        Err(code) => return code,
    };
    let client = match query(&["set", "P4CLIENT"]) {
        Ok(out) => parse_set(&out),
        Err(code) => return code,
    };
    let user = match query(&["set", "P4USER"]) {
        Ok(out) => parse_set(&out),
        Err(code) => return code,
    };

    write_header(
        output_file,
        "burger::vcs::perforce::make_version_header",
        &version_defines(changes, client, user),
        verbose,
    )
}
