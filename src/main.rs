//! # burger CLI Entry Point
//!
//! This is the main executable for the `burger` command-line tool.
//! It parses CLI arguments using clap and routes commands to the library.
//!
//! ## Command Structure
//!
//! - **Lookup**: `where`, `tools`, `host`, `vs`, `vs-path`, `xcode`
//! - **Headers**: `p4-header`, `git-header`
//! - **Packaging**: `setup-py`, `clean`, `rules`

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::{Path, PathBuf};

use burger::clean;
use burger::locators::xcode::where_is_xcode;
use burger::locators::{Locator, LookupOptions, Tool};
use burger::rules::rules;
use burger::setuputils::create_setup_py;
use burger::strutils::{get_mac_host_type, get_windows_host_type, host_machine, is_wsl};
use burger::tree::Node;
use burger::ui;
use burger::vcs::git::make_git_version_header;
use burger::vcs::perforce::make_version_header;

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
    fn SetConsoleCP(wCodePageID: u32) -> i32;
}

#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
        SetConsoleCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

#[derive(Parser)]
#[command(name = "burger")]
#[command(about = "Build, clean and packaging helpers", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find a tool (sdks, p4, git, doxygen, watcom, codeblocks, pdflatex, makeindex)
    Where {
        tool: String,
        /// Ignore any cached location
        #[arg(long)]
        refresh: bool,
        /// Use and remember this location
        #[arg(long)]
        path: Option<PathBuf>,
        /// Explain failed lookups
        #[arg(short, long)]
        verbose: bool,
        /// Command inside the Watcom install (e.g. wcc386)
        #[arg(long)]
        command: Option<String>,
    },
    /// List every known tool and where it is
    Tools,
    /// Show the host machine and CPU
    Host,
    /// List Visual Studio and Windows SDK installs
    Vs {
        /// Rescan the registry
        #[arg(long)]
        refresh: bool,
    },
    /// Print devenv.com for a Visual Studio year
    VsPath { year: u32 },
    /// Print xcodebuild and its version (macOS)
    Xcode {
        /// Major Xcode version to find
        #[arg(long)]
        major: Option<u32>,
    },
    /// Write a C header describing the last Perforce changelist
    P4Header {
        /// Folder under Perforce control
        dir: PathBuf,
        /// Header to write
        output: PathBuf,
        #[arg(short, long)]
        verbose: bool,
    },
    /// Write a C header describing the current git commit
    GitHeader {
        /// Folder inside a git repository
        dir: PathBuf,
        /// Header to write
        output: PathBuf,
        #[arg(short, long)]
        verbose: bool,
    },
    /// Generate setup.py from pyproject.toml
    SetupPy {
        /// Input file [default: pyproject.toml]
        toml: Option<PathBuf>,
        /// Output file [default: setup.py]
        output: Option<PathBuf>,
    },
    /// Remove build droppings
    Clean {
        kind: CleanKind,
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Descend into subfolders
        #[arg(short, long)]
        recursive: bool,
    },
    /// Run a build_rules.toml command (build, clean, prebuild, postbuild, project, configurations)
    Rules {
        command: String,
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Invoked from a parent folder, honor no_recurse
        #[arg(long)]
        child: bool,
    },
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

#[derive(Clone, Copy, ValueEnum)]
enum CleanKind {
    Xcode,
    Codeblocks,
    SetupPy,
}

fn main() {
    enable_windows_utf8_console();

    let cli = Cli::parse();
    let code = match run(&cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "x".red(), e);
            1
        }
    };
    std::process::exit(code);
}

fn run(command: &Commands) -> Result<i32> {
    match command {
        Commands::Where {
            tool,
            refresh,
            path,
            verbose,
            command,
        } => {
            let Some(tool) = Tool::from_name(tool) else {
                anyhow::bail!("Unknown tool \"{}\"", tool);
            };
            let opts = LookupOptions {
                verbose: *verbose,
                refresh: *refresh,
                path: path.clone(),
            };
            let mut locator = Locator::new();
            let found = match tool {
                Tool::Watcom => locator.where_is_watcom(command.as_deref(), &opts),
                _ => locator.where_is(tool, &opts),
            };
            Ok(print_found(tool.name(), found.as_deref(), *verbose))
        }

        Commands::Tools => {
            let mut locator = Locator::new();
            let mut table = ui::Table::new(&["Tool", "Location"]);
            for tool in Tool::ALL {
                let location = match locator.where_is(tool, &LookupOptions::default()) {
                    Some(path) => path.display().to_string().green().to_string(),
                    None => "not found".dimmed().to_string(),
                };
                table.add_row(vec![tool.name().bold().to_string(), location]);
            }
            table.print();
            Ok(0)
        }

        Commands::Host => {
            println!("{:<10} {}", "Host:".bold(), host_machine());
            if is_wsl() {
                println!("{:<10} {}", "WSL:".bold(), "yes".green());
            }
            if let Some(cpu) = get_windows_host_type(true) {
                println!("{:<10} {}", "Windows:".bold(), cpu);
            }
            if let Some(cpu) = get_mac_host_type() {
                println!("{:<10} {}", "macOS:".bold(), cpu);
            }
            Ok(0)
        }

        Commands::Vs { refresh } => {
            let mut locator = Locator::new();
            let instances = locator.find_visual_studios(*refresh);
            if instances.is_empty() {
                println!("{} No Visual Studio or Windows SDK installs found", "!".yellow());
                return Ok(0);
            }
            let mut root = Node::new("Installs".bold().to_string());
            for instance in instances {
                let entry = root.add_child(format!(
                    "{} {} {}",
                    instance.name.green(),
                    instance.version_string,
                    instance.path.display().to_string().dimmed()
                ));
                for (key, path) in &instance.known_paths {
                    entry.add_child(format!("{} {}", key, path.display()));
                }
            }
            print!("{}", root.render());
            Ok(0)
        }

        Commands::VsPath { year } => {
            let found = Locator::new().where_is_visual_studio(*year);
            Ok(print_found(&format!("Visual Studio {}", year), found.as_deref(), false))
        }

        Commands::Xcode { major } => match where_is_xcode(*major) {
            Some((path, version)) => {
                println!("{} (Xcode {})", path.display(), version);
                Ok(0)
            }
            None => {
                eprintln!("{} Xcode not found", "x".red());
                Ok(1)
            }
        },

        Commands::P4Header {
            dir,
            output,
            verbose,
        } => {
            let mut locator = Locator::new().with_working_dir(dir.clone());
            Ok(make_version_header(&mut locator, dir, output, *verbose))
        }

        Commands::GitHeader {
            dir,
            output,
            verbose,
        } => {
            let mut locator = Locator::new().with_working_dir(dir.clone());
            Ok(make_git_version_header(&mut locator, dir, output, *verbose))
        }

        Commands::SetupPy { toml, output } => {
            create_setup_py(toml.as_deref(), output.as_deref())?;
            let written = output.as_deref().unwrap_or(Path::new("setup.py"));
            println!("{} Wrote {}", "✓".green(), written.display());
            Ok(0)
        }

        Commands::Clean {
            kind,
            dir,
            recursive,
        } => {
            match kind {
                CleanKind::Xcode => clean::clean_xcode(dir, *recursive)?,
                CleanKind::Codeblocks => clean::clean_codeblocks(dir, *recursive)?,
                CleanKind::SetupPy => clean::clean_setup_py(dir, *recursive)?,
            }
            Ok(0)
        }

        Commands::Rules {
            command,
            dir,
            child,
        } => Ok(rules(command, dir, !*child)),

        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(0)
        }
    }
}

/// Print a lookup result, `1` when nothing was found.
fn print_found(name: &str, found: Option<&Path>, verbose: bool) -> i32 {
    match found {
        Some(path) => {
            println!("{}", path.display());
            0
        }
        None => {
            // Verbose lookups already explained the failure.
            if !verbose {
                eprintln!("{} {} not found", "x".red(), name);
            }
            1
        }
    }
}
