use std::io::{self, Write};
use std::{env, fs};
use std::path::{Path, PathBuf};

use changelog::changelog::Changelog;
use changelog::settings::{ChangelogSettings, GroupingSettings, DEFAULT_SETTINGS_FILE};
use clap::Parser;
use scm::drivers::{Scm, ScmRepository};
use tracing::{debug, info};

use crate::errors::{CliError, CliResult};

const DEFAULT_OUTPUT_FILE: &str = "CHANGELOG.md";
const STDOUT: &str = "-";

/// Generate a changelog for a git repository
#[derive(Parser, Debug)]
pub struct GenerateCommand {
    /// Path to the git repository. Defaults to the current directory.
    #[arg(long, short, env = "GITCHANGES_PATH")]
    pub path: Option<PathBuf>,

    /// Project name used in the changelog title. Defaults to the repository directory name.
    #[arg(long, env = "GITCHANGES_NAME")]
    pub name: Option<String>,

    /// Only include changes made after this tag
    #[arg(long, env = "GITCHANGES_SINCE_TAG", value_name = "TAG")]
    pub since_tag: Option<String>,

    /// Only include changes made at or before this tag
    #[arg(long, env = "GITCHANGES_UNTIL_TAG", value_name = "TAG")]
    pub until_tag: Option<String>,

    /// Regex whose first capture group labels each change
    #[arg(long, env = "GITCHANGES_GROUP_BY", value_name = "PATTERN")]
    pub group_by: Option<String>,

    /// Regex matched against full commit messages. Matching commits are left out.
    #[arg(long, env = "GITCHANGES_SKIP", value_name = "PATTERN")]
    pub skip: Option<String>,

    /// Where to write the changelog, `-` for stdout. Defaults to CHANGELOG.md in the repository.
    #[arg(long, short, env = "GITCHANGES_OUTPUT", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Overwrite the output file if it already exists
    #[arg(long)]
    pub force: bool,

    /// Template to render instead of the built in Keep a Changelog template
    #[arg(long, env = "GITCHANGES_TEMPLATE", value_name = "PATH")]
    pub template: Option<PathBuf>,

    /// Settings file. Defaults to gitchanges.toml in the repository.
    #[arg(long, env = "GITCHANGES_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the template context as JSON instead of the rendered changelog
    #[arg(long)]
    pub context: bool,
}

impl GenerateCommand {
    fn settings_overrides(&self) -> ChangelogSettings {
        ChangelogSettings {
            name: self.name.clone(),
            template: self.template.clone(),
            grouping: GroupingSettings {
                since_tag: self.since_tag.clone(),
                until_tag: self.until_tag.clone(),
                group_by: self.group_by.clone(),
                skip: self.skip.clone(),
            },
        }
    }
}

enum Destination {
    File(PathBuf),
    Stdout,
}

fn destination(output: Option<PathBuf>, root: &Path) -> Destination {
    match output {
        Some(path) if path.as_os_str() == STDOUT => Destination::Stdout,
        Some(path) => Destination::File(path),
        None => Destination::File(root.join(DEFAULT_OUTPUT_FILE)),
    }
}

/// Settings file values with relative template paths resolved against the repository root.
fn load_settings(config: Option<&Path>, root: &Path) -> CliResult<ChangelogSettings> {
    let mut settings = match config {
        Some(path) => ChangelogSettings::from_path(path)?,
        None => ChangelogSettings::from_path_or_default(&root.join(DEFAULT_SETTINGS_FILE))?,
    };

    if let Some(template) = settings.template.as_mut() {
        if template.is_relative() {
            *template = root.join(&*template);
        }
    }

    Ok(settings)
}

/// Renders the whole changelog up front so a failed render never touches the output.
fn render(changelog: &Changelog, context: bool) -> CliResult<Vec<u8>> {
    let mut rendered = Vec::new();
    if context {
        changelog.write_context(&mut rendered)?;
    } else {
        changelog.generate(&mut rendered)?;
    }

    Ok(rendered)
}

pub(crate) fn execute(command: GenerateCommand) -> CliResult<()> {
    let cwd = match &command.path {
        Some(path) => path.clone(),
        None => env::current_dir()?,
    };

    let scm = Scm::get(&cwd)?;
    let root = scm.workdir().map(Path::to_path_buf).unwrap_or(cwd);
    debug!("generating changelog for {}", root.display());

    let settings =
        load_settings(command.config.as_deref(), &root)?.merge(command.settings_overrides());
    let changelog = Changelog::new(&scm, &settings)?;
    let rendered = render(&changelog, command.context)?;

    match destination(command.output, &root) {
        Destination::Stdout => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&rendered)?;
            stdout.flush()?;
        }
        Destination::File(path) => {
            if path.exists() && !command.force {
                return Err(CliError::OutputExists(path));
            }

            fs::write(&path, &rendered)?;
            info!("wrote changelog to {}", path.display());
        }
    }

    Ok(())
}
