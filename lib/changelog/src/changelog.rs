use std::collections::HashMap;
use std::fs;
use std::io::Write;

use gitchanges_templating::{TemplateContext, Templates};
use scm::drivers::ScmRepository;
use serde::Serialize;
use tracing::debug;

use crate::builder::build_change_groups;
use crate::entries::ChangeGroup;
use crate::errors::ChangelogResult;
use crate::settings::ChangelogSettings;

const CHANGELOG_TEMPLATE_NAME: &str = "changelog.md";

/// Keep a Changelog style template used when no custom template is configured.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/changelog.md.jinja");

/// A changelog for a single project, ready to be rendered.
///
/// Serializes to the context the template is rendered with.
#[derive(Debug, Serialize)]
pub struct Changelog {
    project_name: String,
    change_groups: Vec<ChangeGroup>,
    filter_declaration: Option<String>,
    #[serde(skip)]
    template: String,
}

impl Changelog {
    /// Builds the change groups for `repository`.
    ///
    /// A custom template is read before history is walked so a bad path fails fast.
    pub fn new(
        repository: &dyn ScmRepository,
        settings: &ChangelogSettings,
    ) -> ChangelogResult<Self> {
        let template = match &settings.template {
            Some(path) => {
                debug!("using changelog template {}", path.display());
                fs::read_to_string(path)?
            }
            None => DEFAULT_TEMPLATE.to_string(),
        };

        let change_groups = build_change_groups(repository, &settings.grouping)?;
        debug!("built {} change groups", change_groups.len());

        Ok(Self {
            project_name: settings
                .name()
                .map(String::from)
                .unwrap_or_else(|| repository.name()),
            change_groups,
            filter_declaration: settings.grouping.filter_declaration(),
            template,
        })
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn change_groups(&self) -> &[ChangeGroup] {
        &self.change_groups
    }

    pub fn filter_declaration(&self) -> Option<&str> {
        self.filter_declaration.as_deref()
    }

    /// Renders the changelog with its template.
    pub fn generate<W: Write>(&self, out: &mut W) -> ChangelogResult<()> {
        let templates = Templates::new_with_templates(HashMap::from([(
            CHANGELOG_TEMPLATE_NAME,
            self.template.clone(),
        )]))?;
        let context = TemplateContext::from_serialize(self)?;
        let rendered = templates.render(CHANGELOG_TEMPLATE_NAME, context)?;
        write!(out, "{}", rendered)?;

        Ok(())
    }

    /// Writes the template context as JSON instead of rendering it.
    pub fn write_context<W: Write>(&self, out: &mut W) -> ChangelogResult<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)?;

        Ok(())
    }
}
