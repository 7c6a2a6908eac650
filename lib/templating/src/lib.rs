use std::collections::{BTreeMap, HashMap};
use std::error::Error;

use minijinja::Environment;
use serde::Serialize;
use serde_json::{to_value, Value};
use thiserror::Error;
use tracing::trace;

#[remain::sorted]
#[derive(Debug, Error)]
pub enum TemplatingError {
    #[error("json serialize/deserialize error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Creating a Context from a Value/Serialize requires it being a JSON object")]
    TemplateContextError(),

    /// Error that may occur while template operations such as parse and render.
    #[error("Template error: `{0}`")]
    TemplateError(#[from] minijinja::Error),

    /// Error that may occur while parsing the template.
    #[error("Template parse error:\n{0}")]
    TemplateParseError(String),
}

pub type TemplatingResult<T> = Result<T, TemplatingError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateContext {
    pub data: BTreeMap<String, Value>,
}

impl TemplateContext {
    /// Takes a serde-json `Value` and convert it into a `Context` with no overhead/cloning.
    pub fn from_value(obj: Value) -> TemplatingResult<Self> {
        match obj {
            Value::Object(m) => Ok(TemplateContext {
                data: m.into_iter().collect(),
            }),
            _ => Err(TemplatingError::TemplateContextError()),
        }
    }

    /// Takes something that impl Serialize and create a context with it.
    pub fn from_serialize(value: impl Serialize) -> TemplatingResult<Self> {
        let obj = to_value(value)?;
        TemplateContext::from_value(obj)
    }
}

/// Block tags swallow the newline that follows them and the indentation before them so templates
/// can be laid out readably without leaking whitespace into the output.
fn environment<'a>() -> Environment<'a> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env
}

#[derive(Debug)]
pub struct Templates<'a> {
    env: Environment<'a>,
}

impl<'a> Templates<'a> {
    pub fn new_with_templates(templates: HashMap<&'a str, String>) -> TemplatingResult<Self> {
        let mut env = environment();
        for (k, v) in templates {
            if let Err(e) = env.add_template_owned(k, v) {
                return if let Some(error_source) = e.source() {
                    Err(TemplatingError::TemplateParseError(
                        error_source.to_string(),
                    ))
                } else {
                    Err(TemplatingError::TemplateError(e))
                };
            }
        }

        Ok(Self { env })
    }

    /// Renders the template.
    pub fn render(&self, template: &str, context: TemplateContext) -> TemplatingResult<String> {
        trace!("rendering template {}", template);
        let tmpl = self.env.get_template(template)?;
        Ok(tmpl.render(&context.data)?)
    }
}
