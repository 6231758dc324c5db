//! Gateway configuration: `config/forge.toml` overlaid with `FORGE_*`
//! environment variables.

use config::{Config, ConfigError, Environment, File};
use forge_stages::{StageModels, StagePrompts};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub port: u16,
    pub completion_url: String,
    pub api_key: String,
    pub classifier_model: String,
    pub generator_model: String,
    pub data_dir: String,
    pub journal_prompt_path: Option<String>,
    pub detail_prompt_path: Option<String>,
    pub yaml_prompt_path: Option<String>,
    /// Agent template whose `prompts:` mapping backfills any stage prompt
    /// that has no dedicated file.
    pub agent_template_path: Option<String>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("port", 5001)?
            .set_default(
                "completion_url",
                "https://openrouter.ai/api/v1/chat/completions",
            )?
            .set_default("api_key", "")?
            .set_default("classifier_model", "anthropic/claude-3-haiku")?
            .set_default("generator_model", "anthropic/claude-3-5-sonnet")?
            .set_default("data_dir", "./data/forge")?
            .add_source(File::with_name("config/forge").required(false))
            .add_source(Environment::with_prefix("FORGE"))
            .build()?
            .try_deserialize()
    }

    pub fn stage_models(&self) -> StageModels {
        StageModels {
            classifier: self.classifier_model.clone(),
            generator: self.generator_model.clone(),
        }
    }

    /// Resolves the three stage prompts. A dedicated prompt file wins; the
    /// agent template's `prompts:` mapping fills the gaps. Anything still
    /// missing leaves that stage unconfigured, which the stages degrade on.
    pub fn stage_prompts(&self) -> StagePrompts {
        let template = self.template_prompts();
        StagePrompts {
            journal: read_prompt(self.journal_prompt_path.as_deref())
                .or(template.journal),
            detail: read_prompt(self.detail_prompt_path.as_deref()).or(template.detail),
            yaml: read_prompt(self.yaml_prompt_path.as_deref()).or(template.yaml),
        }
    }

    fn template_prompts(&self) -> TemplatePrompts {
        let Some(path) = self.agent_template_path.as_deref() else {
            return TemplatePrompts::default();
        };
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path, error = %err, "cannot read agent template");
                return TemplatePrompts::default();
            }
        };
        match serde_yaml::from_str::<AgentTemplate>(&text) {
            Ok(template) => template.prompts,
            Err(err) => {
                tracing::warn!(path, error = %err, "agent template is not valid YAML");
                TemplatePrompts::default()
            }
        }
    }
}

fn read_prompt(path: Option<&str>) -> Option<String> {
    let path = path?;
    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            tracing::warn!(path, "prompt file is empty");
            None
        }
        Err(err) => {
            tracing::warn!(path, error = %err, "cannot read prompt file");
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct AgentTemplate {
    #[serde(default)]
    prompts: TemplatePrompts,
}

#[derive(Debug, Default, Deserialize)]
struct TemplatePrompts {
    journal: Option<String>,
    detail: Option<String>,
    yaml: Option<String>,
}
