use crate::adapters::{
    DryRunSender, FileTokenProvider, GmailSender, GmailSettings, OllamaGenerator,
    StaticTokenProvider,
};
use crate::core::contact_store::{AddPolicy, ContactStore};
use crate::core::prompt::PromptStyle;
use crate::core::request_loop::PipelineOptions;
use crate::domain::model::EmailAddress;
use crate::domain::ports::{CredentialProvider, MailSender, TextGenerator};
use crate::utils::error::{MailError, Result};
use crate::utils::validation::{
    validate_email, validate_non_empty_string, validate_path, validate_range, validate_url,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generator: GeneratorConfig,
    pub mail: MailConfig,
    pub contacts: ContactsConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub model: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub prompt_style: PromptStyle,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "qwen3:0.6b".to_string(),
            max_new_tokens: 200,
            temperature: 0.0,
            timeout_seconds: 120,
            prompt_style: PromptStyle::Guided,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub api_base: String,
    pub sender: Option<String>,
    pub token_path: String,
    pub access_token: Option<String>,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub timeout_seconds: u64,
    pub dry_run: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_base: crate::adapters::gmail::GMAIL_API_BASE.to_string(),
            sender: None,
            token_path: "token.json".to_string(),
            access_token: None,
            retry_attempts: 2,
            retry_delay_ms: 500,
            timeout_seconds: 30,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactsConfig {
    pub add_policy: AddPolicy,
    pub resolve_names: bool,
    pub initial: BTreeMap<String, String>,
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            add_policy: AddPolicy::Overwrite,
            resolve_names: true,
            initial: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MailError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MailError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MAIL_ACCESS_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MailError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_url("generator.endpoint", &self.generator.endpoint)?;
        validate_non_empty_string("generator.model", &self.generator.model)?;
        validate_range("generator.max_new_tokens", self.generator.max_new_tokens, 1, 8192)?;
        validate_range("generator.temperature", self.generator.temperature, 0.0, 2.0)?;

        validate_url("mail.api_base", &self.mail.api_base)?;
        self.validate_mail_credentials()?;
        validate_range("mail.retry_attempts", self.mail.retry_attempts, 0, 10)?;
        if let Some(sender) = &self.mail.sender {
            validate_email("mail.sender", sender)?;
        }

        for (name, email) in &self.contacts.initial {
            validate_non_empty_string("contacts.initial", name)?;
            validate_email(&format!("contacts.initial.{}", name), email)?;
        }

        self.bind_addr()?;
        Ok(())
    }

    // 實際寄信時必須有 access_token 或 token 檔案其中之一
    fn validate_mail_credentials(&self) -> Result<()> {
        let access_token = self.mail.access_token.as_deref().map(str::trim);
        if let Some(token) = access_token {
            if token.starts_with("${") {
                return Err(MailError::MissingConfigError {
                    field: format!("mail.access_token (unset variable {})", token),
                });
            }
        }

        let has_token = access_token.is_some_and(|token| !token.is_empty());
        if self.mail.token_path.trim().is_empty() {
            if self.mail.dry_run || has_token {
                return Ok(());
            }
            return Err(MailError::MissingConfigError {
                field: "mail.token_path".to_string(),
            });
        }
        validate_path("mail.token_path", &self.mail.token_path)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|e| MailError::InvalidConfigValueError {
                field: "server.bind".to_string(),
                value: self.server.bind.clone(),
                reason: format!("{}", e),
            })
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            prompt_style: self.generator.prompt_style,
            resolve_names: self.contacts.resolve_names,
        }
    }

    pub fn contact_store(&self) -> Result<ContactStore> {
        let contacts = self
            .contacts
            .initial
            .iter()
            .map(|(name, email)| -> Result<(String, EmailAddress)> {
                Ok((name.clone(), EmailAddress::parse(email.clone())?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ContactStore::with_contacts(contacts, self.contacts.add_policy))
    }

    pub fn gmail_settings(&self) -> GmailSettings {
        GmailSettings {
            api_base: self.mail.api_base.clone(),
            sender: self.mail.sender.clone(),
            retry_attempts: self.mail.retry_attempts,
            retry_delay: Duration::from_millis(self.mail.retry_delay_ms),
            timeout: Duration::from_secs(self.mail.timeout_seconds),
        }
    }

    pub fn text_generator(&self) -> Result<Arc<dyn TextGenerator>> {
        Ok(Arc::new(OllamaGenerator::new(self.generator.clone())?))
    }

    pub fn mail_sender(&self) -> Result<Arc<dyn MailSender>> {
        if self.mail.dry_run {
            tracing::info!("🔍 Dry run enabled, mail will only be logged");
            return Ok(Arc::new(DryRunSender));
        }

        let credentials: Arc<dyn CredentialProvider> = match self
            .mail
            .access_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
        {
            Some(token) => Arc::new(StaticTokenProvider::new(token)),
            None => Arc::new(FileTokenProvider::new(&self.mail.token_path)),
        };

        Ok(Arc::new(GmailSender::new(credentials, self.gmail_settings())?))
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
