use std::env;
use std::io;
use std::path::PathBuf;

use compose_module::{CohereGenerator, MessageComposer, TextGenerator, DEFAULT_MODEL};
use send_whatsapp_module::TwilioConfig;

use crate::delivery_log::DeliveryLog;

use super::BoxError;

pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Runtime configuration, read from the environment once at startup and
/// passed into component constructors. Components hold no global state;
/// provider clients are built per run from these fields.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Directory the uploaded roster lands in; the newest upload replaces
    /// `latest.csv`.
    pub upload_dir: PathBuf,
    pub delivery_log_path: PathBuf,
    pub upload_max_bytes: usize,
    /// Generative-text provider key; reminders fall back to the fixed
    /// template when absent.
    pub cohere_api_key: Option<String>,
    pub cohere_model: String,
    pub cohere_api_base_url: Option<String>,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_whatsapp_number: Option<String>,
    pub twilio_api_base_url: Option<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, BoxError> {
        dotenvy::dotenv().ok();

        let host = env::var("REMINDER_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("REMINDER_SERVICE_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(5000);

        let upload_dir =
            resolve_path(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()))?;
        let delivery_log_path =
            resolve_path(env::var("CHORE_LOG_PATH").unwrap_or_else(|_| "chore_log.csv".to_string()))?;
        let upload_max_bytes = env::var("ROSTER_UPLOAD_MAX_BYTES")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_UPLOAD_MAX_BYTES);

        let cohere_api_key = env_var_non_empty("COHERE_API_KEY");
        let cohere_model =
            env_var_non_empty("COHERE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let cohere_api_base_url = env_var_non_empty("COHERE_API_BASE_URL");

        let twilio_account_sid = env_var_non_empty("TWILIO_ACCOUNT_SID");
        let twilio_auth_token = env_var_non_empty("TWILIO_AUTH_TOKEN");
        let twilio_whatsapp_number = env_var_non_empty("TWILIO_WHATSAPP_NUMBER");
        let twilio_api_base_url = env_var_non_empty("TWILIO_API_BASE_URL");

        Ok(Self {
            host,
            port,
            upload_dir,
            delivery_log_path,
            upload_max_bytes,
            cohere_api_key,
            cohere_model,
            cohere_api_base_url,
            twilio_account_sid,
            twilio_auth_token,
            twilio_whatsapp_number,
            twilio_api_base_url,
        })
    }

    pub fn latest_roster_path(&self) -> PathBuf {
        self.upload_dir.join("latest.csv")
    }

    pub fn delivery_log(&self) -> DeliveryLog {
        DeliveryLog::new(&self.delivery_log_path)
    }

    pub fn composer(&self) -> MessageComposer {
        let generator = self.cohere_api_key.as_ref().map(|key| {
            let mut generator =
                CohereGenerator::new(key.clone()).with_model(self.cohere_model.clone());
            if let Some(base_url) = &self.cohere_api_base_url {
                generator = generator.with_api_base_url(base_url.clone());
            }
            Box::new(generator) as Box<dyn TextGenerator>
        });
        MessageComposer::new(generator)
    }

    /// Twilio settings when fully configured; `None` disables real sends.
    pub fn twilio_config(&self) -> Option<TwilioConfig> {
        match (
            &self.twilio_account_sid,
            &self.twilio_auth_token,
            &self.twilio_whatsapp_number,
        ) {
            (Some(sid), Some(token), Some(from)) => {
                let mut config = TwilioConfig::new(sid.clone(), token.clone(), from.clone());
                if let Some(base_url) = &self.twilio_api_base_url {
                    config = config.with_api_base_url(base_url.clone());
                }
                Some(config)
            }
            _ => None,
        }
    }
}

fn env_var_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn resolve_path(raw: String) -> Result<PathBuf, io::Error> {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        Ok(path)
    } else {
        let cwd = env::current_dir()?;
        Ok(cwd.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    struct EnvGuard {
        key: String,
        previous: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let previous = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                previous,
            }
        }

        fn unset(key: &str) -> Self {
            let previous = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                previous,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(value) => env::set_var(&self.key, value),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    fn twilio_config_requires_all_three_settings() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _sid = EnvGuard::set("TWILIO_ACCOUNT_SID", "AC123");
        let _token = EnvGuard::set("TWILIO_AUTH_TOKEN", "token");
        let _from = EnvGuard::unset("TWILIO_WHATSAPP_NUMBER");

        let config = ServiceConfig::from_env().expect("config");
        assert!(config.twilio_config().is_none());

        let _from = EnvGuard::set("TWILIO_WHATSAPP_NUMBER", "whatsapp:+14155238886");
        let config = ServiceConfig::from_env().expect("config");
        let twilio = config.twilio_config().expect("twilio config");
        assert_eq!(twilio.account_sid, "AC123");
    }

    #[test]
    fn blank_env_values_count_as_unset() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _key = EnvGuard::set("COHERE_API_KEY", "   ");

        let config = ServiceConfig::from_env().expect("config");
        assert!(config.cohere_api_key.is_none());
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _host = EnvGuard::unset("REMINDER_SERVICE_HOST");
        let _port = EnvGuard::unset("REMINDER_SERVICE_PORT");
        let _model = EnvGuard::unset("COHERE_MODEL");

        let config = ServiceConfig::from_env().expect("config");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.cohere_model, DEFAULT_MODEL);
        assert!(config.latest_roster_path().ends_with("uploads/latest.csv"));
    }
}
