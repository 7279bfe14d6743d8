use crate::error::{CropOpsError, Result};
use crate::models::{CropId, CropRegistry};
use chrono::NaiveDate;
use dialoguer::{Input, Password, Select};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub farm: FarmConfig,
    pub openweathermap: Option<OpenWeatherMapConfig>,
    pub advisor: Option<AdvisorConfig>,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FarmConfig {
    pub name: String,
    /// Crop name or alias, e.g. "grape", "café"
    pub crop: String,
    /// Defaults to the crop's first cultivar
    pub cultivar: Option<String>,
    /// Current stage as reported by the grower; derived from progress when absent
    pub stage: Option<String>,
    /// Planting or pruning date
    pub reference_date: NaiveDate,
    /// Overrides the crop table's thermal target
    pub target_gda: Option<f64>,
    /// Overrides the crop table's average daily accumulation
    pub average_daily_gda: Option<f64>,
}

impl FarmConfig {
    pub fn crop_id(&self) -> Result<CropId> {
        CropId::from_str(&self.crop)
            .ok_or_else(|| CropOpsError::Config(format!("unknown crop '{}'", self.crop)))
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct OpenWeatherMapConfig {
    pub api_key: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// City query ("Bento Goncalves,BR"), used when coordinates are absent
    pub place: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_weather_timeout")]
    pub timeout_secs: u64,
}

/// Where to ask the forecast for
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastQuery {
    Coordinates { latitude: f64, longitude: f64 },
    Place(String),
}

impl OpenWeatherMapConfig {
    pub fn query(&self) -> Result<ForecastQuery> {
        match (self.latitude, self.longitude, &self.place) {
            (Some(latitude), Some(longitude), _) => Ok(ForecastQuery::Coordinates {
                latitude,
                longitude,
            }),
            (_, _, Some(place)) if !place.trim().is_empty() => {
                Ok(ForecastQuery::Place(place.trim().to_string()))
            }
            _ => Err(CropOpsError::Config(
                "openweathermap needs latitude/longitude or a place".into(),
            )),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_weather_timeout() -> u64 {
    10
}

impl std::fmt::Debug for OpenWeatherMapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherMapConfig")
            .field("api_key", &"[REDACTED]")
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("place", &self.place)
            .field("enabled", &self.enabled)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// OpenAI-compatible chat completions endpoint
#[derive(Clone, Deserialize, Serialize)]
pub struct AdvisorConfig {
    pub api_key: String,
    #[serde(default = "default_advisor_url")]
    pub base_url: String,
    #[serde(default = "default_advisor_model")]
    pub model: String,
    #[serde(default = "default_advisor_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl AdvisorConfig {
    /// False when the key is empty or an unresolved `${VAR}` placeholder
    pub fn has_credentials(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && !key.starts_with("${")
    }
}

fn default_advisor_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_advisor_model() -> String {
    "gpt-4o-mini".into()
}

fn default_advisor_timeout() -> u64 {
    30
}

impl std::fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port", deserialize_with = "deserialize_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
    /// STARTTLS on the submission port; false means implicit TLS
    #[serde(default = "default_enabled")]
    pub starttls: bool,
}

fn default_smtp_port() -> u16 {
    587
}

fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    // A substituted ${SMTP_PORT} arrives as a string
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u16),
        Text(String),
    }

    match PortValue::deserialize(deserializer)? {
        PortValue::Number(port) => Ok(port),
        PortValue::Text(value) => value.trim().parse::<u16>().map_err(|_| {
            D::Error::custom(format!(
                "invalid port '{}' - ensure SMTP_PORT environment variable is set",
                value
            ))
        }),
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("starttls", &self.starttls)
            .finish()
    }
}

impl Config {
    pub fn load(config_override: Option<&PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p.clone(),
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(CropOpsError::Config(format!(
                "Config file not found at {:?}. Run `cropops init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| CropOpsError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&config_str)
    }

    /// Parse YAML after substituting `${VAR}` placeholders
    pub fn from_yaml(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content)?;

        serde_yaml::from_str(&content)
            .map_err(|e| CropOpsError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Check that the farm section names a known crop, cultivar and stage
    pub fn validate(&self, registry: &CropRegistry) -> Result<()> {
        let crop_id = self.farm.crop_id()?;
        if let Some(ref cultivar) = self.farm.cultivar {
            registry.cultivar(crop_id, cultivar)?;
        }
        if let Some(ref stage) = self.farm.stage {
            registry.stage(crop_id, stage)?;
        }
        if matches!(self.farm.target_gda, Some(t) if t <= 0.0) {
            return Err(CropOpsError::Config("target_gda must be positive".into()));
        }
        if matches!(self.farm.average_daily_gda, Some(a) if a < 0.0) {
            return Err(CropOpsError::Config(
                "average_daily_gda cannot be negative".into(),
            ));
        }
        if let Some(ref owm) = self.openweathermap {
            owm.query()?;
        }
        Ok(())
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let default_path = Self::default_config_path()?;
        Ok(default_path)
    }

    /// Returns true if a config file can be found in any standard location.
    pub fn exists(config_override: Option<&PathBuf>) -> bool {
        match config_override {
            Some(p) => p.exists(),
            None => Self::find_config_path()
                .map(|p| p.exists())
                .unwrap_or(false),
        }
    }

    /// Default path for writing new config files (~/.config/cropops/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CropOpsError::Config("Cannot determine config directory".into()))?
            .join("cropops");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the loaded Config and the path it was written to.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        let input_err = |e: dialoguer::Error| CropOpsError::Config(format!("Input error: {}", e));

        println!();
        println!("Let's set up CropOps!");
        println!();

        // --- Farm ---
        println!("Farm");
        let name: String = Input::new()
            .with_prompt("  Farm or plot name")
            .default("Main Plot".into())
            .interact_text()
            .map_err(input_err)?;

        let crops = CropId::all();
        let crop_names: Vec<&str> = crops.iter().map(|c| c.as_str()).collect();
        let crop_index = Select::new()
            .with_prompt("  Crop")
            .items(&crop_names)
            .default(0)
            .interact()
            .map_err(input_err)?;
        let crop_id = crops[crop_index];

        let registry = CropRegistry::builtin()?;
        let profile = registry.get(crop_id)?;
        let cultivar_names: Vec<&str> = profile.cultivars.iter().map(|c| c.name.as_str()).collect();
        let cultivar_index = Select::new()
            .with_prompt("  Cultivar")
            .items(&cultivar_names)
            .default(0)
            .interact()
            .map_err(input_err)?;

        let reference_date: String = Input::new()
            .with_prompt("  Planting/pruning date (YYYY-MM-DD)")
            .validate_with(|input: &String| -> std::result::Result<(), String> {
                NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
                    .map(|_| ())
                    .map_err(|_| "expected YYYY-MM-DD".to_string())
            })
            .interact_text()
            .map_err(input_err)?;
        let reference_date = NaiveDate::parse_from_str(reference_date.trim(), "%Y-%m-%d")
            .map_err(|e| CropOpsError::Config(format!("Invalid date: {}", e)))?;

        println!();

        // --- OpenWeatherMap (optional) ---
        println!("OpenWeatherMap (leave API key blank to skip)");
        let owm_api_key: String = Input::new()
            .with_prompt("  API key")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(input_err)?;

        let openweathermap = if owm_api_key.is_empty() {
            None
        } else {
            let place: String = Input::new()
                .with_prompt("  Place (City,CC), blank to enter coordinates")
                .default(String::new())
                .allow_empty(true)
                .interact_text()
                .map_err(input_err)?;

            let (latitude, longitude, place) = if place.trim().is_empty() {
                let latitude: f64 = Input::new()
                    .with_prompt("  Latitude")
                    .default(-29.17)
                    .interact_text()
                    .map_err(input_err)?;
                let longitude: f64 = Input::new()
                    .with_prompt("  Longitude")
                    .default(-51.52)
                    .interact_text()
                    .map_err(input_err)?;
                (Some(latitude), Some(longitude), None)
            } else {
                (None, None, Some(place))
            };

            Some(OpenWeatherMapConfig {
                api_key: owm_api_key,
                latitude,
                longitude,
                place,
                enabled: true,
                timeout_secs: default_weather_timeout(),
            })
        };

        println!();

        // --- Advisor (optional) ---
        println!("Remote advisor (leave API key blank to use the offline advisor)");
        let advisor_key: String = Password::new()
            .with_prompt("  API key")
            .allow_empty_password(true)
            .interact()
            .map_err(input_err)?;

        let advisor = if advisor_key.is_empty() {
            None
        } else {
            let base_url: String = Input::new()
                .with_prompt("  Base URL")
                .default(default_advisor_url())
                .interact_text()
                .map_err(input_err)?;
            let model: String = Input::new()
                .with_prompt("  Model")
                .default(default_advisor_model())
                .interact_text()
                .map_err(input_err)?;
            Some(AdvisorConfig {
                api_key: advisor_key,
                base_url,
                model,
                timeout_secs: default_advisor_timeout(),
                enabled: true,
            })
        };

        println!();

        // --- SMTP (optional) ---
        println!("Email reports (leave host blank to skip)");
        let smtp_host: String = Input::new()
            .with_prompt("  SMTP host")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(input_err)?;

        let smtp = if smtp_host.is_empty() {
            None
        } else {
            let port: u16 = Input::new()
                .with_prompt("  Port")
                .default(default_smtp_port())
                .interact_text()
                .map_err(input_err)?;
            let username: String = Input::new()
                .with_prompt("  Username")
                .interact_text()
                .map_err(input_err)?;
            let password: String = Password::new()
                .with_prompt("  Password")
                .allow_empty_password(true)
                .interact()
                .map_err(input_err)?;
            let from: String = Input::new()
                .with_prompt("  From address")
                .default(username.clone())
                .interact_text()
                .map_err(input_err)?;
            let to: String = Input::new()
                .with_prompt("  Recipients (comma separated)")
                .default(from.clone())
                .interact_text()
                .map_err(input_err)?;

            Some(SmtpConfig {
                host: smtp_host,
                port,
                username,
                password,
                from,
                to: to
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                starttls: true,
            })
        };

        println!();

        let config = Config {
            farm: FarmConfig {
                name,
                crop: crop_id.as_str().to_lowercase(),
                cultivar: Some(cultivar_names[cultivar_index].to_string()),
                stage: None,
                reference_date,
                target_gda: None,
                average_daily_gda: None,
            },
            openweathermap,
            advisor,
            smtp,
        };

        let config_path = Self::default_config_path()?;
        config.save(&config_path)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    /// Write the config as YAML with a header comment
    pub fn save(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| CropOpsError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# CropOps Configuration\n# Generated by `cropops init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(path, content)?;
        Ok(())
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut result = content.to_string();

        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| CropOpsError::Config(format!("Invalid placeholder pattern: {}", e)))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            match std::env::var(var_name) {
                Ok(value) => result = result.replace(placeholder, &value),
                Err(_) => tracing::debug!("{} is not set, leaving placeholder", var_name),
            }
        }

        Ok(result)
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        // CLI override takes priority
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("CROPOPS_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| CropOpsError::Config("Cannot determine data directory".into()))?
            .join("cropops");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn db_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("cropops.db"))
    }

    pub fn log_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("cropops.log"))
    }
}
