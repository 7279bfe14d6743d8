pub mod keyword;

pub use keyword::{KeywordAdvisor, NoteTopic};

use crate::config::AdvisorConfig;
use crate::datasources::RemoteAdvisor;
use crate::error::Result;
use crate::models::{AdvisorySource, Consultation};
use tracing::{info, warn};

/// The consultation capability, remote or offline.
///
/// A remote failure never surfaces to the caller: the keyword advisor answers
/// instead and the consultation is tagged `Offline`.
pub enum AdvisoryProvider {
    Remote {
        advisor: RemoteAdvisor,
        fallback: KeywordAdvisor,
    },
    Offline(KeywordAdvisor),
}

impl AdvisoryProvider {
    pub fn offline() -> Self {
        AdvisoryProvider::Offline(KeywordAdvisor)
    }

    /// Remote when the advisor section is enabled and has a key, offline otherwise
    pub fn from_config(config: Option<&AdvisorConfig>) -> Result<Self> {
        match config {
            Some(cfg) if cfg.enabled && cfg.has_credentials() => {
                let advisor = RemoteAdvisor::new(cfg.clone())?;
                info!(model = advisor.model(), "Using remote advisor");
                Ok(AdvisoryProvider::Remote {
                    advisor,
                    fallback: KeywordAdvisor,
                })
            }
            Some(_) => {
                info!("Advisor has no credentials, using offline advisor");
                Ok(Self::offline())
            }
            None => Ok(Self::offline()),
        }
    }

    pub fn source(&self) -> AdvisorySource {
        match self {
            AdvisoryProvider::Remote { .. } => AdvisorySource::Remote,
            AdvisoryProvider::Offline(_) => AdvisorySource::Offline,
        }
    }

    /// Ask for advice on `prompt`; the offline path only looks at `note`
    pub async fn consult(&self, prompt: &str, note: &str) -> Consultation {
        match self {
            AdvisoryProvider::Remote { advisor, fallback } => {
                match advisor.consult(prompt).await {
                    Ok(text) => Consultation {
                        text,
                        source: AdvisorySource::Remote,
                    },
                    Err(e) => {
                        warn!("Remote advisor failed, using offline advisor: {}", e);
                        Consultation {
                            text: fallback.consult(note),
                            source: AdvisorySource::Offline,
                        }
                    }
                }
            }
            AdvisoryProvider::Offline(advisor) => Consultation {
                text: advisor.consult(note),
                source: AdvisorySource::Offline,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advisor_config(api_key: &str, base_url: &str) -> AdvisorConfig {
        AdvisorConfig {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: "gpt-4o-mini".into(),
            timeout_secs: 1,
            enabled: true,
        }
    }

    #[test]
    fn missing_credentials_select_offline() {
        let provider = AdvisoryProvider::from_config(None).unwrap();
        assert_eq!(provider.source(), AdvisorySource::Offline);

        let cfg = advisor_config("", "https://api.openai.com/v1");
        let provider = AdvisoryProvider::from_config(Some(&cfg)).unwrap();
        assert_eq!(provider.source(), AdvisorySource::Offline);
    }

    #[test]
    fn credentials_select_remote() {
        let cfg = advisor_config("sk-test", "https://api.openai.com/v1");
        let provider = AdvisoryProvider::from_config(Some(&cfg)).unwrap();
        assert_eq!(provider.source(), AdvisorySource::Remote);
    }

    #[tokio::test]
    async fn offline_consultation_needs_no_network() {
        let consultation = AdvisoryProvider::offline()
            .consult("ignored prompt", "choveu bastante")
            .await;
        assert_eq!(consultation.source, AdvisorySource::Offline);
        assert_eq!(consultation.text, keyword::HYDRIC_ALERT);
    }

    #[tokio::test]
    async fn remote_failure_falls_back_to_offline() {
        let cfg = advisor_config("sk-test", "http://127.0.0.1:9");
        let provider = AdvisoryProvider::from_config(Some(&cfg)).unwrap();

        let consultation = provider.consult("prompt", "applied NPK").await;
        assert_eq!(consultation.source, AdvisorySource::Offline);
        assert_eq!(consultation.text, keyword::FERTILIZATION_NOTICE);
    }
}
