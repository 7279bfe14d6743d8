use super::composer::{AdvisoryComposer, AdvisoryInput};
use super::phenology::PhenologyAccumulator;
use super::sampler::ForecastSampler;
use crate::advisors::AdvisoryProvider;
use crate::config::{Config, FarmConfig};
use crate::datasources::OpenWeatherMapClient;
use crate::db::Database;
use crate::error::{CropOpsError, Result};
use crate::models::{
    AdvisoryReport, AdvisorySource, CropProfile, CropRegistry, Cultivar, DailyRecord,
    PhenologyState, Stage, TemperatureSample,
};
use chrono::{Local, NaiveDate};

const CULTIVAR_SETTING: &str = "cultivar";
const STAGE_SETTING: &str = "stage";

/// Owns the collaborators and the latest advisory.
///
/// Each refresh runs the whole pipeline: fetch and sample the forecast,
/// store the first forecast temperature, accumulate growing degrees and compose the
/// report. Collaborator failures are logged and degrade the report; they
/// never abort it.
pub struct DataSyncService {
    farm: FarmConfig,
    db: Database,
    crop: CropProfile,
    cultivar: String,
    stage: Option<String>,
    openweathermap_client: Option<OpenWeatherMapClient>,
    provider: AdvisoryProvider,
    composer: AdvisoryComposer,
    records: Vec<DailyRecord>,
    phenology: Option<PhenologyState>,
    report: Option<AdvisoryReport>,
}

impl DataSyncService {
    pub fn new(config: &Config, db: Database) -> Result<Self> {
        let registry = CropRegistry::builtin()?;
        config.validate(&registry)?;
        let crop = registry.get(config.farm.crop_id()?)?.clone();

        let openweathermap_client = match config
            .openweathermap
            .as_ref()
            .filter(|c| c.enabled && !c.api_key.is_empty())
        {
            Some(c) => {
                tracing::info!("OpenWeatherMap client configured for forecast data");
                Some(OpenWeatherMapClient::new(c.clone())?)
            }
            None => {
                tracing::info!("OpenWeatherMap not configured - advisories will lack weather");
                None
            }
        };

        let provider = AdvisoryProvider::from_config(config.advisor.as_ref())?;

        Ok(Self::with_parts(config.farm.clone(), db, crop, openweathermap_client, provider))
    }

    fn with_parts(
        farm: FarmConfig,
        db: Database,
        crop: CropProfile,
        openweathermap_client: Option<OpenWeatherMapClient>,
        provider: AdvisoryProvider,
    ) -> Self {
        // Selections made in the dashboard outlive the config file's defaults
        let stored = |key: &str| match db.get_setting(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read setting {}: {}", key, e);
                None
            }
        };

        let cultivar = stored(CULTIVAR_SETTING)
            .filter(|name| crop.cultivar(name).is_some())
            .or_else(|| farm.cultivar.clone())
            .unwrap_or_else(|| crop.default_cultivar().name.clone());

        let stage = stored(STAGE_SETTING)
            .filter(|name| crop.stage(name).is_some())
            .or_else(|| farm.stage.clone());

        Self {
            farm,
            db,
            crop,
            cultivar,
            stage,
            openweathermap_client,
            provider,
            composer: AdvisoryComposer::new(),
            records: Vec::new(),
            phenology: None,
            report: None,
        }
    }

    pub fn farm(&self) -> &FarmConfig {
        &self.farm
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn crop(&self) -> &CropProfile {
        &self.crop
    }

    pub fn cultivar(&self) -> &Cultivar {
        self.crop
            .cultivar(&self.cultivar)
            .unwrap_or_else(|| self.crop.default_cultivar())
    }

    /// Stage reported by the grower, if any
    pub fn stage(&self) -> Option<&Stage> {
        self.stage.as_deref().and_then(|name| self.crop.stage(name))
    }

    pub fn advisor_source(&self) -> AdvisorySource {
        self.provider.source()
    }

    pub fn has_forecast_source(&self) -> bool {
        self.openweathermap_client.is_some()
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn phenology(&self) -> Option<&PhenologyState> {
        self.phenology.as_ref()
    }

    pub fn report(&self) -> Option<&AdvisoryReport> {
        self.report.as_ref()
    }

    pub fn set_cultivar(&mut self, name: &str) -> Result<()> {
        let cultivar = self.crop.cultivar(name).ok_or_else(|| {
            CropOpsError::NotFound(format!("cultivar '{}'", name))
        })?;
        self.cultivar = cultivar.name.clone();
        self.db.set_setting(CULTIVAR_SETTING, &self.cultivar)?;
        Ok(())
    }

    /// Set the reported stage; `None` goes back to the thermal estimate
    pub fn set_stage(&mut self, name: Option<&str>) -> Result<()> {
        match name {
            Some(name) => {
                let stage = self.crop.stage(name).ok_or_else(|| {
                    CropOpsError::NotFound(format!("stage '{}'", name))
                })?;
                self.stage = Some(stage.name.clone());
                self.db.set_setting(STAGE_SETTING, &stage.name)?;
            }
            None => {
                self.stage = None;
                self.db.delete_setting(STAGE_SETTING)?;
            }
        }
        Ok(())
    }

    async fn fetch_records(&self) -> Vec<DailyRecord> {
        let sampler = ForecastSampler::new(self.cultivar().crop_coefficient);
        match self.openweathermap_client {
            Some(ref client) => sampler.sample_fetched(client.fetch_forecast().await),
            None => Vec::new(),
        }
    }

    /// Keep the first forecast reading as the temperature of its own date
    fn record_first_sample(&self) {
        let Some(first) = self.records.first() else {
            return;
        };
        if let Err(e) = self
            .db
            .record_temperature(&TemperatureSample::new(first.date, first.temp_c))
        {
            tracing::warn!("Failed to store the forecast temperature for {}: {}", first.date, e);
        }
    }

    fn accumulator(&self) -> PhenologyAccumulator {
        let mut acc = PhenologyAccumulator::for_crop(&self.crop);
        if let Some(target) = self.farm.target_gda {
            acc = acc.with_target(target);
        }
        if let Some(average) = self.farm.average_daily_gda {
            acc = acc.with_average_daily_gda(average);
        }
        acc
    }

    pub fn accumulate(&self, today: NaiveDate) -> Result<PhenologyState> {
        let reference = self.farm.reference_date;
        let history = match self.db.temperature_history(reference, today) {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("Temperature history unavailable: {}", e);
                Vec::new()
            }
        };
        self.accumulator().accumulate(reference, today, &history)
    }

    pub async fn refresh(&mut self, note: &str) -> Result<&AdvisoryReport> {
        self.refresh_on(Local::now().date_naive(), note).await
    }

    /// Run the full pipeline as of `today`
    pub async fn refresh_on(&mut self, today: NaiveDate, note: &str) -> Result<&AdvisoryReport> {
        self.records = self.fetch_records().await;
        self.record_first_sample();
        self.phenology = Some(self.accumulate(today)?);
        tracing::debug!(days = self.records.len(), "Refresh complete");
        self.reconsult(note).await
    }

    /// Rebuild the report from the last refresh, e.g. after the note changed
    pub async fn reconsult(&mut self, note: &str) -> Result<&AdvisoryReport> {
        let phenology = match self.phenology {
            Some(ref p) => p.clone(),
            None => self.accumulate(Local::now().date_naive())?,
        };

        let report = {
            let input = AdvisoryInput {
                crop: &self.crop,
                cultivar: self.cultivar(),
                stage: self.stage(),
                records: &self.records,
                phenology: &phenology,
                note,
            };
            self.composer.compose(&input, &self.provider).await
        };

        self.phenology = Some(phenology);
        let report: &AdvisoryReport = self.report.insert(report);
        Ok(report)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::service;
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn refresh_without_forecast_still_reports() {
        let db = Database::open_in_memory().unwrap();
        let mut svc = service(db, date(2025, 9, 1));

        let report = svc.refresh_on(date(2025, 10, 11), "").await.unwrap();
        assert!(report.weather.is_none());
        assert_eq!(report.phenology.elapsed_days, 40);
        assert_eq!(report.consultation.source, AdvisorySource::Offline);
        assert_eq!(report.cultivar, "Niagara Rosada");
    }

    #[tokio::test]
    async fn stored_history_drives_accumulation() {
        let db = Database::open_in_memory().unwrap();
        let reference = date(2025, 9, 1);
        for i in 0..10 {
            db.record_temperature(&TemperatureSample::new(reference + Duration::days(i), 22.0))
                .unwrap();
        }
        let svc = service(db, reference);

        let state = svc.accumulate(reference + Duration::days(10)).unwrap();
        assert_eq!(state.mode, crate::models::GdaMode::Measured);
        assert_eq!(state.accumulated_gda, 120.0);
    }

    #[test]
    fn forecast_temperature_is_keyed_by_its_own_date() {
        let db = Database::open_in_memory().unwrap();
        let mut svc = service(db.clone(), date(2025, 9, 1));
        let mut first = crate::models::daily::fixtures::record(18.5, 60.0, 0.0);
        first.date = date(2026, 1, 14);
        svc.records = vec![first];

        svc.record_first_sample();

        let stored = db.temperature_history(date(2026, 1, 1), date(2026, 2, 1)).unwrap();
        assert_eq!(stored, vec![TemperatureSample::new(date(2026, 1, 14), 18.5)]);
    }

    #[tokio::test]
    async fn future_reference_date_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let mut svc = service(db, date(2030, 1, 1));
        assert!(svc.refresh_on(date(2026, 1, 1), "").await.is_err());
    }

    #[tokio::test]
    async fn reconsult_uses_new_note() {
        let db = Database::open_in_memory().unwrap();
        let mut svc = service(db, date(2025, 9, 1));
        svc.refresh_on(date(2025, 10, 1), "").await.unwrap();

        let report = svc.reconsult("applied NPK").await.unwrap();
        assert_eq!(report.note, "applied NPK");
        assert!(report.consultation.text.starts_with("Fertilisation"));
    }

    #[test]
    fn selections_persist_across_services() {
        let db = Database::open_in_memory().unwrap();
        let mut svc = service(db.clone(), date(2025, 9, 1));
        svc.set_cultivar("isabel").unwrap();
        svc.set_stage(Some("veraison")).unwrap();
        assert!(svc.set_stage(Some("Tillering")).is_err());

        let svc = service(db, date(2025, 9, 1));
        assert_eq!(svc.cultivar().name, "Isabel");
        assert_eq!(svc.stage().unwrap().name, "Veraison");
    }
}
