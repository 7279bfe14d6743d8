use super::daily::DailyRecord;
use super::phenology::PhenologyState;
use super::recommendation::Recommendation;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Atmospheric demand band derived from the vapour pressure deficit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VpdBand {
    Saturated,
    Ideal,
    Dry,
}

impl VpdBand {
    pub fn classify(vpd_kpa: f64) -> Self {
        if vpd_kpa < 0.4 {
            VpdBand::Saturated
        } else if vpd_kpa > 1.3 {
            VpdBand::Dry
        } else {
            VpdBand::Ideal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VpdBand::Saturated => "Saturated",
            VpdBand::Ideal => "Ideal",
            VpdBand::Dry => "Dry",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            VpdBand::Saturated => "saturated air, transpiration impaired",
            VpdBand::Ideal => "ideal transpiration conditions",
            VpdBand::Dry => "dry air, stomatal closure",
        }
    }
}

impl std::fmt::Display for VpdBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spray suitability from the wet-bulb depression (Delta T)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SprayWindow {
    Favorable,
    Unfavorable,
}

impl SprayWindow {
    pub const MIN_DELTA_T: f64 = 2.0;
    pub const MAX_DELTA_T: f64 = 8.0;

    pub fn classify(delta_t_c: f64) -> Self {
        if (Self::MIN_DELTA_T..=Self::MAX_DELTA_T).contains(&delta_t_c) {
            SprayWindow::Favorable
        } else {
            SprayWindow::Unfavorable
        }
    }

    pub fn is_favorable(&self) -> bool {
        matches!(self, SprayWindow::Favorable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SprayWindow::Favorable => "Favorable",
            SprayWindow::Unfavorable => "Unfavorable",
        }
    }
}

impl std::fmt::Display for SprayWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fungal disease pressure from humidity and rainfall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiseaseRisk {
    High,
    Low,
}

impl DiseaseRisk {
    pub fn classify(humidity_percent: f64, rainfall_mm: f64) -> Self {
        if humidity_percent > 85.0 || rainfall_mm > 2.0 {
            DiseaseRisk::High
        } else {
            DiseaseRisk::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiseaseRisk::High => "High",
            DiseaseRisk::Low => "Low",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DiseaseRisk::High => "high disease pressure, use systemic products",
            DiseaseRisk::Low => "favorable, protectant products sufficient",
        }
    }
}

impl std::fmt::Display for DiseaseRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Nutrient emphasis by days since planting/pruning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NutrientFocus {
    PhosphorusCalcium,
    NitrogenMagnesium,
    PotassiumBoron,
}

impl NutrientFocus {
    pub fn from_elapsed_days(elapsed_days: u32) -> Self {
        match elapsed_days {
            0..=89 => NutrientFocus::PhosphorusCalcium,
            90..=179 => NutrientFocus::NitrogenMagnesium,
            _ => NutrientFocus::PotassiumBoron,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientFocus::PhosphorusCalcium => "Phosphorus + Calcium",
            NutrientFocus::NitrogenMagnesium => "Nitrogen + Magnesium",
            NutrientFocus::PotassiumBoron => "Potassium + Boron",
        }
    }

    pub fn rationale(&self) -> &'static str {
        match self {
            NutrientFocus::PhosphorusCalcium => {
                "Early cycle: root establishment and cell-wall formation."
            }
            NutrientFocus::NitrogenMagnesium => {
                "Mid cycle: canopy growth and chlorophyll synthesis."
            }
            NutrientFocus::PotassiumBoron => {
                "Late cycle: sugar transport, fruit quality and set."
            }
        }
    }
}

impl std::fmt::Display for NutrientFocus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceStatus {
    Deficit,
    Balanced,
    Surplus,
}

impl BalanceStatus {
    const TOLERANCE_MM: f64 = 0.1;

    pub fn classify(balance_mm: f64) -> Self {
        if balance_mm < -Self::TOLERANCE_MM {
            BalanceStatus::Deficit
        } else if balance_mm > Self::TOLERANCE_MM {
            BalanceStatus::Surplus
        } else {
            BalanceStatus::Balanced
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceStatus::Deficit => "Deficit",
            BalanceStatus::Balanced => "Balanced",
            BalanceStatus::Surplus => "Surplus",
        }
    }
}

impl std::fmt::Display for BalanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rainfall against crop water use, today and across the forecast horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterBalance {
    pub today_rain_mm: f64,
    pub today_etc_mm: Option<f64>,
    pub horizon_days: usize,
    pub horizon_rain_mm: f64,
    /// ETc summed over the days where it is defined
    pub horizon_etc_mm: f64,
}

impl WaterBalance {
    pub fn from_records(today: &DailyRecord, outlook: &[DailyRecord]) -> Self {
        Self {
            today_rain_mm: today.rainfall_mm,
            today_etc_mm: today.etc_mm,
            horizon_days: outlook.len(),
            horizon_rain_mm: outlook.iter().map(|d| d.rainfall_mm).sum(),
            horizon_etc_mm: outlook.iter().filter_map(|d| d.etc_mm).sum(),
        }
    }

    pub fn today_balance_mm(&self) -> Option<f64> {
        self.today_etc_mm.map(|etc| self.today_rain_mm - etc)
    }

    pub fn horizon_balance_mm(&self) -> f64 {
        self.horizon_rain_mm - self.horizon_etc_mm
    }

    pub fn horizon_status(&self) -> BalanceStatus {
        BalanceStatus::classify(self.horizon_balance_mm())
    }

    pub fn summary(&self) -> String {
        let today = match self.today_balance_mm() {
            Some(b) => format!(
                "Today: rain {:.1} mm, ETc {:.2} mm, balance {:+.2} mm ({})",
                self.today_rain_mm,
                self.today_etc_mm.unwrap_or_default(),
                b,
                BalanceStatus::classify(b)
            ),
            None => format!(
                "Today: rain {:.1} mm, ETc out of domain",
                self.today_rain_mm
            ),
        };
        format!(
            "{}. Next {} days: rain {:.1} mm, ETc {:.2} mm, balance {:+.2} mm ({})",
            today,
            self.horizon_days,
            self.horizon_rain_mm,
            self.horizon_etc_mm,
            self.horizon_balance_mm(),
            self.horizon_status()
        )
    }
}

/// Today's weather-derived classifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAssessment {
    pub today: DailyRecord,
    pub vpd_band: VpdBand,
    pub spray_window: SprayWindow,
    pub disease_risk: DiseaseRisk,
    pub water_balance: WaterBalance,
    /// All sampled days, today first
    pub outlook: Vec<DailyRecord>,
}

impl WeatherAssessment {
    pub fn new(outlook: &[DailyRecord]) -> Option<Self> {
        let today = outlook.first()?.clone();
        Some(Self {
            vpd_band: VpdBand::classify(today.vpd_kpa),
            spray_window: SprayWindow::classify(today.delta_t_c),
            disease_risk: DiseaseRisk::classify(today.humidity_percent, today.rainfall_mm),
            water_balance: WaterBalance::from_records(&today, outlook),
            today,
            outlook: outlook.to_vec(),
        })
    }

    /// First forecast day (after today) with a favourable Delta T
    pub fn next_spray_day(&self) -> Option<&DailyRecord> {
        self.outlook
            .iter()
            .skip(1)
            .find(|d| SprayWindow::classify(d.delta_t_c).is_favorable())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvisorySource {
    Remote,
    Offline,
}

impl AdvisorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisorySource::Remote => "Remote advisor",
            AdvisorySource::Offline => "Offline keyword advisor",
        }
    }
}

impl std::fmt::Display for AdvisorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    pub text: String,
    pub source: AdvisorySource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryReport {
    pub generated_at: DateTime<Local>,
    pub crop: String,
    pub cultivar: String,
    pub crop_coefficient: f64,
    pub stage: String,
    pub expected_stage: String,
    /// `None` when the forecast was unavailable
    pub weather: Option<WeatherAssessment>,
    pub phenology: PhenologyState,
    pub nutrient_focus: NutrientFocus,
    pub recommendations: Vec<Recommendation>,
    pub note: String,
    pub consultation: Consultation,
}

impl AdvisoryReport {
    /// One-line summary used for mail subjects and the status bar
    pub fn headline(&self) -> String {
        match &self.weather {
            Some(w) => format!(
                "{:.1} °C, VPD {:.2} kPa ({}), spray {}, disease risk {}",
                w.today.temp_c, w.today.vpd_kpa, w.vpd_band, w.spray_window, w.disease_risk
            ),
            None => "forecast unavailable".to_string(),
        }
    }

    pub fn subject(&self) -> String {
        format!(
            "[cropops] {} {}: {}",
            self.crop,
            self.generated_at.format("%Y-%m-%d"),
            self.headline()
        )
    }

    pub fn active_recommendations(&self) -> impl Iterator<Item = &Recommendation> {
        self.recommendations.iter().filter(|r| !r.acknowledged)
    }

    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Agro-meteorological advisory - {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M")
        ));
        out.push_str(&format!(
            "Crop: {} / {} (Kc {:.2}) - stage {}\n\n",
            self.crop, self.cultivar, self.crop_coefficient, self.stage
        ));

        out.push_str("PHENOLOGY\n");
        out.push_str(&format!(
            "  {} days since {}, GDA {:.0} of {:.0} ({}), harvest progress {:.1}%\n",
            self.phenology.elapsed_days,
            self.phenology.reference_date.format("%Y-%m-%d"),
            self.phenology.accumulated_gda,
            self.phenology.target_gda,
            self.phenology.mode,
            self.phenology.harvest_progress
        ));
        out.push_str(&format!(
            "  Nutrient focus: {} - {}\n\n",
            self.nutrient_focus,
            self.nutrient_focus.rationale()
        ));

        out.push_str("CONDITIONS\n");
        match &self.weather {
            Some(w) => {
                out.push_str(&format!(
                    "  Temperature {:.1} °C, humidity {:.0}%, wind {:.1} m/s\n",
                    w.today.temp_c, w.today.humidity_percent, w.today.wind_speed_ms
                ));
                out.push_str(&format!(
                    "  VPD {:.2} kPa: {}\n",
                    w.today.vpd_kpa,
                    w.vpd_band.description()
                ));
                out.push_str(&format!(
                    "  Delta T {:.1} °C: spraying {}\n",
                    w.today.delta_t_c,
                    w.spray_window.as_str().to_lowercase()
                ));
                out.push_str(&format!("  Disease risk: {}\n", w.disease_risk.description()));
                out.push_str(&format!("  Water balance: {}\n\n", w.water_balance.summary()));

                out.push_str("OUTLOOK\n");
                for day in &w.outlook {
                    out.push_str(&format!(
                        "  {}  {:>5.1} °C  {:>3.0}%  VPD {:.2}  ΔT {:>4.1}  rain {:>5.1} mm  ET0 {}  ETc {}\n",
                        day.label(),
                        day.temp_c,
                        day.humidity_percent,
                        day.vpd_kpa,
                        day.delta_t_c,
                        day.rainfall_mm,
                        day.et0_display(),
                        day.etc_display()
                    ));
                }
                out.push('\n');
            }
            None => out.push_str("  Forecast unavailable.\n\n"),
        }

        if !self.recommendations.is_empty() {
            out.push_str("RECOMMENDATIONS\n");
            for rec in &self.recommendations {
                out.push_str(&rec.to_plain_text());
            }
            out.push('\n');
        }

        if !self.note.trim().is_empty() {
            out.push_str(&format!("FIELD NOTE\n  {}\n\n", self.note.trim()));
        }

        out.push_str(&format!("CONSULTATION ({})\n", self.consultation.source));
        for line in self.consultation.text.lines() {
            out.push_str(&format!("  {}\n", line));
        }

        out
    }

    /// Row appended to the run log for this report
    pub fn log_entry(&self) -> RunLogEntry {
        RunLogEntry::new(
            self.generated_at.date_naive(),
            self.weather.as_ref().map(|w| w.today.temp_c),
            self.weather.as_ref().map(|w| w.today.vpd_kpa),
            &self.note,
            &self.consultation.text,
        )
    }
}

/// One row of the persistent run log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub id: Option<i64>,
    pub run_date: NaiveDate,
    pub temp_c: Option<f64>,
    pub vpd_kpa: Option<f64>,
    pub note: String,
    /// Advisory text on a single line, line breaks replaced by `" | "`
    pub advisory: String,
}

impl RunLogEntry {
    pub const LINE_DELIMITER: &'static str = " | ";

    pub fn new(
        run_date: NaiveDate,
        temp_c: Option<f64>,
        vpd_kpa: Option<f64>,
        note: &str,
        advisory: &str,
    ) -> Self {
        Self {
            id: None,
            run_date,
            temp_c,
            vpd_kpa,
            note: note.trim().to_string(),
            advisory: Self::flatten(advisory),
        }
    }

    /// Collapse line breaks into the log delimiter, dropping blank lines
    pub fn flatten(text: &str) -> String {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(Self::LINE_DELIMITER)
    }
}
