use super::forecast::WeatherCondition;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One representative day of the forecast, with its derived indicators.
///
/// Produced by the forecast sampler and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub temp_c: f64,
    pub humidity_percent: f64,
    pub wind_speed_ms: f64,
    pub vpd_kpa: f64,
    pub delta_t_c: f64,
    pub rainfall_mm: f64,
    /// `None` when the temperature is outside the ET0 formula's domain
    pub et0_mm: Option<f64>,
    pub etc_mm: Option<f64>,
    pub condition: WeatherCondition,
}

impl DailyRecord {
    /// Short `dd/mm` label used in tables and reports
    pub fn label(&self) -> String {
        self.date.format("%d/%m").to_string()
    }

    /// A negative deficit can only come from non-physical humidity readings
    pub fn vpd_suspect(&self) -> bool {
        self.vpd_kpa < 0.0
    }

    /// Rainfall minus crop water use; `None` when ETc is out of domain
    pub fn water_balance_mm(&self) -> Option<f64> {
        self.etc_mm.map(|etc| self.rainfall_mm - etc)
    }

    pub fn et0_display(&self) -> String {
        self.et0_mm
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "out of domain".to_string())
    }

    pub fn etc_display(&self) -> String {
        self.etc_mm
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "out of domain".to_string())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn record(temp_c: f64, humidity_percent: f64, rainfall_mm: f64) -> DailyRecord {
        let (vpd_kpa, delta_t_c) =
            crate::logic::physics::vapor_pressure_deficit(temp_c, humidity_percent);
        let et0 = crate::logic::physics::reference_evapotranspiration(temp_c).ok();
        DailyRecord {
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            temp_c,
            humidity_percent,
            wind_speed_ms: 2.0,
            vpd_kpa,
            delta_t_c,
            rainfall_mm,
            et0_mm: et0,
            etc_mm: et0.map(|e| e * 0.8),
            condition: WeatherCondition::Clear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::record;

    #[test]
    fn label_is_day_and_month() {
        assert_eq!(record(25.0, 60.0, 0.0).label(), "15/01");
    }

    #[test]
    fn water_balance_subtracts_crop_use() {
        let r = record(25.0, 60.0, 3.0);
        let balance = r.water_balance_mm().unwrap();
        assert!((balance - (3.0 - r.etc_mm.unwrap())).abs() < 1e-9);
    }

    #[test]
    fn out_of_domain_et_is_labelled() {
        let r = record(-3.0, 80.0, 0.0);
        assert!(r.et0_mm.is_none());
        assert!(r.water_balance_mm().is_none());
        assert_eq!(r.et0_display(), "out of domain");
    }

    #[test]
    fn supersaturated_humidity_flags_vpd() {
        assert!(record(20.0, 105.0, 0.0).vpd_suspect());
        assert!(!record(20.0, 60.0, 0.0).vpd_suspect());
    }
}
