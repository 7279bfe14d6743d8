//! Closed-form agro-meteorological formulas.
//!
//! Everything here is pure. Temperatures are °C, relative humidity is a
//! percentage (0-100) and pressures are kPa. The empirical fits are valid for
//! roughly T ∈ [-10, 50] °C and RH ∈ [0, 100] %; values outside that range are
//! extrapolations and are not guarded.

use crate::error::PhysicsError;

/// Saturation vapour pressure (Tetens approximation), kPa
pub fn saturation_vapor_pressure(temp_c: f64) -> f64 {
    0.61078 * (17.27 * temp_c / (temp_c + 237.3)).exp()
}

/// Actual vapour pressure for a given relative humidity, kPa
pub fn actual_vapor_pressure(temp_c: f64, humidity_percent: f64) -> f64 {
    saturation_vapor_pressure(temp_c) * humidity_percent / 100.0
}

/// Wet-bulb temperature from air temperature and relative humidity.
///
/// Stull (2011) empirical fit at sea-level pressure. Accuracy degrades below
/// 5 % RH and very slightly overshoots at exactly 100 % RH.
pub fn wet_bulb_temperature(temp_c: f64, humidity_percent: f64) -> f64 {
    let t = temp_c;
    let rh = humidity_percent;

    t * (0.151977 * (rh + 8.313659).sqrt()).atan() + (t + rh).atan() - (rh - 1.676331).atan()
        + 0.00391838 * rh.powf(1.5) * (0.023101 * rh).atan()
        - 4.686035
}

/// Vapour pressure deficit (kPa, 2 decimals) and wet-bulb depression
/// ("Delta T", °C, 1 decimal).
///
/// The deficit is not clamped: a negative value only arises from
/// non-physical humidity (> 100 %) and is left visible as a data-quality
/// signal.
pub fn vapor_pressure_deficit(temp_c: f64, humidity_percent: f64) -> (f64, f64) {
    let es = saturation_vapor_pressure(temp_c);
    let ea = es * humidity_percent / 100.0;
    let vpd = round_to(es - ea, 2);

    let wet_bulb = wet_bulb_temperature(temp_c, humidity_percent);
    let delta_t = round_to(temp_c - wet_bulb, 1);

    (vpd, delta_t)
}

/// Simplified, radiation-free Hargreaves-style reference evapotranspiration
/// in mm/day: `0.0023 (T + 17.8) √T · 0.408`.
///
/// The square root is undefined below 0 °C, so sub-zero (and NaN)
/// temperatures are reported as out of domain instead of yielding NaN.
pub fn reference_evapotranspiration(temp_c: f64) -> Result<f64, PhysicsError> {
    if temp_c.is_nan() || temp_c < 0.0 {
        return Err(PhysicsError::OutOfDomain {
            quantity: "ET0",
            value: temp_c,
        });
    }

    Ok(0.0023 * (temp_c + 17.8) * temp_c.sqrt() * 0.408)
}

/// Crop evapotranspiration: ETc = ET0 × Kc
pub fn crop_evapotranspiration(et0_mm: f64, crop_coefficient: f64) -> f64 {
    et0_mm * crop_coefficient
}

/// Round half away from zero to a fixed number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example_25c_60pct() {
        let es = saturation_vapor_pressure(25.0);
        let ea = actual_vapor_pressure(25.0, 60.0);
        assert!((es - 3.168).abs() < 0.002, "es = {}", es);
        assert!((ea - 1.901).abs() < 0.002, "ea = {}", ea);

        let (vpd, delta_t) = vapor_pressure_deficit(25.0, 60.0);
        assert_eq!(vpd, 1.27);
        assert_eq!(delta_t, 5.5);
    }

    #[test]
    fn vpd_is_non_negative_up_to_saturation() {
        for temp in [-5.0, 0.0, 10.0, 20.0, 30.0, 40.0, 50.0] {
            for rh in [0.0, 1.0, 25.0, 50.0, 75.0, 99.0, 100.0] {
                let (vpd, _) = vapor_pressure_deficit(temp, rh);
                assert!(vpd >= 0.0, "vpd {} at T={} RH={}", vpd, temp, rh);
            }
        }
    }

    #[test]
    fn vpd_is_zero_at_saturation() {
        let (vpd, _) = vapor_pressure_deficit(22.0, 100.0);
        assert_eq!(vpd, 0.0);
    }

    #[test]
    fn vpd_goes_negative_for_supersaturated_input() {
        let (vpd, _) = vapor_pressure_deficit(25.0, 110.0);
        assert!(vpd < 0.0);
    }

    #[test]
    fn delta_t_non_negative_below_saturation() {
        for temp in [5.0, 10.0, 20.0, 30.0, 40.0] {
            for rh in [10.0, 20.0, 40.0, 60.0, 80.0, 90.0, 95.0, 99.0] {
                let (_, delta_t) = vapor_pressure_deficit(temp, rh);
                assert!(delta_t >= 0.0, "delta T {} at T={} RH={}", delta_t, temp, rh);
            }
        }
    }

    #[test]
    fn delta_t_shrinks_towards_saturation() {
        let mut previous = f64::MAX;
        for rh in [20.0, 40.0, 60.0, 80.0, 90.0, 95.0, 99.0] {
            let depression = 20.0 - wet_bulb_temperature(20.0, rh);
            assert!(depression < previous);
            previous = depression;
        }
        assert!(previous < 0.3);
    }

    #[test]
    fn wet_bulb_below_air_temperature_in_dry_air() {
        let tw = wet_bulb_temperature(30.0, 30.0);
        assert!(tw < 30.0);
        assert!((30.0 - tw - 11.6).abs() < 0.1);
    }

    #[test]
    fn et0_known_values() {
        let et0 = reference_evapotranspiration(25.0).unwrap();
        assert!((et0 - 0.2008).abs() < 0.0005, "et0 = {}", et0);
        assert_eq!(reference_evapotranspiration(0.0).unwrap(), 0.0);
    }

    #[test]
    fn et0_out_of_domain_below_freezing() {
        let err = reference_evapotranspiration(-2.0).unwrap_err();
        assert_eq!(
            err,
            PhysicsError::OutOfDomain {
                quantity: "ET0",
                value: -2.0
            }
        );
        assert!(reference_evapotranspiration(f64::NAN).is_err());
    }

    #[test]
    fn etc_scales_with_crop_coefficient() {
        assert!((crop_evapotranspiration(0.2, 0.85) - 0.17).abs() < 1e-9);
        assert_eq!(crop_evapotranspiration(0.0, 1.1), 0.0);
    }

    #[test]
    fn round_to_decimals() {
        assert_eq!(round_to(1.266, 2), 1.27);
        assert_eq!(round_to(5.449, 1), 5.4);
        assert_eq!(round_to(-0.04, 1), -0.0);
    }
}
