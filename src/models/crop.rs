//! Crop reference table.
//!
//! The table is static editorial content. It is turned into an immutable
//! [`CropRegistry`] once at startup, and validation happens there: every
//! crop needs at least one cultivar and one stage, positive crop
//! coefficients and a positive thermal target.

use crate::error::{CropOpsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CropId {
    Grape,
    Coffee,
    Tomato,
    Citrus,
}

impl CropId {
    pub fn all() -> &'static [CropId] {
        &[CropId::Grape, CropId::Coffee, CropId::Tomato, CropId::Citrus]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CropId::Grape => "Grape",
            CropId::Coffee => "Coffee",
            CropId::Tomato => "Tomato",
            CropId::Citrus => "Citrus",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "grape" | "grapevine" | "vine" | "uva" | "videira" => Some(CropId::Grape),
            "coffee" | "cafe" | "café" => Some(CropId::Coffee),
            "tomato" | "tomate" => Some(CropId::Tomato),
            "citrus" | "orange" | "laranja" => Some(CropId::Citrus),
            _ => None,
        }
    }
}

impl std::fmt::Display for CropId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cultivar {
    pub name: String,
    /// Kc, scales reference evapotranspiration to this cultivar's water use
    pub crop_coefficient: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    /// Harvest progress (%) at which the stage typically begins
    pub progress_start: f64,
    pub description: String,
    pub physiology: String,
    pub management: String,
    pub chemical_control: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub id: CropId,
    pub base_temp_c: f64,
    pub target_gda: f64,
    /// Fallback daily accumulation when no temperature history exists
    pub average_daily_gda: f64,
    pub cultivars: Vec<Cultivar>,
    /// Ordered by `progress_start`
    pub stages: Vec<Stage>,
}

impl CropProfile {
    pub fn name(&self) -> &'static str {
        self.id.as_str()
    }

    pub fn cultivar(&self, name: &str) -> Option<&Cultivar> {
        self.cultivars
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn default_cultivar(&self) -> &Cultivar {
        &self.cultivars[0]
    }

    /// Stage expected for a given harvest progress
    pub fn stage_for_progress(&self, progress: f64) -> &Stage {
        self.stages
            .iter()
            .rev()
            .find(|s| progress >= s.progress_start)
            .unwrap_or(&self.stages[0])
    }

    fn validate(&self) -> Result<()> {
        if self.cultivars.is_empty() {
            return Err(CropOpsError::InvalidData(format!(
                "crop {} has no cultivars",
                self.id
            )));
        }
        if self.stages.is_empty() {
            return Err(CropOpsError::InvalidData(format!(
                "crop {} has no phenological stages",
                self.id
            )));
        }
        if let Some(c) = self.cultivars.iter().find(|c| c.crop_coefficient <= 0.0) {
            return Err(CropOpsError::InvalidData(format!(
                "cultivar {} of {} has a non-positive crop coefficient",
                c.name, self.id
            )));
        }
        if self.target_gda <= 0.0 || self.average_daily_gda < 0.0 {
            return Err(CropOpsError::InvalidData(format!(
                "crop {} has an invalid thermal target",
                self.id
            )));
        }
        if self
            .stages
            .windows(2)
            .any(|w| w[1].progress_start < w[0].progress_start)
        {
            return Err(CropOpsError::InvalidData(format!(
                "stages of {} are not ordered by progress",
                self.id
            )));
        }
        Ok(())
    }
}

/// Immutable, validated set of crop profiles
#[derive(Debug, Clone)]
pub struct CropRegistry {
    crops: BTreeMap<CropId, CropProfile>,
}

impl CropRegistry {
    pub fn from_profiles(profiles: Vec<CropProfile>) -> Result<Self> {
        let mut crops = BTreeMap::new();
        for profile in profiles {
            profile.validate()?;
            if crops.insert(profile.id, profile).is_some() {
                return Err(CropOpsError::InvalidData(
                    "crop table lists the same crop twice".into(),
                ));
            }
        }
        Ok(Self { crops })
    }

    /// Registry built from the bundled reference table
    pub fn builtin() -> Result<Self> {
        Self::from_profiles(builtin_profiles())
    }

    pub fn get(&self, id: CropId) -> Result<&CropProfile> {
        self.crops
            .get(&id)
            .ok_or_else(|| CropOpsError::NotFound(format!("crop {}", id)))
    }

    pub fn cultivar(&self, id: CropId, name: &str) -> Result<&Cultivar> {
        self.get(id)?
            .cultivar(name)
            .ok_or_else(|| CropOpsError::NotFound(format!("cultivar '{}' of {}", name, id)))
    }

    pub fn stage(&self, id: CropId, name: &str) -> Result<&Stage> {
        self.get(id)?
            .stage(name)
            .ok_or_else(|| CropOpsError::NotFound(format!("stage '{}' of {}", name, id)))
    }

    pub fn ids(&self) -> Vec<CropId> {
        self.crops.keys().copied().collect()
    }
}

fn cultivar(name: &str, crop_coefficient: f64, notes: &str) -> Cultivar {
    Cultivar {
        name: name.to_string(),
        crop_coefficient,
        notes: notes.to_string(),
    }
}

fn stage(
    name: &str,
    progress_start: f64,
    description: &str,
    physiology: &str,
    management: &str,
    chemical_control: &str,
) -> Stage {
    Stage {
        name: name.to_string(),
        progress_start,
        description: description.to_string(),
        physiology: physiology.to_string(),
        management: management.to_string(),
        chemical_control: chemical_control.to_string(),
    }
}

fn builtin_profiles() -> Vec<CropProfile> {
    vec![
        CropProfile {
            id: CropId::Grape,
            base_temp_c: 10.0,
            target_gda: 1600.0,
            average_daily_gda: 11.0,
            cultivars: vec![
                cultivar(
                    "Niagara Rosada",
                    0.70,
                    "Rustic table grape, tolerant of humid summers but prone to berry cracking after heavy rain.",
                ),
                cultivar(
                    "Isabel",
                    0.75,
                    "Vigorous juice grape, moderate downy mildew tolerance.",
                ),
                cultivar(
                    "Cabernet Sauvignon",
                    0.80,
                    "Late-ripening wine grape, needs a dry veraison for colour and sugar.",
                ),
            ],
            stages: vec![
                stage(
                    "Budbreak",
                    0.0,
                    "Buds swell and green tissue emerges after pruning.",
                    "Growth runs on reserves stored in canes and roots; new tissue is frost sensitive.",
                    "Apply budbreak regulators evenly, remove double shoots, keep the vineyard floor low.",
                    "Protect green tissue against anthracnose with copper or mancozeb after rain.",
                ),
                stage(
                    "Flowering",
                    20.0,
                    "Inflorescences open and pollination takes place.",
                    "Boron and calcium demand peaks; fruit set is sensitive to cold and wet spells.",
                    "Avoid heavy irrigation and shoot topping during bloom; thin leaves around clusters.",
                    "Downy mildew window: systemic products when humidity stays high.",
                ),
                stage(
                    "Fruit set",
                    35.0,
                    "Berries form and begin cell division.",
                    "Rapid berry growth depends on water and nitrogen supply.",
                    "Cluster thinning and girdling if targeting table grape size.",
                    "Powdery mildew pressure in dry, warm spells; sulphur in cool hours.",
                ),
                stage(
                    "Veraison",
                    65.0,
                    "Berries soften and change colour.",
                    "Sugars accumulate and acidity drops; potassium drives ripening.",
                    "Reduce irrigation gradually, bag table-grape clusters.",
                    "Botrytis and sour rot risk rises; respect pre-harvest intervals.",
                ),
                stage(
                    "Ripening",
                    85.0,
                    "Berries approach harvest maturity.",
                    "Sugar loading slows; rain can dilute and crack berries.",
                    "Monitor Brix daily, plan harvest for dry mornings.",
                    "Only products with short pre-harvest intervals.",
                ),
            ],
        },
        CropProfile {
            id: CropId::Coffee,
            base_temp_c: 10.0,
            target_gda: 2800.0,
            average_daily_gda: 9.0,
            cultivars: vec![
                cultivar(
                    "Catuai Vermelho",
                    0.90,
                    "Compact arabica, high yield, susceptible to leaf rust.",
                ),
                cultivar(
                    "Mundo Novo",
                    0.95,
                    "Tall arabica with deep roots and good drought tolerance.",
                ),
                cultivar(
                    "Conilon",
                    1.05,
                    "Robusta type, heat tolerant, needs irrigation in dry winters.",
                ),
            ],
            stages: vec![
                stage(
                    "Vegetative",
                    0.0,
                    "New nodes and leaves form on plagiotropic branches.",
                    "Node count sets next season's flowering potential.",
                    "Weed control in the row, nitrogen split in the rainy season.",
                    "Leaf rust monitoring; preventive copper where incidence rises.",
                ),
                stage(
                    "Flowering",
                    25.0,
                    "Flower buds open after the first significant rain.",
                    "Water stress before flowering synchronises bloom; heat aborts flowers.",
                    "Avoid mechanical operations that damage flowers.",
                    "Phoma and bacterial blight risk in cold, windy sites.",
                ),
                stage(
                    "Grain filling",
                    45.0,
                    "Cherries expand and the endosperm fills.",
                    "Highest water and potassium demand of the cycle.",
                    "Keep soil moisture steady, complete potassium split.",
                    "Coffee berry borer monitoring; leaf rust peaks.",
                ),
                stage(
                    "Maturation",
                    80.0,
                    "Cherries turn from green to red or yellow.",
                    "Sugar accumulation in the pulp; uneven ripening is common.",
                    "Plan selective picking and drying yard capacity.",
                    "Respect pre-harvest intervals for borer control.",
                ),
            ],
        },
        CropProfile {
            id: CropId::Tomato,
            base_temp_c: 10.0,
            target_gda: 1400.0,
            average_daily_gda: 12.0,
            cultivars: vec![
                cultivar(
                    "Santa Cruz",
                    1.05,
                    "Indeterminate salad tomato, staked, long harvest window.",
                ),
                cultivar(
                    "Italian San Marzano",
                    1.10,
                    "Elongated fruit, prone to blossom-end rot under irregular watering.",
                ),
            ],
            stages: vec![
                stage(
                    "Establishment",
                    0.0,
                    "Transplants root into the bed.",
                    "Root growth needs phosphorus and steady moisture.",
                    "Light, frequent irrigation; stake and tie early.",
                    "Whitefly and thrips screening to prevent virus spread.",
                ),
                stage(
                    "Vegetative",
                    15.0,
                    "Leaf canopy and stem develop.",
                    "Nitrogen drives canopy; excess delays flowering.",
                    "Remove side shoots, keep canopy ventilated.",
                    "Early blight and late blight surveillance after rain.",
                ),
                stage(
                    "Flowering",
                    35.0,
                    "Trusses flower and set fruit.",
                    "Calcium and boron support fruit set; heat above 32 °C aborts flowers.",
                    "Avoid water stress; vibrate trusses in protected cultivation.",
                    "Botrytis on flowers in humid nights.",
                ),
                stage(
                    "Fruiting",
                    60.0,
                    "Fruit grows and ripens on successive trusses.",
                    "Potassium governs colour and sugar; irregular water causes cracking.",
                    "Constant irrigation, harvest at breaker stage.",
                    "Tuta absoluta and fruit borer; respect pre-harvest intervals.",
                ),
            ],
        },
        CropProfile {
            id: CropId::Citrus,
            base_temp_c: 13.0,
            target_gda: 2200.0,
            average_daily_gda: 8.0,
            cultivars: vec![
                cultivar("Pera", 0.70, "Main juice orange, late season."),
                cultivar(
                    "Valencia",
                    0.65,
                    "Late orange, tolerates holding on the tree.",
                ),
                cultivar("Tahiti Lime", 0.75, "Acid lime, flowers several times a year."),
            ],
            stages: vec![
                stage(
                    "Flush",
                    0.0,
                    "New vegetative shoots emerge.",
                    "Young flush feeds on nitrogen and is the psyllid's breeding site.",
                    "Nitrogen split, irrigation if soil is dry.",
                    "Asian citrus psyllid control on new flush.",
                ),
                stage(
                    "Bloom",
                    15.0,
                    "Flowers open across the canopy.",
                    "Boron and zinc support pollen and fruit set.",
                    "Avoid pruning and heavy machinery traffic.",
                    "Postbloom fruit drop risk in rainy bloom; protect petals.",
                ),
                stage(
                    "Fruit set",
                    30.0,
                    "Young fruit set and natural drop occurs.",
                    "Water stress increases physiological drop.",
                    "Keep irrigation steady, monitor drop.",
                    "Citrus black spot protection starts here.",
                ),
                stage(
                    "Fruit growth",
                    50.0,
                    "Fruit expands by cell enlargement.",
                    "Potassium and water define final size.",
                    "Regular irrigation and potassium supply.",
                    "Rust mite and black spot monitoring.",
                ),
                stage(
                    "Maturation",
                    85.0,
                    "Peel colour changes and juice ratio rises.",
                    "Sugar to acid ratio increases; cold nights improve colour.",
                    "Sample juice ratio before harvest scheduling.",
                    "Only short pre-harvest interval products.",
                ),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_validates() {
        let registry = CropRegistry::builtin().unwrap();
        assert_eq!(registry.ids(), CropId::all().to_vec());
        for id in registry.ids() {
            let crop = registry.get(id).unwrap();
            assert!(!crop.cultivars.is_empty());
            assert!(!crop.stages.is_empty());
        }
    }

    #[test]
    fn crop_id_from_str_aliases() {
        assert_eq!(CropId::from_str("grape"), Some(CropId::Grape));
        assert_eq!(CropId::from_str("Videira"), Some(CropId::Grape));
        assert_eq!(CropId::from_str(" café "), Some(CropId::Coffee));
        assert_eq!(CropId::from_str("TOMATE"), Some(CropId::Tomato));
        assert_eq!(CropId::from_str("laranja"), Some(CropId::Citrus));
        assert_eq!(CropId::from_str("wheat"), None);
        assert_eq!(CropId::from_str(""), None);
    }

    #[test]
    fn crop_id_round_trip() {
        for id in CropId::all() {
            assert_eq!(CropId::from_str(id.as_str()), Some(*id));
        }
    }

    #[test]
    fn cultivar_and_stage_lookup_ignores_case() {
        let registry = CropRegistry::builtin().unwrap();
        let cultivar = registry.cultivar(CropId::Grape, "niagara rosada").unwrap();
        assert_eq!(cultivar.crop_coefficient, 0.70);
        let stage = registry.stage(CropId::Grape, "VERAISON").unwrap();
        assert_eq!(stage.name, "Veraison");
    }

    #[test]
    fn unknown_cultivar_is_not_found() {
        let registry = CropRegistry::builtin().unwrap();
        assert!(matches!(
            registry.cultivar(CropId::Coffee, "Merlot"),
            Err(CropOpsError::NotFound(_))
        ));
    }

    #[test]
    fn stage_for_progress_picks_latest_started_stage() {
        let registry = CropRegistry::builtin().unwrap();
        let grape = registry.get(CropId::Grape).unwrap();
        assert_eq!(grape.stage_for_progress(0.0).name, "Budbreak");
        assert_eq!(grape.stage_for_progress(34.9).name, "Flowering");
        assert_eq!(grape.stage_for_progress(70.0).name, "Veraison");
        assert_eq!(grape.stage_for_progress(100.0).name, "Ripening");
    }

    #[test]
    fn crop_without_cultivars_is_rejected() {
        let mut profiles = builtin_profiles();
        profiles[0].cultivars.clear();
        assert!(matches!(
            CropRegistry::from_profiles(profiles),
            Err(CropOpsError::InvalidData(_))
        ));
    }

    #[test]
    fn crop_without_stages_is_rejected() {
        let mut profiles = builtin_profiles();
        profiles[1].stages.clear();
        assert!(CropRegistry::from_profiles(profiles).is_err());
    }

    #[test]
    fn duplicate_crop_is_rejected() {
        let mut profiles = builtin_profiles();
        let first = profiles[0].clone();
        profiles.push(first);
        assert!(CropRegistry::from_profiles(profiles).is_err());
    }

    #[test]
    fn non_positive_coefficient_is_rejected() {
        let mut profiles = builtin_profiles();
        profiles[2].cultivars[0].crop_coefficient = 0.0;
        assert!(CropRegistry::from_profiles(profiles).is_err());
    }
}
