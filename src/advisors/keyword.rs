/// Rain or irrigation reported in the field note, matched anywhere
const HYDRIC_STEMS: &[&str] = &["choveu", "chuva", "irrig"];

/// English rain and watering words, matched as whole words only
const HYDRIC_WORDS: &[&str] = &[
    "rain", "rains", "rained", "raining", "rainfall", "water", "watered", "watering",
];

/// Fertiliser application reported in the field note
const FERTILIZATION_KEYWORDS: &[&str] = &["adub", "fertil", "npk"];

pub const HYDRIC_ALERT: &str = "Hydric alert: the field note reports rain or irrigation. \
     Skip irrigation today, check soil moisture before the next cycle and watch for \
     leaf wetness favouring fungal disease.";

pub const FERTILIZATION_NOTICE: &str = "Fertilisation noted: avoid another application \
     this week, keep the soil moist for uptake and do not combine with foliar sprays \
     until the next check.";

pub const NOMINAL: &str = "Nominal conditions: follow the stage programme and the \
     recommendations above; no field observation changes today's plan.";

/// What the grower's note is about, by keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteTopic {
    Hydric,
    Fertilization,
    Nominal,
}

impl NoteTopic {
    /// Rain keywords win over fertiliser keywords when both appear
    pub fn classify(note: &str) -> Self {
        let note = note.to_lowercase();
        let mut words = note.split(|c: char| !c.is_alphanumeric());
        if HYDRIC_STEMS.iter().any(|k| note.contains(k))
            || words.any(|w| HYDRIC_WORDS.contains(&w))
        {
            NoteTopic::Hydric
        } else if FERTILIZATION_KEYWORDS.iter().any(|k| note.contains(k)) {
            NoteTopic::Fertilization
        } else {
            NoteTopic::Nominal
        }
    }

    pub fn sentence(&self) -> &'static str {
        match self {
            NoteTopic::Hydric => HYDRIC_ALERT,
            NoteTopic::Fertilization => FERTILIZATION_NOTICE,
            NoteTopic::Nominal => NOMINAL,
        }
    }
}

/// Deterministic advisor used when no remote service is configured or reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordAdvisor;

impl KeywordAdvisor {
    pub fn consult(&self, note: &str) -> String {
        NoteTopic::classify(note).sentence().to_string()
    }
}
