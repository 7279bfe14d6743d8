use crate::db::Database;
use crate::error::Result;
use crate::logic::DataSyncService;
use crate::models::{AdvisoryReport, CropProfile, Recommendation, RunLogEntry};

const NOTE_SETTING: &str = "note";
const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Forecast,
    Advisory,
    Crop,
    History,
}

impl Screen {
    pub fn from_key(c: char) -> Option<Self> {
        match c {
            '1' => Some(Screen::Dashboard),
            '2' => Some(Screen::Forecast),
            '3' => Some(Screen::Advisory),
            '4' => Some(Screen::Crop),
            '5' => Some(Screen::History),
            _ => None,
        }
    }
}

pub struct ForecastState {
    pub selected_index: usize,
}

impl ForecastState {
    pub fn new() -> Self {
        Self { selected_index: 0 }
    }

    pub fn next(&mut self, max: usize) {
        if max > 0 && self.selected_index < max - 1 {
            self.selected_index += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }
}

pub struct AdvisoryState {
    pub selected_index: usize,
    pub editing: bool,
    pub edit_buffer: String,
}

impl AdvisoryState {
    pub fn new() -> Self {
        Self {
            selected_index: 0,
            editing: false,
            edit_buffer: String::new(),
        }
    }

    pub fn next(&mut self, max: usize) {
        if max > 0 && self.selected_index < max - 1 {
            self.selected_index += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn start_editing(&mut self, current_note: &str) {
        self.editing = true;
        self.edit_buffer = current_note.to_string();
    }

    pub fn cancel_editing(&mut self) {
        self.editing = false;
        self.edit_buffer.clear();
    }

    pub fn finish_editing(&mut self) -> String {
        self.editing = false;
        std::mem::take(&mut self.edit_buffer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropPane {
    Stages,
    Cultivars,
}

pub struct CropState {
    pub pane: CropPane,
    pub stage_index: usize,
    pub cultivar_index: usize,
}

impl CropState {
    pub fn new() -> Self {
        Self {
            pane: CropPane::Stages,
            stage_index: 0,
            cultivar_index: 0,
        }
    }

    pub fn toggle_pane(&mut self) {
        self.pane = match self.pane {
            CropPane::Stages => CropPane::Cultivars,
            CropPane::Cultivars => CropPane::Stages,
        };
    }

    pub fn next(&mut self, crop: &CropProfile) {
        let (index, max) = match self.pane {
            CropPane::Stages => (&mut self.stage_index, crop.stages.len()),
            CropPane::Cultivars => (&mut self.cultivar_index, crop.cultivars.len()),
        };
        if max > 0 && *index < max - 1 {
            *index += 1;
        }
    }

    pub fn prev(&mut self) {
        let index = match self.pane {
            CropPane::Stages => &mut self.stage_index,
            CropPane::Cultivars => &mut self.cultivar_index,
        };
        if *index > 0 {
            *index -= 1;
        }
    }
}

pub struct HistoryState {
    pub selected_index: usize,
}

impl HistoryState {
    pub fn new() -> Self {
        Self { selected_index: 0 }
    }

    pub fn next(&mut self, max: usize) {
        if max > 0 && self.selected_index < max - 1 {
            self.selected_index += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }
}

/// A crop browser choice waiting to be applied by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropSelection {
    Cultivar(String),
    /// `None` returns to the thermal estimate
    Stage(Option<String>),
}

pub struct App {
    pub screen: Screen,
    pub should_quit: bool,
    pub db: Database,

    // Data
    pub farm_name: String,
    pub crop: CropProfile,
    pub cultivar: String,
    pub reported_stage: Option<String>,
    pub report: Option<AdvisoryReport>,
    pub run_logs: Vec<RunLogEntry>,
    pub note: String,

    // Screen states
    pub forecast_state: ForecastState,
    pub advisory_state: AdvisoryState,
    pub crop_state: CropState,
    pub history_state: HistoryState,

    // UI state
    pub status_message: Option<String>,
    pub refreshing: bool,
    pub needs_refresh: bool,
    pub needs_reconsult: bool,
    pub pending_selection: Option<CropSelection>,
}

impl App {
    pub fn new(db: Database, service: &DataSyncService) -> Result<Self> {
        let run_logs = db.recent_run_logs(HISTORY_LIMIT)?;
        let note = db.get_setting(NOTE_SETTING)?.unwrap_or_default();

        let mut app = Self {
            screen: Screen::Dashboard,
            should_quit: false,
            db,
            farm_name: service.farm().name.clone(),
            crop: service.crop().clone(),
            cultivar: String::new(),
            reported_stage: None,
            report: None,
            run_logs,
            note,
            forecast_state: ForecastState::new(),
            advisory_state: AdvisoryState::new(),
            crop_state: CropState::new(),
            history_state: HistoryState::new(),
            status_message: None,
            refreshing: false,
            needs_refresh: false,
            needs_reconsult: false,
            pending_selection: None,
        };
        app.sync_selection(service);
        Ok(app)
    }

    pub fn switch_screen(&mut self, screen: Screen) {
        self.screen = screen;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn set_status(&mut self, message: &str) {
        self.status_message = Some(message.to_string());
    }

    pub fn request_refresh(&mut self) {
        self.needs_refresh = true;
        self.set_status("Refreshing forecast...");
    }

    pub fn request_reconsult(&mut self) {
        self.needs_reconsult = true;
        self.set_status("Consulting advisor...");
    }

    /// Mirror the service's current cultivar and stage
    pub fn sync_selection(&mut self, service: &DataSyncService) {
        self.cultivar = service.cultivar().name.clone();
        self.reported_stage = service.stage().map(|s| s.name.clone());

        if let Some(i) = self.crop.cultivars.iter().position(|c| c.name == self.cultivar) {
            self.crop_state.cultivar_index = i;
        }
        if let Some(i) = self
            .reported_stage
            .as_ref()
            .and_then(|name| self.crop.stages.iter().position(|s| &s.name == name))
        {
            self.crop_state.stage_index = i;
        }
    }

    pub fn update_report(&mut self, report: AdvisoryReport) {
        let count = report.active_recommendations().count();
        if self.advisory_state.selected_index >= count {
            self.advisory_state.selected_index = count.saturating_sub(1);
        }
        self.report = Some(report);
    }

    pub fn reload_history(&mut self) -> Result<()> {
        self.run_logs = self.db.recent_run_logs(HISTORY_LIMIT)?;
        Ok(())
    }

    /// Store the edited note and ask for a fresh consultation
    pub fn save_note(&mut self, note: String) -> Result<()> {
        let note = note.trim().to_string();
        if note.is_empty() {
            self.db.delete_setting(NOTE_SETTING)?;
        } else {
            self.db.set_setting(NOTE_SETTING, &note)?;
        }
        self.note = note;
        self.request_reconsult();
        Ok(())
    }

    pub fn active_recommendations(&self) -> Vec<&Recommendation> {
        match self.report {
            Some(ref r) => r.active_recommendations().collect(),
            None => Vec::new(),
        }
    }

    /// Hide the selected recommendation until the next refresh
    pub fn acknowledge_selected(&mut self) {
        let index = self.advisory_state.selected_index;
        let Some(ref mut report) = self.report else {
            return;
        };
        if let Some(rec) = report
            .recommendations
            .iter_mut()
            .filter(|r| !r.acknowledged)
            .nth(index)
        {
            rec.acknowledged = true;
        }
        let remaining = report.active_recommendations().count();
        if self.advisory_state.selected_index >= remaining {
            self.advisory_state.selected_index = remaining.saturating_sub(1);
        }
    }

    /// Queue the highlighted stage or cultivar as the active one
    pub fn select_highlighted(&mut self) {
        self.pending_selection = match self.crop_state.pane {
            CropPane::Stages => self
                .crop
                .stages
                .get(self.crop_state.stage_index)
                .map(|s| CropSelection::Stage(Some(s.name.clone()))),
            CropPane::Cultivars => self
                .crop
                .cultivars
                .get(self.crop_state.cultivar_index)
                .map(|c| CropSelection::Cultivar(c.name.clone())),
        };
    }

    pub fn clear_reported_stage(&mut self) {
        self.pending_selection = Some(CropSelection::Stage(None));
    }

    pub fn forecast_days(&self) -> usize {
        self.report
            .as_ref()
            .and_then(|r| r.weather.as_ref())
            .map(|w| w.outlook.len())
            .unwrap_or(0)
    }
}
