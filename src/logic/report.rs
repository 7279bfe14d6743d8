use super::data_sync::DataSyncService;
use crate::datasources::Mailer;
use crate::error::Result;
use crate::models::AdvisoryReport;
use chrono::{Local, NaiveDate};

/// What a report run produced and which side effects succeeded
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub report: AdvisoryReport,
    pub text: String,
    pub mailed: bool,
    pub logged: bool,
}

/// One-shot report: refresh, mail, append to the run log.
///
/// Only a failure to build the report is an error. Mail and run-log failures
/// are logged and reported through [`ReportOutcome`].
pub struct ReportJob {
    service: DataSyncService,
    mailer: Option<Mailer>,
}

impl ReportJob {
    pub fn new(service: DataSyncService, mailer: Option<Mailer>) -> Self {
        Self { service, mailer }
    }

    pub async fn run(&mut self, note: &str) -> Result<ReportOutcome> {
        self.run_on(Local::now().date_naive(), note).await
    }

    pub async fn run_on(&mut self, today: NaiveDate, note: &str) -> Result<ReportOutcome> {
        let report = self.service.refresh_on(today, note).await?.clone();
        let text = report.to_plain_text();

        let mailed = match self.mailer {
            Some(ref mailer) => match mailer.send(&report.subject(), &text).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Failed to mail report: {}", e);
                    false
                }
            },
            None => {
                tracing::info!("Mail not configured, skipping");
                false
            }
        };

        let logged = match self.service.db().append_run_log(&report.log_entry()) {
            Ok(id) => {
                tracing::debug!(id, "Run log appended");
                true
            }
            Err(e) => {
                tracing::warn!("Failed to append run log: {}", e);
                false
            }
        };

        Ok(ReportOutcome {
            report,
            text,
            mailed,
            logged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::logic::data_sync::fixtures::service;
    use crate::models::RunLogEntry;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn run_logs_flattened_advisory() {
        let db = Database::open_in_memory().unwrap();
        let mut job = ReportJob::new(service(db.clone(), date(2025, 9, 1)), None);

        let outcome = job.run_on(date(2025, 12, 15), "choveu 30 mm").await.unwrap();
        assert!(outcome.logged);
        assert!(!outcome.mailed);
        assert!(outcome.text.contains("CONSULTATION (Offline keyword advisor)"));

        let logs = db.recent_run_logs(5).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].note, "choveu 30 mm");
        assert_eq!(logs[0].temp_c, None);
        assert!(logs[0].advisory.starts_with("Hydric alert"));
        assert!(!logs[0].advisory.contains('\n'));
        assert_eq!(
            logs[0].advisory,
            RunLogEntry::flatten(&outcome.report.consultation.text)
        );
    }

    #[tokio::test]
    async fn failed_report_logs_nothing() {
        let db = Database::open_in_memory().unwrap();
        let mut job = ReportJob::new(service(db.clone(), date(2027, 1, 1)), None);

        assert!(job.run_on(date(2026, 1, 1), "").await.is_err());
        assert!(db.recent_run_logs(5).unwrap().is_empty());
    }
}
