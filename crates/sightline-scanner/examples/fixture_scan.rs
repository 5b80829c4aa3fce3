//! Offline demo: scan the bundled sample fixture and print where the
//! report landed.
//!
//! Runs without network access, a browser, or an existing database.
//!
//! ```sh
//! cargo run -p sightline-scanner --example fixture_scan
//! ```

use sightline_core::{ReportConfig, ScanningConfig};
use sightline_db::scans::{self, ScanStatus};
use sightline_db::Database;
use sightline_report::HtmlReportRenderer;
use sightline_scanner::{BuiltinRules, DefaultPageSource, ReportMode, ScanOrchestrator};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sightline_scanner=debug".into()),
        )
        .init();

    let db = Arc::new(Database::new(":memory:").await?);
    db.run_migrations().await?;

    let scanning = ScanningConfig::default();
    let report = ReportConfig::default();

    let orchestrator = ScanOrchestrator::new(
        db.clone(),
        Arc::new(DefaultPageSource::new(&scanning)?),
        Arc::new(BuiltinRules::new()),
        Arc::new(HtmlReportRenderer::new(&report)),
        scanning,
        report.reports_dir.clone(),
    );

    let scan = orchestrator
        .start_scan("demo-user", "test-sample", ReportMode::Full)
        .await?;
    println!("Scan {} accepted, waiting for the pipeline...", scan.id);

    loop {
        let current = scans::get_scan(db.pool(), &scan.id).await?;
        match current.status {
            ScanStatus::Pending => tokio::time::sleep(Duration::from_millis(50)).await,
            ScanStatus::Completed => {
                println!(
                    "Scan completed, report at {}/{}",
                    report.reports_dir.display(),
                    current.report_url.unwrap_or_default()
                );
                break;
            }
            ScanStatus::Failed => {
                println!("Scan failed without a report artifact");
                break;
            }
        }
    }

    Ok(())
}
