//! The `crawl` command: resolve targets, drive each country, persist the
//! artifact, and map the outcome to an exit code.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;

use refurbscan_core::{builtin_targets, load_countries, AppConfig, StorefrontTarget};
use refurbscan_crawler::engine::chromium::ChromiumEngine;
use refurbscan_crawler::{artifact, run_country, CountryReport, CountryStatus, CrawlOptions};

#[derive(Debug, Args)]
pub struct CrawlArgs {
    /// Comma-separated country codes to crawl; all configured when omitted.
    #[arg(long, value_delimiter = ',')]
    pub countries: Vec<String>,

    /// Override the per-country page cap.
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Override the base inter-page delay in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Override the output artifact path.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print the crawl plan without launching a browser.
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(config: &AppConfig, args: CrawlArgs) -> anyhow::Result<ExitCode> {
    let targets = select_targets(config, &args.countries)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.output_path.clone());
    let options = CrawlOptions {
        max_pages: args.max_pages.unwrap_or(config.max_pages_per_country),
        page_delay_ms: args.delay_ms.unwrap_or(config.page_delay_ms),
        stable_timeout: Duration::from_secs(config.stable_timeout_secs),
        max_nav_retries: config.max_nav_retries,
        backoff_base_secs: config.backoff_base_secs,
    };

    if args.dry_run {
        println!("would crawl {} storefront(s):", targets.len());
        for target in &targets {
            println!(
                "  {} {} {} (up to {} pages)",
                target.country_code, target.currency_code, target.base_url, options.max_pages
            );
        }
        println!("artifact: {}", output.display());
        return Ok(ExitCode::SUCCESS);
    }

    let mut artifact_file = artifact::load_artifact(&output)?;
    let engine = ChromiumEngine::launch(&config.user_agent)
        .await
        .map_err(|e| anyhow::anyhow!("browser launch failed: {e}"))?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("stop requested, finishing the current page");
                stop.store(true, Ordering::Relaxed);
            }
        });
    }

    let mut reports = Vec::with_capacity(targets.len());
    for target in &targets {
        let before_merge = artifact_file.clone();
        let mut report = run_country(&engine, target, &options, &mut artifact_file, &stop).await;

        // Persist after every country so an interrupted run keeps what it
        // has. A failed write fails only this country; its merge is rolled
        // back and the file on disk stays valid.
        if report.status != CountryStatus::Failed {
            if let Err(e) = artifact::write_artifact(&output, &artifact_file) {
                tracing::error!(
                    country = %report.country_code,
                    error = %e,
                    "artifact write failed, rolling back this country's merge"
                );
                artifact_file = before_merge;
                report.status = CountryStatus::Failed;
                report.error = Some(e);
            }
        }
        reports.push(report);
        if stop.load(Ordering::Relaxed) {
            break;
        }
    }

    engine.shutdown().await;

    print_summary(&reports, &output);
    if any_failed(&reports) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

pub fn print_countries(config: &AppConfig) -> anyhow::Result<()> {
    for target in resolve_targets(config)? {
        println!(
            "{} {} {} {}",
            target.country_code, target.locale, target.currency_code, target.base_url
        );
    }
    Ok(())
}

/// The configured registry: the countries file when one is set, the
/// compiled-in targets otherwise.
fn resolve_targets(config: &AppConfig) -> anyhow::Result<Vec<StorefrontTarget>> {
    match &config.countries_path {
        Some(path) => Ok(load_countries(path)?.countries),
        None => Ok(builtin_targets()),
    }
}

fn select_targets(config: &AppConfig, requested: &[String]) -> anyhow::Result<Vec<StorefrontTarget>> {
    let all = resolve_targets(config)?;
    if requested.is_empty() {
        return Ok(all);
    }

    let mut selected = Vec::with_capacity(requested.len());
    for code in requested {
        let upper = code.to_uppercase();
        match all.iter().find(|t| t.country_code == upper) {
            Some(target) => selected.push(target.clone()),
            None => anyhow::bail!("unknown country code: {code}"),
        }
    }
    Ok(selected)
}

fn print_summary(reports: &[CountryReport], output: &std::path::Path) {
    for report in reports {
        let status = match report.status {
            CountryStatus::Done => "done",
            CountryStatus::Partial => "partial",
            CountryStatus::Failed => "failed",
        };
        println!(
            "{:<3} {:<8} pages {}/{} listings {}",
            report.country_code,
            status,
            report.pages_ok,
            report.pages_ok + report.pages_failed,
            report.listings
        );
    }
    println!("artifact: {}", output.display());
}

/// The run exits non-zero only when at least one country failed outright;
/// partial countries still produced a usable artifact.
fn any_failed(reports: &[CountryReport]) -> bool {
    reports.iter().any(|r| r.status == CountryStatus::Failed)
}

#[cfg(test)]
mod tests {
    use refurbscan_crawler::CountryReport;

    use super::*;

    fn report(country: &str, status: CountryStatus) -> CountryReport {
        CountryReport {
            country_code: country.to_string(),
            status,
            pages_ok: 1,
            pages_failed: 0,
            listings: 1,
            error: None,
        }
    }

    #[test]
    fn only_failed_countries_fail_the_run() {
        assert!(!any_failed(&[
            report("US", CountryStatus::Done),
            report("DE", CountryStatus::Partial),
        ]));
        assert!(any_failed(&[
            report("US", CountryStatus::Done),
            report("FR", CountryStatus::Failed),
        ]));
    }

    #[test]
    fn select_targets_filters_and_rejects_unknown_codes() {
        let config = AppConfig {
            log_level: "info".to_string(),
            countries_path: None,
            output_path: PathBuf::from("./out.json"),
            max_pages_per_country: 25,
            page_delay_ms: 0,
            stable_timeout_secs: 30,
            max_nav_retries: 3,
            backoff_base_secs: 5,
            user_agent: "test".to_string(),
        };

        let picked = select_targets(&config, &["us".to_string(), "DE".to_string()]).unwrap();
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].country_code, "US");
        assert_eq!(picked[1].country_code, "DE");

        assert!(select_targets(&config, &["ZZ".to_string()]).is_err());
    }
}
