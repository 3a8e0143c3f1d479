//! Scheduled Jobs
//!
//! Background maintenance: sweeping expired throttle rows and reporting
//! category count drift. Drift is reported only; repair stays an explicit
//! recalculate call.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::interval;

use crate::aggregate::CategoryCounter;
use crate::throttle::{PgThrottleStore, ThrottleError};

// =========================================================================
// Throttle Sweep Job
// =========================================================================

/// Delete expired view-throttle rows to prevent unbounded growth.
pub async fn cleanup_expired_throttle_entries(pool: &PgPool) -> Result<u64, JobError> {
    let store = PgThrottleStore::new(pool.clone());
    let rows_deleted = store.cleanup_expired().await?;

    if rows_deleted > 0 {
        tracing::info!(
            rows_deleted = rows_deleted,
            "Cleaned up expired throttle entries"
        );
    }

    Ok(rows_deleted)
}

// =========================================================================
// Category Drift Audit Job
// =========================================================================

/// Compare stored category counts to true counts and log any divergence.
pub async fn audit_category_counts(pool: &PgPool) -> Result<u64, JobError> {
    let counter = CategoryCounter::new(pool.clone());
    let drift = counter
        .audit_counts()
        .await
        .map_err(|e| JobError::Audit(e.to_string()))?;

    for entry in &drift {
        tracing::warn!(
            category_id = %entry.category_id,
            stored_count = entry.stored_count,
            actual_count = entry.actual_count,
            "Category count drift; run recalculate to repair"
        );
    }

    Ok(drift.len() as u64)
}

// =========================================================================
// Job Scheduler
// =========================================================================

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval for throttle sweep (default: 10 minutes)
    pub throttle_sweep_interval: Duration,
    /// Interval for drift audit (default: 1 hour)
    pub drift_audit_interval: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            throttle_sweep_interval: Duration::from_secs(600),
            drift_audit_interval: Duration::from_secs(3600),
        }
    }
}

/// Job Scheduler - runs periodic maintenance tasks
pub struct JobScheduler {
    pool: PgPool,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    /// Create a new job scheduler
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            config: JobSchedulerConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(pool: PgPool, config: JobSchedulerConfig) -> Self {
        Self { pool, config }
    }

    /// Start the job scheduler in the background
    /// Returns a handle that can be used to abort the scheduler
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the scheduler loop
    async fn run(&self) {
        tracing::info!("Job scheduler started");

        let mut sweep_interval = interval(self.config.throttle_sweep_interval);
        let mut audit_interval = interval(self.config.drift_audit_interval);

        loop {
            tokio::select! {
                _ = sweep_interval.tick() => {
                    if let Err(e) = cleanup_expired_throttle_entries(&self.pool).await {
                        tracing::error!(error = %e, "Throttle sweep failed");
                    }
                }
                _ = audit_interval.tick() => {
                    if let Err(e) = audit_category_counts(&self.pool).await {
                        tracing::error!(error = %e, "Category drift audit failed");
                    }
                }
            }
        }
    }

    /// Run all maintenance jobs once (for manual trigger or testing)
    pub async fn run_all_once(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match cleanup_expired_throttle_entries(&self.pool).await {
            Ok(count) => report.throttle_entries_swept = count,
            Err(e) => report.errors.push(format!("Throttle sweep: {}", e)),
        }

        match audit_category_counts(&self.pool).await {
            Ok(count) => report.categories_with_drift = count,
            Err(e) => report.errors.push(format!("Drift audit: {}", e)),
        }

        report.completed_at = Utc::now();
        report
    }
}

/// Report from running maintenance jobs
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    pub throttle_entries_swept: u64,
    pub categories_with_drift: u64,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Throttle store error: {0}")]
    Throttle(#[from] ThrottleError),

    #[error("Drift audit error: {0}")]
    Audit(String),
}

// =========================================================================
// Tests
// =========================================================================
