use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use futures_util::StreamExt;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::config::Config;

/// The sweep only runs once the morning cutoff has passed.
pub fn should_sweep(now: NaiveTime, cutoff: NaiveTime) -> bool {
    now >= cutoff
}

/// Inserts an empty DTR row for every approved, supervised intern with no row
/// on `work_date`. Returns the number of rows created.
pub async fn mark_absent(pool: &MySqlPool, work_date: NaiveDate) -> Result<u64> {
    let mut stream = sqlx::query_as::<_, (u64, Option<u64>)>(
        r#"
        SELECT i.id, i.supervisor_id
        FROM interns i
        LEFT JOIN dtr_entries d ON d.intern_id = i.id AND d.work_date = ?
        WHERE i.status = 'Approved'
          AND i.supervisor_id IS NOT NULL
          AND d.id IS NULL
        "#,
    )
    .bind(work_date)
    .fetch(pool);

    let mut created = 0u64;

    while let Some(row) = stream.next().await {
        let (intern_id, supervisor_id) = row?;

        // IGNORE: a scan may have raced us to the row
        let result = sqlx::query(
            r#"
            INSERT IGNORE INTO dtr_entries (intern_id, supervisor_id, work_date, total_seconds)
            VALUES (?, ?, ?, 0)
            "#,
        )
        .bind(intern_id)
        .bind(supervisor_id)
        .bind(work_date)
        .execute(pool)
        .await?;

        created += result.rows_affected();
    }

    Ok(created)
}

/// Runs the absence sweep on a fixed interval for the life of the server.
pub fn spawn(pool: MySqlPool, config: Config) {
    actix_web::rt::spawn(async move {
        let period = Duration::from_secs(config.absence_sweep_interval_secs.max(1));
        let mut ticker = actix_web::rt::time::interval(period);

        loop {
            ticker.tick().await;

            let now = config.local_now();
            if !should_sweep(now.time(), config.absence_cutoff) {
                continue;
            }

            match mark_absent(&pool, now.date_naive()).await {
                Ok(0) => {}
                Ok(n) => log::info!("Absence sweep created {} empty DTR rows for {}", n, now.date_naive()),
                Err(e) => log::error!("Absence sweep failed: {:?}", e),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn waits_for_the_cutoff() {
        let cutoff = t(8, 0, 0);
        assert!(!should_sweep(t(7, 59, 59), cutoff));
        assert!(should_sweep(t(8, 0, 0), cutoff));
        assert!(should_sweep(t(23, 0, 0), cutoff));
    }
}
