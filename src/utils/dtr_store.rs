use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use sqlx::{MySql, MySqlPool, Transaction};
use utoipa::ToSchema;

use crate::dtr::accumulate::RenderedHours;
use crate::dtr::hms::Hms;
use crate::dtr::leave::deduct_leave;
use crate::dtr::scan::{DtrDay, ScanKind, ScanRules, Slot, record_scan};
use crate::error::{AppError, AppResult};
use crate::model::dtr_entry::{DTR_SELECT, DtrEntry};
use crate::model::intern::InternStatus;

/// The intern row, held under `FOR UPDATE` for the rest of the transaction.
#[derive(Debug, sqlx::FromRow)]
pub struct LockedIntern {
    pub id: u64,
    pub supervisor_id: Option<u64>,
    pub ojt_hours_required: i32,
    pub status: String,
}

/// Which slot a scan writes.
#[derive(Debug, Clone, Copy)]
pub enum SlotChoice {
    /// Pick the slot from the time of day and the open session
    Auto(ScanKind),
    Fixed(Slot),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScanOutcome {
    #[schema(example = 7)]
    pub intern_id: u64,
    #[schema(value_type = String, format = "date", example = "2025-04-07")]
    pub work_date: NaiveDate,
    pub slot: Slot,
    #[schema(value_type = String, example = "08:00:00")]
    pub time: NaiveTime,
    #[schema(value_type = String, example = "04:00:00")]
    pub total_hours: Hms,
    /// Set when the scan closed a session and the intern's hours were recomputed
    pub rendered: Option<RenderedHours>,
}

pub async fn lock_intern(
    tx: &mut Transaction<'_, MySql>,
    intern_id: u64,
) -> AppResult<LockedIntern> {
    sqlx::query_as::<_, LockedIntern>(
        r#"
        SELECT id, supervisor_id, ojt_hours_required, status
        FROM interns
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(intern_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::not_found(format!("Intern {intern_id} not found")))
}

pub async fn fetch_day(
    tx: &mut Transaction<'_, MySql>,
    intern_id: u64,
    work_date: NaiveDate,
) -> AppResult<Option<DtrEntry>> {
    let sql = format!("{DTR_SELECT} WHERE intern_id = ? AND work_date = ? FOR UPDATE");
    let entry = sqlx::query_as::<_, DtrEntry>(&sql)
        .bind(intern_id)
        .bind(work_date)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(entry)
}

/// Approved leave already taken out of this day.
async fn approved_leave(
    tx: &mut Transaction<'_, MySql>,
    intern_id: u64,
    work_date: NaiveDate,
) -> AppResult<Hms> {
    let rows = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT leave_seconds
        FROM leave_requests
        WHERE intern_id = ? AND leave_date = ? AND status = 'Approved'
        "#,
    )
    .bind(intern_id)
    .bind(work_date)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(Hms::from_secs).sum())
}

/// Sums every DTR total of the intern and stores the result on the intern row.
pub async fn recompute_rendered(
    tx: &mut Transaction<'_, MySql>,
    intern: &LockedIntern,
) -> AppResult<RenderedHours> {
    let totals = sqlx::query_scalar::<_, i64>(
        "SELECT total_seconds FROM dtr_entries WHERE intern_id = ?",
    )
    .bind(intern.id)
    .fetch_all(&mut **tx)
    .await?;

    let hours = RenderedHours::recompute(
        i64::from(intern.ojt_hours_required),
        totals.into_iter().map(Hms::from_secs),
    );

    sqlx::query("UPDATE interns SET ojt_seconds_rendered = ? WHERE id = ?")
        .bind(hours.rendered.as_secs())
        .bind(intern.id)
        .execute(&mut **tx)
        .await?;

    Ok(hours)
}

/// Writes one scan for `intern_id` on `work_date` at `at`.
///
/// The whole read-modify-write runs in one transaction under the intern row
/// lock, so two scans for the same intern never interleave.
#[tracing::instrument(name = "record_scan", skip(pool, rules))]
pub async fn record(
    pool: &MySqlPool,
    rules: &ScanRules,
    intern_id: u64,
    work_date: NaiveDate,
    choice: SlotChoice,
    at: NaiveTime,
) -> AppResult<ScanOutcome> {
    let mut tx = pool.begin().await?;

    let intern = lock_intern(&mut tx, intern_id).await?;
    if intern.status.parse::<InternStatus>().ok() != Some(InternStatus::Approved) {
        return Err(AppError::validation(format!(
            "Intern {intern_id} is not approved"
        )));
    }

    let existing = fetch_day(&mut tx, intern_id, work_date).await?;
    let mut day = existing.as_ref().map(DtrEntry::day).unwrap_or_default();

    let slot = match choice {
        SlotChoice::Auto(kind) => rules.resolve(&day, kind, at)?,
        SlotChoice::Fixed(slot) => slot,
    };
    record_scan(&mut day, slot, at)?;

    let leave = approved_leave(&mut tx, intern_id, work_date).await?;
    let total = day_total(&day, leave);

    match &existing {
        Some(entry) => {
            // column name comes from a fixed enum, never from input
            let sql = format!(
                "UPDATE dtr_entries SET {} = ?, total_seconds = ? WHERE id = ?",
                slot.column()
            );
            sqlx::query(&sql)
                .bind(at)
                .bind(total.as_secs())
                .bind(entry.id)
                .execute(&mut *tx)
                .await?;
        }
        None => {
            let sql = format!(
                r#"
                INSERT INTO dtr_entries (intern_id, supervisor_id, work_date, {}, total_seconds)
                VALUES (?, ?, ?, ?, ?)
                "#,
                slot.column()
            );
            sqlx::query(&sql)
                .bind(intern_id)
                .bind(intern.supervisor_id)
                .bind(work_date)
                .bind(at)
                .bind(total.as_secs())
                .execute(&mut *tx)
                .await?;
        }
    }

    let rendered = if slot.is_time_out() {
        Some(recompute_rendered(&mut tx, &intern).await?)
    } else {
        None
    };

    tx.commit().await?;

    tracing::info!(intern_id, %work_date, %slot, time = %at, total = %total, "Scan recorded");

    Ok(ScanOutcome {
        intern_id,
        work_date,
        slot,
        time: at,
        total_hours: total,
        rendered,
    })
}

/// Manual recalculation of an intern's rendered hours.
pub async fn recalculate(pool: &MySqlPool, intern_id: u64) -> AppResult<RenderedHours> {
    let mut tx = pool.begin().await?;
    let intern = lock_intern(&mut tx, intern_id).await?;
    let hours = recompute_rendered(&mut tx, &intern).await?;
    tx.commit().await?;
    Ok(hours)
}

/// A day's stored total: its closed pairs minus approved leave.
pub fn day_total(day: &DtrDay, approved_leave: Hms) -> Hms {
    deduct_leave(day.worked(), approved_leave)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn day_total_subtracts_approved_leave() {
        let day = DtrDay {
            time_in_am: Some(t(8, 0)),
            time_out_am: Some(t(12, 0)),
            time_in_pm: Some(t(13, 0)),
            time_out_pm: Some(t(17, 0)),
        };
        assert_eq!(day_total(&day, Hms::from_hours(2)).to_string(), "06:00:00");
        assert_eq!(day_total(&day, Hms::from_hours(10)), Hms::ZERO);
    }

    #[test]
    fn half_open_day_counts_only_closed_pairs() {
        let day = DtrDay {
            time_in_am: Some(t(8, 0)),
            time_out_am: Some(t(12, 0)),
            time_in_pm: Some(t(13, 0)),
            time_out_pm: None,
        };
        assert_eq!(day_total(&day, Hms::ZERO).to_string(), "04:00:00");
    }
}
