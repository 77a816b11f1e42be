use std::env;
use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use dotenvy::dotenv;

use crate::dtr::classify::LateWindow;
use crate::dtr::hms::Hms;
use crate::dtr::scan::ScanRules;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,
    pub run_migrations: bool,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Attendance rules, all in local time
    pub timezone: Tz,
    pub am_pm_split: NaiveTime,
    pub late_after: NaiveTime,
    pub late_before: NaiveTime,
    pub absence_cutoff: NaiveTime,
    pub absence_sweep_interval_secs: u64,
    pub default_time_in: NaiveTime,
    pub full_day_leave: Hms,

    // Password reset
    pub reset_code_ttl_secs: u64,
    pub reset_verified_ttl_secs: u64,

    // Outbound delivery
    pub fcm_endpoint: String,
    pub fcm_server_key: Option<String>,
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_from: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: parse_or("ACCESS_TOKEN_TTL", "900"), // default 15 min
            refresh_token_ttl: parse_or("REFRESH_TOKEN_TTL", "604800"), // default 7 days
            run_migrations: parse_or("RUN_MIGRATIONS", "true"),

            rate_login_per_min: parse_or("RATE_LOGIN_PER_MIN", "60"),
            rate_register_per_min: parse_or("RATE_REGISTER_PER_MIN", "30"),
            rate_refresh_per_min: parse_or("RATE_REFRESH_PER_MIN", "30"),
            rate_protected_per_min: parse_or("RATE_PROTECTED_PER_MIN", "1000"),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            timezone: parse_or("TIMEZONE", "Asia/Manila"),
            am_pm_split: time_or("AM_PM_SPLIT", "12:00:00"),
            late_after: time_or("LATE_AFTER", "08:01:00"),
            late_before: time_or("LATE_BEFORE", "12:00:00"),
            absence_cutoff: time_or("ABSENCE_CUTOFF", "08:00:00"),
            absence_sweep_interval_secs: parse_or("ABSENCE_SWEEP_INTERVAL_SECS", "900"),
            default_time_in: time_or("DEFAULT_TIME_IN", "08:00:00"),
            full_day_leave: parse_or("FULL_DAY_LEAVE", "08:00:00"),

            reset_code_ttl_secs: parse_or("RESET_CODE_TTL_SECS", "300"), // 5 min
            reset_verified_ttl_secs: parse_or("RESET_VERIFIED_TTL_SECS", "900"), // 15 min

            fcm_endpoint: env::var("FCM_ENDPOINT")
                .unwrap_or_else(|_| "https://fcm.googleapis.com/fcm/send".to_string()),
            fcm_server_key: env::var("FCM_SERVER_KEY").ok().filter(|k| !k.is_empty()),
            mail_api_url: env::var("MAIL_API_URL").ok().filter(|u| !u.is_empty()),
            mail_api_key: env::var("MAIL_API_KEY").ok(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@interntrack.local".to_string()),
        }
    }

    pub fn scan_rules(&self) -> ScanRules {
        ScanRules {
            am_pm_split: self.am_pm_split,
        }
    }

    pub fn late_window(&self) -> LateWindow {
        LateWindow {
            after: self.late_after,
            before: self.late_before,
        }
    }

    /// Current wall-clock time in the configured zone.
    pub fn local_now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }
}

fn parse_or<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}"))
}

fn time_or(key: &str, default: &str) -> NaiveTime {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M:%S")
        .unwrap_or_else(|e| panic!("{key} must be HH:MM:SS, got '{raw}': {e}"))
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://localhost/interntrack_test".to_string(),
            jwt_secret: "test-secret".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            access_token_ttl: 900,
            refresh_token_ttl: 3600,
            run_migrations: false,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            timezone: chrono_tz::Asia::Manila,
            am_pm_split: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            late_after: NaiveTime::from_hms_opt(8, 1, 0).unwrap(),
            late_before: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            absence_cutoff: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            absence_sweep_interval_secs: 900,
            default_time_in: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            full_day_leave: Hms::from_hours(8),
            reset_code_ttl_secs: 300,
            reset_verified_ttl_secs: 900,
            fcm_endpoint: "http://127.0.0.1:9/fcm".to_string(),
            fcm_server_key: None,
            mail_api_url: None,
            mail_api_key: None,
            mail_from: "test@interntrack.local".to_string(),
        }
    }
}
