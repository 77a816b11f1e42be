pub mod absence_sweep;
pub mod db_utils;
pub mod dtr_store;
pub mod mailer;
pub mod notify;
pub mod reset_codes;
