pub mod dtr_entry;
pub mod intern;
pub mod leave_request;
pub mod role;
pub mod supervisor;
pub mod user;
