use crate::error::{AppError, AppResult};
use moka::Expiry;
use moka::future::Cache;
use moka::ops::compute::Op;
use rand::Rng;
use std::future::ready;
use std::time::{Duration, Instant};

/// Wrong guesses allowed before a code is thrown away.
const MAX_ATTEMPTS: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ResetState {
    /// A code was mailed and not yet confirmed
    Sent { code: String, attempts: u8 },
    /// The code was confirmed; the password may now be reset
    Verified,
}

/// A fresh code lives `code_ttl`, a confirmed one `verified_ttl`. Counting a
/// wrong guess keeps the deadline the code already had.
struct ResetExpiry {
    code_ttl: Duration,
    verified_ttl: Duration,
}

impl ResetExpiry {
    fn ttl_of(&self, state: &ResetState) -> Duration {
        match state {
            ResetState::Sent { .. } => self.code_ttl,
            ResetState::Verified => self.verified_ttl,
        }
    }
}

impl Expiry<String, ResetState> for ResetExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &ResetState,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(self.ttl_of(value))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &ResetState,
        _updated_at: Instant,
        duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        match value {
            ResetState::Sent { attempts, .. } if *attempts > 0 => duration_until_expiry,
            _ => Some(self.ttl_of(value)),
        }
    }
}

/// Password-reset codes keyed by lowercase email.
#[derive(Clone)]
pub struct ResetCodeStore {
    cache: Cache<String, ResetState>,
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

impl ResetCodeStore {
    pub fn new(code_ttl: Duration, verified_ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(10_000)
                .expire_after(ResetExpiry {
                    code_ttl,
                    verified_ttl,
                })
                .build(),
        }
    }

    /// Issues a fresh code for `email`, replacing any earlier one.
    pub async fn issue(&self, email: &str) -> String {
        let code = generate_code();
        self.cache
            .insert(
                normalize(email),
                ResetState::Sent {
                    code: code.clone(),
                    attempts: 0,
                },
            )
            .await;
        code
    }

    /// Checks `code` and counts a wrong guess in one atomic step per email.
    pub async fn verify(&self, email: &str, code: &str) -> AppResult<()> {
        let code = code.trim();
        let mut verdict: AppResult<()> =
            Err(AppError::validation("Code expired or was never requested"));

        self.cache
            .entry(normalize(email))
            .and_compute_with(|current| {
                let op = match current.map(|entry| entry.into_value()) {
                    None => Op::Nop,
                    Some(ResetState::Verified) => {
                        verdict = Ok(());
                        Op::Nop
                    }
                    Some(ResetState::Sent { code: expected, .. }) if expected == code => {
                        verdict = Ok(());
                        Op::Put(ResetState::Verified)
                    }
                    Some(ResetState::Sent { code: expected, attempts }) => {
                        verdict = Err(AppError::validation("Invalid code"));
                        if attempts + 1 >= MAX_ATTEMPTS {
                            Op::Remove
                        } else {
                            Op::Put(ResetState::Sent {
                                code: expected,
                                attempts: attempts + 1,
                            })
                        }
                    }
                };
                ready(op)
            })
            .await;

        verdict
    }

    pub async fn check_verified(&self, email: &str) -> bool {
        matches!(
            self.cache.get(&normalize(email)).await,
            Some(ResetState::Verified)
        )
    }

    pub async fn clear(&self, email: &str) {
        self.cache.invalidate(&normalize(email)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ResetCodeStore {
        ResetCodeStore::new(Duration::from_secs(300), Duration::from_secs(900))
    }

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[actix_web::test]
    async fn issue_verify_reset_flow() {
        let store = store();
        let code = store.issue("Juan@School.edu.ph").await;

        assert!(!store.check_verified("juan@school.edu.ph").await);
        store.verify("juan@school.edu.ph", &code).await.unwrap();
        assert!(store.check_verified("JUAN@school.edu.ph").await);

        store.clear("juan@school.edu.ph").await;
        assert!(!store.check_verified("juan@school.edu.ph").await);
    }

    #[actix_web::test]
    async fn wrong_codes_burn_the_entry() {
        let store = store();
        let code = store.issue("ana@school.edu.ph").await;
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for _ in 0..MAX_ATTEMPTS {
            assert!(store.verify("ana@school.edu.ph", wrong).await.is_err());
        }
        // even the right code no longer works
        assert!(store.verify("ana@school.edu.ph", &code).await.is_err());
    }

    #[actix_web::test]
    async fn expired_codes_are_rejected() {
        let store = ResetCodeStore::new(Duration::ZERO, Duration::from_secs(900));
        let code = store.issue("late@school.edu.ph").await;
        assert!(store.verify("late@school.edu.ph", &code).await.is_err());
    }

    #[actix_web::test]
    async fn concurrent_wrong_guesses_are_all_counted() {
        let store = store();
        let code = store.issue("rush@school.edu.ph").await;
        let wrong = if code == "000000" { "111111" } else { "000000" };

        let guesses = (0..MAX_ATTEMPTS * 2).map(|_| store.verify("rush@school.edu.ph", wrong));
        let results = futures::future::join_all(guesses).await;
        assert!(results.iter().all(|r| r.is_err()));

        assert!(store.verify("rush@school.edu.ph", &code).await.is_err());
    }

    #[actix_web::test]
    async fn wrong_guess_keeps_the_code_usable() {
        let store = store();
        let code = store.issue("slip@school.edu.ph").await;
        let wrong = if code == "000000" { "111111" } else { "000000" };

        assert!(store.verify("slip@school.edu.ph", wrong).await.is_err());
        store.verify("slip@school.edu.ph", &code).await.unwrap();
        assert!(store.check_verified("slip@school.edu.ph").await);
    }

    #[test]
    fn guesses_keep_the_original_deadline() {
        let expiry = ResetExpiry {
            code_ttl: Duration::from_secs(300),
            verified_ttl: Duration::from_secs(900),
        };
        let key = "a@b.c".to_string();
        let now = Instant::now();
        let left = Some(Duration::from_secs(42));

        let fresh = ResetState::Sent { code: "123456".into(), attempts: 0 };
        let guessed = ResetState::Sent { code: "123456".into(), attempts: 2 };

        assert_eq!(expiry.expire_after_create(&key, &fresh, now), Some(Duration::from_secs(300)));
        assert_eq!(expiry.expire_after_update(&key, &fresh, now, left), Some(Duration::from_secs(300)));
        assert_eq!(expiry.expire_after_update(&key, &guessed, now, left), left);
        assert_eq!(
            expiry.expire_after_update(&key, &ResetState::Verified, now, left),
            Some(Duration::from_secs(900))
        );
    }

    #[actix_web::test]
    async fn unknown_email_is_rejected() {
        assert!(store().verify("nobody@school.edu.ph", "123456").await.is_err());
    }
}
