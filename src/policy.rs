use crate::error::OutcomeError;
use std::sync::atomic::{AtomicBool, Ordering};
use toml_edit::{DocumentMut, Item};

/// Process-wide behavior switches.
///
/// Switches are atomics so they can be flipped through a shared
/// [`Context`](crate::Context); they are still meant to be set once at
/// startup.
#[derive(Debug)]
pub struct Policy {
    default_as_null: AtomicBool,
    containers_not_empty_if_issues: AtomicBool,
    treat_exceptions_as_errors: AtomicBool,
    throw_exceptions_from_user_handling_code: AtomicBool,
}

/// A plain copy of the switches, for building and comparing policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicySnapshot {
    pub default_as_null: bool,
    pub containers_not_empty_if_issues: bool,
    pub treat_exceptions_as_errors: bool,
    pub throw_exceptions_from_user_handling_code: bool,
}

impl Default for PolicySnapshot {
    fn default() -> Self {
        Self {
            default_as_null: false,
            containers_not_empty_if_issues: true,
            treat_exceptions_as_errors: false,
            throw_exceptions_from_user_handling_code: false,
        }
    }
}

impl Policy {
    /// Live switches starting from `snapshot`
    pub fn new(snapshot: PolicySnapshot) -> Self {
        Self {
            default_as_null: AtomicBool::new(snapshot.default_as_null),
            containers_not_empty_if_issues: AtomicBool::new(
                snapshot.containers_not_empty_if_issues,
            ),
            treat_exceptions_as_errors: AtomicBool::new(snapshot.treat_exceptions_as_errors),
            throw_exceptions_from_user_handling_code: AtomicBool::new(
                snapshot.throw_exceptions_from_user_handling_code,
            ),
        }
    }

    /// Reads switches from TOML.
    ///
    /// Keys are looked up in an `[outcome]` table when present, otherwise
    /// at the document root. Missing keys keep their defaults.
    ///
    /// ```
    /// use sovran_outcome::Policy;
    ///
    /// let policy = Policy::from_toml_str(
    ///     r#"
    ///     [outcome]
    ///     default_as_null = true
    ///     treat_exceptions_as_errors = true
    ///     "#,
    /// )?;
    ///
    /// assert!(policy.default_as_null());
    /// assert!(policy.containers_not_empty_if_issues());
    /// # Ok::<(), sovran_outcome::OutcomeError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `OutcomeError::Config` if the input is not valid TOML or a
    /// known key is not a boolean.
    pub fn from_toml_str(input: &str) -> Result<Self, OutcomeError> {
        let doc = input
            .parse::<DocumentMut>()
            .map_err(|e| OutcomeError::Config(e.to_string()))?;

        let table = match doc.get("outcome") {
            Some(Item::Table(table)) => table,
            Some(_) => return Err(OutcomeError::Config("`outcome` must be a table".into())),
            None => doc.as_table(),
        };

        let read = |key: &str, default: bool| -> Result<bool, OutcomeError> {
            match table.get(key) {
                None => Ok(default),
                Some(item) => item
                    .as_bool()
                    .ok_or_else(|| OutcomeError::Config(format!("`{key}` must be a boolean"))),
            }
        };

        let defaults = PolicySnapshot::default();
        Ok(Self::new(PolicySnapshot {
            default_as_null: read("default_as_null", defaults.default_as_null)?,
            containers_not_empty_if_issues: read(
                "containers_not_empty_if_issues",
                defaults.containers_not_empty_if_issues,
            )?,
            treat_exceptions_as_errors: read(
                "treat_exceptions_as_errors",
                defaults.treat_exceptions_as_errors,
            )?,
            throw_exceptions_from_user_handling_code: read(
                "throw_exceptions_from_user_handling_code",
                defaults.throw_exceptions_from_user_handling_code,
            )?,
        }))
    }

    /// Reads all four switches
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_outcome::Policy;
    ///
    /// let policy = Policy::default();
    /// policy.set_default_as_null(true);
    /// assert!(policy.snapshot().default_as_null);
    /// assert_eq!(Policy::new(policy.snapshot()).snapshot(), policy.snapshot());
    /// ```
    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            default_as_null: self.default_as_null(),
            containers_not_empty_if_issues: self.containers_not_empty_if_issues(),
            treat_exceptions_as_errors: self.treat_exceptions_as_errors(),
            throw_exceptions_from_user_handling_code: self
                .throw_exceptions_from_user_handling_code(),
        }
    }

    /// Zero values count as "no value"
    pub fn default_as_null(&self) -> bool {
        self.default_as_null.load(Ordering::Relaxed)
    }

    /// Containers holding errors are not reported as empty
    pub fn containers_not_empty_if_issues(&self) -> bool {
        self.containers_not_empty_if_issues.load(Ordering::Relaxed)
    }

    /// Failures inside handling code are recorded as errors on the container
    pub fn treat_exceptions_as_errors(&self) -> bool {
        self.treat_exceptions_as_errors.load(Ordering::Relaxed)
    }

    /// Failures inside handling code are re-raised after being recorded
    pub fn throw_exceptions_from_user_handling_code(&self) -> bool {
        self.throw_exceptions_from_user_handling_code
            .load(Ordering::Relaxed)
    }

    /// Flips [`default_as_null`](Policy::default_as_null) for every container sharing this policy
    pub fn set_default_as_null(&self, on: bool) {
        self.default_as_null.store(on, Ordering::Relaxed);
    }

    pub fn set_containers_not_empty_if_issues(&self, on: bool) {
        self.containers_not_empty_if_issues
            .store(on, Ordering::Relaxed);
    }

    pub fn set_treat_exceptions_as_errors(&self, on: bool) {
        self.treat_exceptions_as_errors.store(on, Ordering::Relaxed);
    }

    pub fn set_throw_exceptions_from_user_handling_code(&self, on: bool) {
        self.throw_exceptions_from_user_handling_code
            .store(on, Ordering::Relaxed);
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new(PolicySnapshot::default())
    }
}
