//! Serde support for [`Outcome`].
//!
//! The wire form is `{ "state", "value", "errors" }`. Deserializing checks
//! that the three agree and attaches the process-wide context.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::Context;
use crate::error::OutcomeError;
use crate::errors::Error;
use crate::outcome::Outcome;
use crate::state::State;
use crate::variants::Variants;

#[derive(Serialize)]
struct OutcomeRef<'a, V> {
    state: State,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a V>,
    errors: &'a [Error],
}

#[derive(Deserialize)]
struct OutcomeRepr<V> {
    state: State,
    value: Option<V>,
    #[serde(default)]
    errors: Vec<Error>,
}

impl<V: Variants> OutcomeRepr<V> {
    // Zero values are judged live against the policy, so only absent values count here
    fn check(&self) -> Result<(), String> {
        let first_is_exception = self.errors.first().map(Error::is_exception);
        match (self.state, first_is_exception) {
            (State::Empty, None) if self.value.is_none() => Ok(()),
            (State::Empty, _) => Err("empty outcome carries a value or errors".into()),
            (State::Result, None) => match &self.value {
                Some(v) if !v.is_null(false) => Ok(()),
                Some(v) => Err(format!("result outcome holds an absent {}", v.type_name())),
                None => Err("result outcome has no value".into()),
            },
            (State::Result, Some(_)) => Err("result outcome carries errors".into()),
            (State::Error, Some(false)) => Ok(()),
            (State::Error, Some(true)) => {
                Err("first error of an error outcome wraps an exception".into())
            }
            (State::Exception, Some(true)) => Ok(()),
            (State::Exception, Some(false)) => {
                Err("first error of an exception outcome is not an exception".into())
            }
            (State::Error | State::Exception, None) => {
                Err(format!("{} outcome has no errors", self.state))
            }
        }
    }
}

impl<V> Serialize for Outcome<V>
where
    V: Variants + Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OutcomeRef {
            state: self.state,
            value: self.value.as_ref(),
            errors: &self.errors,
        }
        .serialize(serializer)
    }
}

impl<'de, V> Deserialize<'de> for Outcome<V>
where
    V: Variants + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = OutcomeRepr::<V>::deserialize(deserializer)?;
        repr.check().map_err(de::Error::custom)?;
        Ok(Outcome {
            state: repr.state,
            value: repr.value,
            errors: Arc::new(repr.errors),
            matched: None,
            context: Context::global(),
        })
    }
}

impl<V> Outcome<V>
where
    V: Variants + Serialize,
{
    /// # Errors
    ///
    /// Returns `OutcomeError::Serialization` if a held value fails to serialize.
    pub fn to_json(&self) -> Result<String, OutcomeError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<V> Outcome<V>
where
    V: Variants + DeserializeOwned,
{
    /// Reads an outcome from JSON under `context`
    ///
    /// # Errors
    ///
    /// Returns `OutcomeError::Serialization` for malformed or inconsistent input.
    pub fn from_json_in(context: &Arc<Context>, input: &str) -> Result<Self, OutcomeError> {
        let mut outcome: Self = serde_json::from_str(input)?;
        outcome.context = Arc::clone(context);
        Ok(outcome)
    }
}
