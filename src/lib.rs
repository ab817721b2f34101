//! # sovran-outcome
//!
//! A type-safe result container that holds one of several declared value
//! types, or the structured errors that prevented producing one.
//!
//! `sovran-outcome` lets a function say "this returns a `User`, or a
//! `Redirect`, or nothing, or these errors" without inventing a new enum
//! each time. Failures are recorded, not thrown: returned errors and panics
//! are both captured into the container, classified, and handed to the
//! caller to inspect or dispatch on.
//!
//! ## Key Features
//!
//! - **Declared types**: `Outcome<OneOf2<String, i32>>` only accepts a
//!   `String` or an `i32`, checked at compile time
//! - **Structured errors**: every [`Error`] has a category, type, priority,
//!   source, timestamp and metadata
//! - **Safe invocation**: [`Context::invoke`] and friends turn panics and
//!   returned errors into recorded failures
//! - **Dispatch**: match per state, per held type, or through untyped
//!   handlers that can coerce JSON values
//! - **Configurable**: policy switches and registries live on a
//!   [`Context`], loadable from TOML
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use sovran_outcome::{Error, OneOf2, Outcome, State};
//!
//! fn lookup(id: u32) -> Outcome<OneOf2<String, i32>> {
//!     match id {
//!         0 => Outcome::from_error(Error::not_found("no user 0")),
//!         1 => Outcome::from_value("admin".to_string()),
//!         _ => Outcome::from_value(id as i32),
//!     }
//! }
//!
//! let found = lookup(1);
//! assert_eq!(found.state(), State::Result);
//! assert_eq!(found.try_get_value::<String>().map(String::as_str), Some("admin"));
//!
//! let missing = lookup(0);
//! assert!(missing.has_errors());
//! assert_eq!(missing.errors()[0].message(), "no user 0");
//! ```
//!
//! ### Capturing Failures
//!
//! ```rust
//! use sovran_outcome::{Context, OneOf1, Outcome, State};
//!
//! let ctx = Context::global();
//! let divisor = std::hint::black_box(0);
//!
//! let mut quotient: Outcome<OneOf1<i32>> = ctx.invoke(|| 100 / divisor);
//! assert_eq!(quotient.state(), State::Exception);
//!
//! let mut reported = 0;
//! quotient
//!     .matcher()
//!     .on::<i32>(|_| unreachable!())
//!     .exception(|e| {
//!         assert!(e.is_panic());
//!         reported += 1;
//!     })
//!     .run();
//! assert_eq!(reported, 1);
//! ```
//!
//! ### Classifying Errors
//!
//! ```rust
//! use sovran_outcome::{Category, Context, Error, ErrorType, OneOf1, Outcome, OutcomeError};
//! use std::num::ParseIntError;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), OutcomeError> {
//!     let ctx = Arc::new(
//!         Context::builder()
//!             .converter::<ParseIntError, _>(ErrorType::VALIDATION, |e| {
//!                 Error::validation(format!("not a number: {e}"))
//!             })
//!             .handler(ErrorType::VALIDATION, |e| eprintln!("rejected: {e}"))
//!             .build()?,
//!     );
//!
//!     let age: Outcome<OneOf1<u8>> = ctx.try_invoke(|| "old".parse::<u8>());
//!     assert_eq!(age.errors_of(Category::Client).len(), 1);
//!     assert!(!age.has_exception());
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Mapping Into a Common Type
//!
//! ```rust
//! use sovran_outcome::{OneOf2, Outcome};
//!
//! let mut outcome: Outcome<OneOf2<String, i32>> = Outcome::from_value(12i32);
//!
//! let label = outcome
//!     .try_map(|s: &String| s.clone())
//!     .try_map(|n: &i32| format!("#{n}"))
//!     .take_matched_as::<String>();
//!
//! assert_eq!(label.as_deref(), Some("#12"));
//! ```
//!
//! ### Widening and Serializing
//!
//! ```rust
//! use sovran_outcome::{OneOf2, OneOf3, Outcome, OutcomeError};
//!
//! fn main() -> Result<(), OutcomeError> {
//!     let narrow: Outcome<OneOf2<String, i32>> = Outcome::from_value(3i32);
//!     let wide: Outcome<OneOf3<bool, i32, String>> = narrow.try_convert()?;
//!     assert_eq!(wide.try_get_value::<i32>(), Some(&3));
//!
//!     let json = wide.to_json()?;
//!     let back: Outcome<OneOf3<bool, i32, String>> = serde_json::from_str(&json)?;
//!     assert_eq!(back, wide);
//!
//!     Ok(())
//! }
//! ```

mod any_value;
mod context;
mod dispatch;
mod error;
mod errors;
mod exception;
mod invoke;
mod kind;
mod outcome;
mod policy;
mod registry;
mod serialize;
mod state;
mod value;
mod variants;

pub use context::{Context, ContextBuilder};
pub use dispatch::{Handler, Matcher};
pub use error::OutcomeError;
pub use errors::Error;
pub use exception::{Exception, PANIC_TYPE_NAME};
pub use kind::{Category, ErrorType, Priority};
pub use outcome::Outcome;
pub use policy::{Policy, PolicySnapshot};
pub use registry::{Converter, ConverterRegistry, HandlerRegistry, Registry};
pub use state::State;
pub use value::Value;
pub use variants::{
    index, Member, OneOf1, OneOf10, OneOf11, OneOf12, OneOf13, OneOf14, OneOf15, OneOf16,
    OneOf2, OneOf3, OneOf4, OneOf5, OneOf6, OneOf7, OneOf8, OneOf9, Variants,
};
