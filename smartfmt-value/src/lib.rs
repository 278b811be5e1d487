//! `smartfmt-value` provides the dynamic value model that `smartfmt`
//! resolves selectors against.
//!
//! The main type is [`Value`]: null, booleans, integers, floats, strings,
//! lists and maps. Compound payloads are reference-counted, so cloning a
//! `Value` is cheap and a resolved sub-value can be handed around without
//! copying the whole argument graph. Values are immutable once built and
//! `Send + Sync`, which lets one argument set serve many concurrent format
//! calls.

#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]

mod value;
pub use value::*;

mod macros;
