//! Error types for style handling.

use thiserror::Error;

/// A style map entry that cannot be turned into an inline declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    /// Property name is not a camelCase or kebab-case CSS identifier
    #[error("invalid style property: {property:?}")]
    InvalidProperty {
        /// The rejected property name.
        property: String,
    },

    /// Value contains characters that could escape the declaration
    #[error("invalid value for {property}: {value:?}")]
    InvalidValue {
        /// Property the value was given for.
        property: String,
        /// The rejected value.
        value: String,
    },
}
