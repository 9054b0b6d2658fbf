use serde::{Deserialize, Serialize};
use std::fmt;

/// The subsystem an ABI error code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    Host,
    Discord,
    Kv,
}

macro_rules! define_error_codes {
    ( $( $variant:ident = $code:literal, $subsystem:ident, $label:literal ),* $(,)? ) => {
        /// Numeric error codes the host reports across the guest boundary.
        /// The shim passes them through without acting on them.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u32", into = "u32")]
        pub enum ErrorCode {
            $( $variant, )*
        }

        impl ErrorCode {
            pub const ALL: &'static [ErrorCode] = &[ $( ErrorCode::$variant, )* ];

            pub fn code(self) -> u32 {
                match self {
                    $( ErrorCode::$variant => $code, )*
                }
            }

            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $( $code => Some(ErrorCode::$variant), )*
                    _ => None,
                }
            }

            pub fn subsystem(self) -> Subsystem {
                match self {
                    $( ErrorCode::$variant => Subsystem::$subsystem, )*
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $( ErrorCode::$variant => $label, )*
                }
            }
        }
    };
}

define_error_codes! {
    Unknown = 100, Host, "unknown error",
    Timeout = 101, Host, "timed out",
    Canceled = 102, Host, "canceled",
    Unimplemented = 103, Host, "unimplemented",
    ValidationFailed = 104, Host, "validation failed",

    GuildNotFound = 200, Discord, "guild not found",
    ChannelNotFound = 201, Discord, "channel not found",
    MessageNotFound = 202, Discord, "message not found",
    BanNotFound = 203, Discord, "ban not found",

    KeyNotFound = 300, Kv, "key not found",
    ValueTypeMismatch = 301, Kv, "value type mismatch",
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u32> for ErrorCode {
    type Error = String;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        ErrorCode::from_code(code).ok_or_else(|| format!("unknown error code {}", code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_partitioned_by_subsystem() {
        for code in ErrorCode::ALL {
            let expected = match code.code() / 100 {
                1 => Subsystem::Host,
                2 => Subsystem::Discord,
                3 => Subsystem::Kv,
                other => panic!("code outside every subsystem: {}", other),
            };
            assert_eq!(code.subsystem(), expected);
            assert_eq!(ErrorCode::from_code(code.code()), Some(*code));
        }
        assert_eq!(ErrorCode::from_code(999), None);
    }

    #[test]
    fn serializes_as_its_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::KeyNotFound).unwrap(), "300");
        let parsed: ErrorCode = serde_json::from_str("202").unwrap();
        assert_eq!(parsed, ErrorCode::MessageNotFound);
        assert!(serde_json::from_str::<ErrorCode>("42").is_err());
    }
}
