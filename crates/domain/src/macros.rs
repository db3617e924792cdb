//! Macro for implementing Display and FromStr for wire-name enums
//!
//! Several domain enums travel over the wire as short lowercase strings (the
//! metric `type` tag, for one). This macro keeps their `Display` and `FromStr`
//! impls in one place so both directions always agree.
//!
//! # Example
//!
//! ```rust
//! use clusterwatch_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Unit {
//!     Seconds,
//!     Milliseconds,
//! }
//!
//! impl_wire_name_conversions!(Unit {
//!     Seconds => "seconds",
//!     Milliseconds => "milliseconds",
//! });
//!
//! assert_eq!(Unit::Seconds.to_string(), "seconds");
//! assert_eq!("MILLISECONDS".parse::<Unit>().unwrap(), Unit::Milliseconds);
//! ```

/// Implements Display and FromStr for an enum with fixed wire names
///
/// - `Display` writes the wire name
/// - `FromStr` matches case-insensitively and fails with
///   [`ClusterWatchError::InvalidInput`](crate::ClusterWatchError)
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Wire name of this variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::ClusterWatchError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err($crate::ClusterWatchError::InvalidInput(format!(
                        "unknown {} '{}'",
                        stringify!($enum_name),
                        s
                    ))),
                }
            }
        }
    };
}
