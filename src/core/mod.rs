//! Core types for docweave
//!
//! This module holds the error taxonomy shared by every phase of a build and the
//! helpers that turn a failure into something a documentation author can act on.
//!
//! # Error Management
//!
//! - **Strongly-typed errors** ([`DocError`]) for precise error handling in code
//! - **User-friendly contexts** ([`ErrorContext`]) with actionable suggestions for CLI users
//! - **Automatic conversion** from [`std::io::Error`] and [`toml::de::Error`]
//!
//! Library code returns [`anyhow::Result`] and attaches `.context()` at file system
//! seams; typed [`DocError`] values travel inside the `anyhow::Error` and are recovered
//! by [`user_friendly_error`] in `main`.
//!
//! # Examples
//!
//! ```rust
//! use docweave::core::{DocError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn load_outline() -> Result<()> {
//!     Err(DocError::DuplicateOutlineLink {
//!         href: "guide.html".to_string(),
//!         line: 7,
//!         previous_line: 2,
//!     }
//!     .into())
//! }
//!
//! if let Err(e) = load_outline() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.to_string().contains("line 7"));
//! }
//! ```

pub mod error;

pub use error::{DocError, ErrorContext, user_friendly_error};
