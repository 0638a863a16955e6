//! Error handling for docweave
//!
//! This module provides the error types and user-friendly error reporting for the
//! documentation generator. The error system is designed around two core principles:
//! 1. **Strongly-typed errors** for precise error handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`DocError`] - Enumerated error types for all failure cases of a build
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! # Error Categories
//!
//! Build errors fall into four groups, and every one of them halts the whole run:
//! - **Load-time**: [`DocError::RootNotFound`], [`DocError::MalformedReferenceMap`],
//!   [`DocError::MalformedOutline`], [`DocError::DuplicateOutlineLink`], [`DocError::MetadataParse`]
//! - **Per-entity**: [`DocError::MissingScriptAttribute`], [`DocError::MissingParent`],
//!   [`DocError::UnknownKind`], [`DocError::MissingDeclaredIn`]
//! - **Aggregated**: [`DocError::UnresolvedReferences`], [`DocError::DeadLinks`]
//! - **Fragment ordering**: [`DocError::UnknownFragment`], [`DocError::FragmentNotRendered`],
//!   [`DocError::FragmentCycle`], [`DocError::QueueStillShared`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use docweave::core::{DocError, user_friendly_error};
//!
//! fn load() -> Result<(), DocError> {
//!     Err(DocError::MalformedReferenceMap {
//!         line: 3,
//!         content: "lonely-keyword".to_string(),
//!     })
//! }
//!
//! if let Err(e) = load() {
//!     let ctx = user_friendly_error(anyhow::Error::from(e));
//!     ctx.display(); // Shows colored error with suggestions
//! }
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for docweave operations.
///
/// Each variant carries enough context (file, line, identifier) to point the
/// user at the offending input without re-running with debug logging.
#[derive(Error, Debug)]
pub enum DocError {
    /// A required input directory does not exist
    #[error("Root directory not found: {path}")]
    RootNotFound {
        /// The directory that was expected
        path: String,
    },

    /// A required input file does not exist
    #[error("Unable to find {what} at '{path}'")]
    SourceFileNotFound {
        /// Human readable name of the file ("reference map", "outline", ...)
        what: String,
        /// The path that was checked
        path: String,
    },

    /// A reference map line is not exactly a keyword and a target
    #[error("Malformed reference map entry on line {line}: {content}")]
    MalformedReferenceMap {
        /// 1-based line number
        line: usize,
        /// The raw line
        content: String,
    },

    /// A reference map target does not exist as an article or API document
    #[error("Unable to resolve path {target} in reference map entry on line {line}")]
    UnresolvableReference {
        /// The target path from the mapping
        target: String,
        /// 1-based line number
        line: usize,
    },

    /// The reference rewrite loop exceeded its iteration cap
    #[error("Reference resolution in {path} did not settle after {iterations} replacements")]
    ReferenceLoop {
        /// Document being resolved
        path: String,
        /// Number of replacements performed before giving up
        iterations: usize,
    },

    /// An outline line could not be parsed
    #[error("Malformed entry in outline at line {line} ({reason}): {content}")]
    MalformedOutline {
        /// 1-based line number
        line: usize,
        /// What is wrong with the line
        reason: String,
        /// The raw line
        content: String,
    },

    /// An outline entry points at a file that does not exist
    #[error("Link referenced in outline on line {line} not found: '{path}'")]
    OutlineTargetNotFound {
        /// 1-based line number
        line: usize,
        /// Full path that was checked
        path: String,
    },

    /// The same link appears twice in the outline
    #[error("Duplicate link found in outline on line {line}: {href} (previously seen on line {previous_line})")]
    DuplicateOutlineLink {
        /// The normalized link
        href: String,
        /// 1-based line of the duplicate
        line: usize,
        /// 1-based line of the first occurrence
        previous_line: usize,
    },

    /// A metadata JSON file could not be parsed
    #[error("Failed to parse API metadata '{path}': {reason}")]
    MetadataParse {
        /// The offending file
        path: String,
        /// Parser message
        reason: String,
    },

    /// A script-style entity lacks the comment attribute its title depends on
    #[error("Found {kind} without {attribute} comment, unable to generate title: {id}")]
    MissingScriptAttribute {
        /// Entity id
        id: String,
        /// Entity kind tag
        kind: String,
        /// Name of the missing attribute
        attribute: String,
    },

    /// An entity refers to a parent that was never loaded
    #[error("Entity {id} refers to parent {parent_id} which was not found")]
    MissingParent {
        /// Entity id
        id: String,
        /// Missing parent id
        parent_id: String,
    },

    /// An entity kind has no rendering rule
    #[error("Unable to identify table of contents icon for {id} with kind {kind}")]
    UnknownKind {
        /// Entity id
        id: String,
        /// Kind tag
        kind: String,
    },

    /// A TOC entity could not be given a title
    #[error("No title could be generated for {id} in {path}")]
    MissingTitle {
        /// Entity id
        id: String,
        /// Document being rendered
        path: String,
    },

    /// A non-self TOC bucket has no declared-in descriptor
    #[error("Got section without declared-in descriptor for ancestor {ancestor} inside {entity}")]
    MissingDeclaredIn {
        /// Ancestor URI of the bucket
        ancestor: String,
        /// Subject entity URI
        entity: String,
    },

    /// A splice referenced a fragment id the queue never produced
    #[error("Tried applying deferred markdown fragment {id} - unknown id")]
    UnknownFragment {
        /// Fragment id
        id: String,
    },

    /// A splice referenced a fragment that has not been converted
    #[error("Tried applying deferred markdown fragment {id} which has not yet been rendered")]
    FragmentNotRendered {
        /// Fragment id
        id: String,
    },

    /// A fragment contains its own placeholder, directly or through others
    #[error("Deferred markdown fragment {id} contains its own placeholder")]
    FragmentCycle {
        /// Fragment id
        id: String,
    },

    /// The render queue was flushed while drafters still held a handle to it
    #[error("Render queue flushed while still shared by {owners} other owner(s)")]
    QueueStillShared {
        /// Number of outstanding handles
        owners: usize,
    },

    /// Unresolved cross-references were found in strict mode
    #[error("{count} unresolved reference(s) found")]
    UnresolvedReferences {
        /// Number of distinct unresolved references
        count: usize,
    },

    /// Dead internal links were found in the rendered corpus
    #[error("Missing links found: {files} file(s) had in total {links} invalid/dead link(s)")]
    DeadLinks {
        /// Number of files with dead links
        files: usize,
        /// Total number of dead links
        links: usize,
    },

    /// The page layout could not be applied
    #[error("Layout error: {reason}")]
    LayoutError {
        /// Template engine message
        reason: String,
    },

    /// Site configuration is invalid
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Error context wrapper that provides user-friendly error information
///
/// Wraps a [`DocError`] with an optional suggestion and extra details, and
/// knows how to print itself with terminal colors.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: DocError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: DocError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`DocError`] variants (anywhere in the anyhow chain's root),
/// [`std::io::Error`] and [`serde_json::Error`]; everything else is wrapped as
/// [`DocError::Other`] with the full cause chain appended.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    let error = match error.downcast::<DocError>() {
        Ok(doc_error) => return create_error_context(doc_error),
        Err(other) => other,
    };

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(DocError::Other {
                    message: io_error.to_string(),
                })
                .with_suggestion("Check permissions of the source root and the output directory");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(DocError::Other {
                    message: io_error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(DocError::Other {
        message,
    })
}

fn create_error_context(error: DocError) -> ErrorContext {
    let (suggestion, details): (Option<String>, Option<&str>) = match &error {
        DocError::RootNotFound { .. } => (
            Some("Pass the documentation source root as the first argument".to_string()),
            Some("The root must contain 'articles/' and 'api-docs/' directories"),
        ),
        DocError::SourceFileNotFound { what, .. } => (
            Some(format!("Create the {what} file in the documentation root")),
            None,
        ),
        DocError::MalformedReferenceMap { .. } => (
            Some("Each reference map line must be 'keyword<whitespace>target-path'".to_string()),
            Some("Lines starting with '//' and blank lines are ignored"),
        ),
        DocError::UnresolvableReference { target, .. } => (
            Some(format!(
                "Check that 'articles/{target}.md' or 'api-docs/api/{target}.json' exists"
            )),
            None,
        ),
        DocError::ReferenceLoop { .. } => (
            Some("Look for aliased references whose title contains the reference itself".to_string()),
            Some("Every replacement re-scans the document; a self-reproducing reference never settles"),
        ),
        DocError::MalformedOutline { .. } => (
            Some("Outline lines must be 'title : link', indented with tabs only".to_string()),
            None,
        ),
        DocError::DuplicateOutlineLink { .. } => {
            (Some("Remove one of the duplicate outline entries".to_string()), None)
        }
        DocError::MetadataParse { .. } => (
            Some("Regenerate the API metadata export".to_string()),
            Some("A malformed metadata document indicates an upstream export bug"),
        ),
        DocError::MissingScriptAttribute { .. }
        | DocError::MissingParent { .. }
        | DocError::UnknownKind { .. }
        | DocError::MissingDeclaredIn { .. } => (
            Some("Regenerate the API metadata export".to_string()),
            Some("The metadata is internally inconsistent; no partial site is written"),
        ),
        DocError::UnresolvedReferences { .. } => (
            Some("Fix the references listed above, add them to the reference map, or pass --lenient".to_string()),
            None,
        ),
        DocError::DeadLinks { .. } => {
            (Some("Correct the links listed above before re-running".to_string()), None)
        }
        DocError::UnknownFragment { .. }
        | DocError::FragmentNotRendered { .. }
        | DocError::FragmentCycle { .. }
        | DocError::QueueStillShared { .. } => (
            None,
            Some("This is an internal ordering bug in the generator"),
        ),
        _ => (None, None),
    };

    let mut ctx = ErrorContext::new(error);
    if let Some(suggestion) = suggestion {
        ctx = ctx.with_suggestion(suggestion);
    }
    if let Some(details) = details {
        ctx = ctx.with_details(details);
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_error_is_recovered_from_anyhow() {
        let error = anyhow::Error::from(DocError::MalformedReferenceMap {
            line: 4,
            content: "alone".to_string(),
        });

        let ctx = user_friendly_error(error);
        assert!(matches!(ctx.error, DocError::MalformedReferenceMap { line: 4, .. }));
        assert!(ctx.suggestion.is_some());
    }

    #[test]
    fn test_generic_error_keeps_cause_chain() {
        let error = anyhow::anyhow!("root cause").context("outer failure");

        let ctx = user_friendly_error(error);
        let message = ctx.to_string();
        assert!(message.contains("outer failure"));
        assert!(message.contains("Caused by"));
        assert!(message.contains("root cause"));
    }

    #[test]
    fn test_display_includes_suggestion() {
        let ctx = ErrorContext::new(DocError::DeadLinks {
            files: 2,
            links: 5,
        })
        .with_suggestion("fix them");

        let rendered = format!("{ctx}");
        assert!(rendered.contains("2 file(s) had in total 5"));
        assert!(rendered.contains("Suggestion: fix them"));
    }
}
