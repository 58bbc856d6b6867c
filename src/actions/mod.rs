//! Actions on resolved duplicate groups.
//!
//! The finder only reports; this module changes the filesystem:
//! - Permanent removal or removal to the system trash
//! - Replacement by symbolic or hard links to the canonical copy
//! - Dry runs that only log
//!
//! ```no_run
//! use dupetree::actions::{execute_groups, ActionConfig, ActionKind};
//!
//! let config = ActionConfig::new(ActionKind::Delete).with_trash(true);
//! let report = execute_groups(&[], &[], &config);
//! println!("{}", report.summary());
//! ```

pub mod executor;

pub use executor::{execute_groups, ActionConfig, ActionError, ActionKind, ActionReport, SkipReason};
