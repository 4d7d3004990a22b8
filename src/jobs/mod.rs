//! The certificate issuance pipeline
//!
//! Everything between "a CSV file exists" and "certbot ran for every
//! domain in it" lives here.
//!
//! # Architecture
//!
//! The pipeline consists of four components:
//!
//! - [`JobSource`] - Reads the CSV job file into an ordered sequence
//!   of [`JobDescriptor`]s, fresh each cycle
//! - [`CredentialResolver`] - Maps a provider key to a DNS plugin and
//!   a credential file under the secrets directory
//! - [`IssuanceInvoker`] - Builds and runs the certbot command line
//!   for one job and classifies the result as an [`InvocationOutcome`]
//! - [`CycleScheduler`] - The infinite loop tying them together:
//!   read, iterate, invoke, log, sleep, repeat
//!
//! # Failure containment
//!
//! Per-job failures (missing credentials, a non-zero certbot exit, a
//! subprocess that will not start) are logged and the iteration moves
//! on. Cycle-level failures (missing job file, malformed rows) abort
//! the cycle, which is retried after a short fixed delay. Nothing in
//! this module terminates the process.

mod credentials;
mod error;
mod invoker;
mod scheduler;
mod source;

pub use credentials::{CredentialReference, CredentialResolver, DnsPlugin};
pub use error::{CredentialError, InvokeError, SourceError};
pub use invoker::{InvocationOutcome, IssuanceInvoker};
pub use scheduler::{CycleScheduler, CycleStats};
pub use source::{JobDescriptor, JobSource};
