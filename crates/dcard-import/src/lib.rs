//! # dcard-import — Card Import Pipeline
//!
//! Takes an import reference from a host (a QR payload or deep link) to a
//! verified, stored card:
//!
//! ```text
//! reference ─▶ ImportResolver ─▶ CardVerifier ─▶ CardStore ─▶ ImportHooks
//!               (direct/gateway)   (verdict)      (best effort)
//! ```
//!
//! - **`ImportResolver`**: URL normalization, fingerprint hints, direct
//!   fetch with manifest + gateway fallback.
//! - **`CardVerifier`**: `verified` / `unverified` / `unsigned` verdicts,
//!   with integrity failures always fatal and strict mode opt-in.
//! - **`CardStore`**: get/put by fingerprint, in memory or on disk.
//! - **`ImportPipeline`**: runs the stages in order and always clears the
//!   import reference.
//!
//! Network access goes through [`DocumentFetcher`]; [`HttpFetcher`] retries
//! transport errors with exponential backoff and bounds each request with a
//! timeout.

pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod resolver;
pub(crate) mod retry;
pub mod store;
pub mod verify;

pub use config::{ConfigError, ImportConfig};
pub use error::{ErrorCategory, FetchError, ImportError, StoreError};
pub use fetch::{DocumentFetcher, HttpFetcher};
pub use pipeline::{ImportHooks, ImportOutcome, ImportPipeline, NoopHooks, SUCCESS_MESSAGE};
pub use resolver::{extract_fingerprint, ImportResolver, ResolutionSource, ResolvedCard};
pub use store::{CardStore, FsCardStore, InMemoryCardStore, StoredCard};
pub use verify::{CardVerifier, VerificationResult, VerificationStatus};
