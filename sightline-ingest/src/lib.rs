//! sightline-ingest library interface
//!
//! Exposes the submission store, the ingestion services, and the
//! reconciliation engine for integration testing and for the CLI binary.

pub mod db;
pub mod models;
pub mod services;

pub use models::{Asset, CandidateFile, ResolvedCandidate, Submission};
pub use services::reconciler::{ReconcileReport, Reconciler};
pub use services::submission_store::SubmissionStore;
