//! Server tuning constants.

use std::time::Duration;

/// Concurrent request limit
pub const MAX_CONCURRENCY: usize = 256;

/// Request body size limit
pub const MAX_BODY_SIZE: usize = 1024 * 1024; // 1MB

/// Per-request timeout for plain storage-backed endpoints
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for endpoints that call the execution collaborator. Proof
/// construction and chain submission dominate, so this exceeds the
/// collaborator client timeout by a small margin.
pub const COLLABORATOR_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// CORS preflight cache duration
pub const CORS_MAX_AGE: Duration = Duration::from_secs(3600);
