//! Domain-level constants.

// =============================================================================
// Record Kinds
// =============================================================================

/// Discriminator stored on customer (user) documents
pub const KIND_CUSTOMER: &str = "customer";

/// Discriminator stored on address documents
pub const KIND_ADDRESS: &str = "address";

/// Discriminator stored on card documents
pub const KIND_CARD: &str = "card";

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

