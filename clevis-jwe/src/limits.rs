//! Platform limits

/// Maximum filesystem path length in bytes, counting the trailing NUL the
/// platform limit includes (PATH_MAX on Linux).
pub const MAX_PATH_LEN: usize = 4096;
