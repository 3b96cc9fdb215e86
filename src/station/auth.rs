use log::warn;

use crate::config::StationPolicy;
use crate::error::CommandError;
use crate::types::CallerIdentity;

// Network configuration belongs to the foreground user; trusted system uids
// may act on its behalf.
pub fn authorize_config_change(
    caller: CallerIdentity,
    foreground_user: u32,
    policy: &StationPolicy,
) -> Result<(), CommandError> {
    if caller.user_id == foreground_user || policy.is_trusted_uid(caller.uid) {
        return Ok(());
    }
    warn!(
        "station: uid {} (user {}) may not change networks of user {}",
        caller.uid, caller.user_id, foreground_user
    );
    Err(CommandError::NotAuthorized)
}
