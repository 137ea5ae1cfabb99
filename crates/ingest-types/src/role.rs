use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Membership record for the live monitor's "skip our own trades" filter
/// (§3, §4.8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAddress {
    pub address: Address,
    pub role_id: String,
}
