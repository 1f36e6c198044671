//! Organization records owned by the external organization store

use serde::{Deserialize, Serialize};

/// An organization that donates to its dependencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    /// Login of the organization on the code host
    pub name: String,
    /// Code host app installation used to mint access tokens
    pub installation_id: String,
    /// Code host name, e.g. `github`
    pub host: String,
}
