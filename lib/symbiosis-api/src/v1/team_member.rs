use serde::{Deserialize, Serialize};

/// Request body for inviting users to the team
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMemberInvite {
    pub emails: Vec<String>,
    pub role: String,
}

/// In-place role change of a member
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMemberRoleUpdate {
    pub role: String,
}

/// Accepted member or pending invitation, both endpoints share this shape
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub email: String,
    pub role: String,
}
