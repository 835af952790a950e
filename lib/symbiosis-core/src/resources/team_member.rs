use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use symbiosis_api::{TeamMember, TeamMemberInvite, TeamMemberRoleUpdate};
use symbiosis_client::{Deleted, SymbiosisApi};

use crate::error::ValidationError;
use crate::lookup::{first_present, Lookup};
use crate::mapper;
use crate::reconciler::{ManagedResource, Reconciler};

/// Team role
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamRole {
    #[default]
    Member,
    Admin,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Member => "MEMBER",
            TeamRole::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MEMBER" => Ok(TeamRole::Member),
            "ADMIN" => Ok(TeamRole::Admin),
            other => Err(ValidationError::Invalid {
                field: "role",
                reason: format!("unknown role {other:?}, expected MEMBER or ADMIN"),
            }),
        }
    }
}

/// Desired team membership, `email` is the identity and `role` is mutable
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMemberSpec {
    pub email: String,
    #[serde(default)]
    pub role: TeamRole,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedTeamMember {
    pub email: String,
    /// Role as reported by the API, kept verbatim
    pub role: String,
    /// False while only the invitation exists
    pub accepted_invitation: bool,
}

impl ObservedTeamMember {
    pub fn as_spec(&self) -> Result<TeamMemberSpec, ValidationError> {
        Ok(TeamMemberSpec {
            email: self.email.clone(),
            role: self.role.parse()?,
        })
    }
}

pub struct TeamMemberResource;

pub type TeamMemberReconciler = Reconciler<TeamMemberResource>;

#[async_trait]
impl ManagedResource for TeamMemberResource {
    type Spec = TeamMemberSpec;
    type Key = String;
    type CreateRequest = TeamMemberInvite;
    type Observed = ObservedTeamMember;
    type Patch = TeamMemberRoleUpdate;

    const KIND: &'static str = "team member";

    fn label(spec: &TeamMemberSpec) -> String {
        spec.email.clone()
    }

    fn create_request(spec: &TeamMemberSpec) -> Result<TeamMemberInvite, ValidationError> {
        mapper::non_empty("email", &spec.email)?;
        if !spec.email.contains('@') {
            return Err(ValidationError::Invalid {
                field: "email",
                reason: format!("{:?} is not an email address", spec.email),
            });
        }
        Ok(TeamMemberInvite {
            emails: vec![spec.email.clone()],
            role: spec.role.to_string(),
        })
    }

    /// The invite endpoint returns nothing, the email is the identity
    async fn submit(api: &dyn SymbiosisApi, request: &TeamMemberInvite) -> symbiosis_client::Result<String> {
        api.invite_team_members(request).await?;
        Ok(request.emails.join(","))
    }

    /// Accepted member first, then the pending invitation
    async fn describe(api: &dyn SymbiosisApi, email: &String) -> symbiosis_client::Result<Option<ObservedTeamMember>> {
        let lookups: Vec<Lookup<'_, TeamMember, symbiosis_client::ClientError>> = vec![
            Box::new(move || api.describe_team_member(email)),
            Box::new(move || api.describe_team_invitation(email)),
        ];
        let found = first_present(lookups).await?;
        Ok(found.map(|(index, member)| ObservedTeamMember {
            email: member.email,
            role: member.role,
            accepted_invitation: index == 0,
        }))
    }

    fn changes(current: &TeamMemberSpec, desired: &TeamMemberSpec) -> Result<Vec<TeamMemberRoleUpdate>, ValidationError> {
        if current.email != desired.email {
            return Err(ValidationError::ImmutableField { field: "email" });
        }
        if current.role == desired.role {
            return Ok(Vec::new());
        }
        Ok(vec![TeamMemberRoleUpdate {
            role: desired.role.to_string(),
        }])
    }

    async fn apply_patch(api: &dyn SymbiosisApi, email: &String, patch: &TeamMemberRoleUpdate) -> symbiosis_client::Result<()> {
        api.update_team_member_role(email, patch).await
    }

    async fn delete(api: &dyn SymbiosisApi, email: &String) -> symbiosis_client::Result<Deleted> {
        api.delete_team_member(email).await
    }

    fn state(member: &ObservedTeamMember) -> String {
        if member.accepted_invitation {
            "accepted".to_string()
        } else {
            "invited".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;
    use crate::testing::{api_error, Call, FakeApi, Reply};
    use std::sync::Arc;

    const ALICE: &str = "alice@example.com";

    fn member(role: &str) -> TeamMember {
        TeamMember {
            email: ALICE.to_string(),
            role: role.to_string(),
        }
    }

    fn spec(role: TeamRole) -> TeamMemberSpec {
        TeamMemberSpec {
            email: ALICE.to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_read_falls_back_to_invitation() {
        let api = Arc::new(FakeApi::new().with_invitations(vec![Reply::Ok(member("MEMBER"))]));
        let reconciler = TeamMemberReconciler::new(api.clone());

        let observed = reconciler.read(&ALICE.to_string()).await.unwrap().unwrap();
        assert!(!observed.accepted_invitation);
        assert_eq!(observed.role, "MEMBER");
        assert_eq!(
            api.calls(),
            vec![
                Call::DescribeTeamMember(ALICE.to_string()),
                Call::DescribeTeamInvitation(ALICE.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_read_prefers_accepted_member() {
        let api = Arc::new(
            FakeApi::new()
                .with_members(vec![Reply::Ok(member("ADMIN"))])
                .with_invitations(vec![Reply::Ok(member("MEMBER"))]),
        );
        let reconciler = TeamMemberReconciler::new(api.clone());

        let observed = reconciler.read(&ALICE.to_string()).await.unwrap().unwrap();
        assert!(observed.accepted_invitation);
        assert_eq!(observed.as_spec().unwrap(), spec(TeamRole::Admin));
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_read_absent_everywhere() {
        let api = Arc::new(FakeApi::new());
        let reconciler = TeamMemberReconciler::new(api.clone());
        assert_eq!(reconciler.read(&ALICE.to_string()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_member_lookup_error_skips_invitation() {
        let api = Arc::new(
            FakeApi::new()
                .with_members(vec![Reply::Fail(api_error(403, "Forbidden"))])
                .with_invitations(vec![Reply::Ok(member("MEMBER"))]),
        );
        let reconciler = TeamMemberReconciler::new(api.clone());

        let err = reconciler.read(&ALICE.to_string()).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Client { .. }));
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_invite_then_change_role() {
        let api = Arc::new(FakeApi::new().with_invitations(vec![Reply::Ok(member("MEMBER"))]));
        let reconciler = TeamMemberReconciler::new(api.clone());

        let created = reconciler.create(&spec(TeamRole::Member)).await.unwrap();
        assert_eq!(created.key, ALICE);
        assert!(!created.observed.unwrap().accepted_invitation);

        let patches = reconciler
            .update(&created.key, &spec(TeamRole::Member), &spec(TeamRole::Admin))
            .await
            .unwrap();
        assert_eq!(patches, 1);
        assert_eq!(
            api.writes(),
            vec![
                Call::InviteTeamMembers(TeamMemberInvite {
                    emails: vec![ALICE.to_string()],
                    role: "MEMBER".to_string(),
                }),
                Call::UpdateTeamMemberRole(
                    ALICE.to_string(),
                    TeamMemberRoleUpdate {
                        role: "ADMIN".to_string()
                    }
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_email_change_is_rejected() {
        let api = Arc::new(FakeApi::new());
        let reconciler = TeamMemberReconciler::new(api.clone());

        let moved = TeamMemberSpec {
            email: "bob@example.com".to_string(),
            role: TeamRole::Member,
        };
        let err = reconciler
            .update(&ALICE.to_string(), &spec(TeamRole::Member), &moved)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_role_strings() {
        assert_eq!("ADMIN".parse::<TeamRole>(), Ok(TeamRole::Admin));
        assert!("OWNER".parse::<TeamRole>().is_err());
        assert_eq!(serde_json::to_value(TeamRole::Member).unwrap(), serde_json::json!("MEMBER"));
    }
}
