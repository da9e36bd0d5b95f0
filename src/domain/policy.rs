//! Central authorization policy.
//!
//! Every privilege, scope, and ownership decision funnels through this
//! module: capability checks for the management endpoints, the visibility
//! scope applied to user/organization queries, and the ownership gate on
//! ticket mutation. Handlers and services never compare role strings
//! inline.
//!
//! Two failure shapes are deliberate and load-bearing:
//! - insufficient *role* is reported as 403 Forbidden;
//! - an in-role caller reaching for a record *outside their scope* is
//!   reported as 404 Not Found, so the response does not reveal whether
//!   the record exists at all.

use uuid::Uuid;

use crate::database::models::{Organization, Ticket, User};
use crate::domain::Role;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// The record-visibility boundary of an authenticated caller.
///
/// `Unbounded` belongs to the supreme admin alone. `Org` carries both the
/// organization the caller is pinned to and the caller's own id, because
/// organizations created by an admin remain visible to them even before
/// any membership link exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Unbounded,
    Org { organization_id: Uuid, caller_id: Uuid },
}

impl Scope {
    /// Whether a user record is visible under this scope.
    ///
    /// An org-scoped caller only ever sees users of their own organization,
    /// and admin/supreme-admin records are invisible to them entirely.
    pub fn permits_user(&self, target: &User) -> bool {
        match self {
            Scope::Unbounded => true,
            Scope::Org { organization_id, .. } => {
                target.organization_id == Some(*organization_id)
                    && target.role.is_admin_assignable()
            }
        }
    }

    /// Whether an organization record is visible under this scope.
    pub fn permits_organization(&self, target: &Organization) -> bool {
        match self {
            Scope::Unbounded => true,
            Scope::Org { organization_id, caller_id } => {
                target.id == *organization_id || target.created_by == Some(*caller_id)
            }
        }
    }
}

/// Capability check for the org-scoped management endpoints.
pub fn require_admin(caller: &AuthUser) -> Result<(), ApiError> {
    if caller.role.is_admin_level() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Administrator access required"))
    }
}

/// Capability check for the system-wide management endpoints.
pub fn require_supreme_admin(caller: &AuthUser) -> Result<(), ApiError> {
    if caller.role == Role::SupremeAdmin {
        Ok(())
    } else {
        Err(ApiError::forbidden("Supreme administrator access required"))
    }
}

/// Validate that the caller may hand out the given role.
///
/// Admins assign only roles strictly below their own; the supreme admin
/// may assign anything except another supreme admin (that account is
/// created once, at bootstrap).
pub fn ensure_assignable_role(caller: &AuthUser, target: Role) -> Result<(), ApiError> {
    match caller.role {
        Role::SupremeAdmin if target != Role::SupremeAdmin => Ok(()),
        Role::SupremeAdmin => Err(ApiError::validation_error(
            "Invalid role",
            Some(
                [("role".to_string(), "supreme_admin accounts cannot be created".to_string())]
                    .into_iter()
                    .collect(),
            ),
        )),
        Role::Admin if target.is_admin_assignable() => Ok(()),
        Role::Admin => Err(ApiError::validation_error(
            "Invalid role",
            Some(
                [(
                    "role".to_string(),
                    format!("administrators cannot assign the {target} role"),
                )]
                .into_iter()
                .collect(),
            ),
        )),
        _ => Err(ApiError::forbidden("Administrator access required")),
    }
}

/// Gate for updating or deleting an existing user record.
///
/// The supreme admin account is immutable for everyone. For org-scoped
/// admins an admin-or-above target is outside their visible scope, so it
/// reads as nonexistent rather than forbidden.
pub fn ensure_user_mutable(caller: &AuthUser, target: &User) -> Result<(), ApiError> {
    if target.role == Role::SupremeAdmin {
        return Err(ApiError::forbidden(
            "Supreme administrator accounts cannot be modified or deleted",
        ));
    }
    if caller.role == Role::Admin && !target.role.is_admin_assignable() {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(())
}

/// Ticket mutation gate: assignee, creator, or an admin-level role.
pub fn can_mutate_ticket(caller: &AuthUser, ticket: &Ticket) -> bool {
    caller.role.is_admin_level()
        || ticket.assigned_to == Some(caller.user_id)
        || ticket.created_by == caller.user_id
}

pub fn ensure_ticket_mutable(caller: &AuthUser, ticket: &Ticket) -> Result<(), ApiError> {
    if can_mutate_ticket(caller, ticket) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not have access to this ticket"))
    }
}

/// Ticket deletion is narrower than mutation: admin-level or creator only.
pub fn ensure_ticket_deletable(caller: &AuthUser, ticket: &Ticket) -> Result<(), ApiError> {
    if caller.role.is_admin_level() || ticket.created_by == caller.user_id {
        Ok(())
    } else {
        Err(ApiError::forbidden("Only administrators or the ticket creator can delete a ticket"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::{AccountStatus, TicketCategory, TicketPriority, TicketStatus};

    fn caller(role: Role, org: Option<Uuid>) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            name: "Caller".to_string(),
            email: "caller@example.com".to_string(),
            role,
            organization_id: org,
            token: "token".to_string(),
        }
    }

    fn user(role: Role, org: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Target".to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "x".to_string(),
            role,
            status: AccountStatus::Active,
            organization_id: org,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login: None,
        }
    }

    fn ticket(created_by: Uuid, assigned_to: Option<Uuid>) -> Ticket {
        Ticket {
            id: Uuid::new_v4(),
            student_name: "Student".to_string(),
            student_email: "student@example.com".to_string(),
            student_id: None,
            course: None,
            category: TicketCategory::Academic,
            title: "Help".to_string(),
            description: "Help needed".to_string(),
            priority: TicketPriority::Medium,
            status: TicketStatus::Open,
            assigned_to,
            created_by,
            due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn capability_checks_follow_role_levels() {
        let org = Uuid::new_v4();
        assert!(require_admin(&caller(Role::SupremeAdmin, None)).is_ok());
        assert!(require_admin(&caller(Role::Admin, Some(org))).is_ok());
        assert!(require_admin(&caller(Role::Manager, Some(org))).is_err());
        assert!(require_supreme_admin(&caller(Role::SupremeAdmin, None)).is_ok());
        assert!(require_supreme_admin(&caller(Role::Admin, Some(org))).is_err());
    }

    #[test]
    fn org_scope_hides_other_organizations() {
        let org = Uuid::new_v4();
        let other_org = Uuid::new_v4();
        let admin = caller(Role::Admin, Some(org));
        let scope = Scope::Org { organization_id: org, caller_id: admin.user_id };

        assert!(scope.permits_user(&user(Role::Manager, Some(org))));
        assert!(!scope.permits_user(&user(Role::Manager, Some(other_org))));
        assert!(!scope.permits_user(&user(Role::Manager, None)));
    }

    #[test]
    fn org_scope_hides_admin_level_records() {
        let org = Uuid::new_v4();
        let admin = caller(Role::Admin, Some(org));
        let scope = Scope::Org { organization_id: org, caller_id: admin.user_id };

        // Even inside their own organization, admin and supreme_admin rows
        // are invisible to an org-scoped admin.
        assert!(!scope.permits_user(&user(Role::Admin, Some(org))));
        assert!(!scope.permits_user(&user(Role::SupremeAdmin, Some(org))));
        assert!(scope.permits_user(&user(Role::TeamMember, Some(org))));
    }

    #[test]
    fn unbounded_scope_sees_everything() {
        let scope = Scope::Unbounded;
        assert!(scope.permits_user(&user(Role::SupremeAdmin, None)));
        assert!(scope.permits_user(&user(Role::TeamMember, Some(Uuid::new_v4()))));
    }

    #[test]
    fn admin_cannot_assign_admin_or_supreme() {
        let org = Uuid::new_v4();
        let admin = caller(Role::Admin, Some(org));

        assert!(ensure_assignable_role(&admin, Role::Manager).is_ok());
        assert!(ensure_assignable_role(&admin, Role::UniversityAdmin).is_ok());
        assert!(ensure_assignable_role(&admin, Role::Admin).is_err());
        assert!(ensure_assignable_role(&admin, Role::SupremeAdmin).is_err());
    }

    #[test]
    fn supreme_can_assign_all_but_supreme() {
        let supreme = caller(Role::SupremeAdmin, None);
        assert!(ensure_assignable_role(&supreme, Role::Admin).is_ok());
        assert!(ensure_assignable_role(&supreme, Role::TeamMember).is_ok());
        assert!(ensure_assignable_role(&supreme, Role::SupremeAdmin).is_err());
    }

    #[test]
    fn staff_roles_cannot_assign_anything() {
        let dean = caller(Role::Dean, Some(Uuid::new_v4()));
        assert!(ensure_assignable_role(&dean, Role::TeamMember).is_err());
    }

    #[test]
    fn supreme_admin_account_is_immutable_for_everyone() {
        let supreme_target = user(Role::SupremeAdmin, None);
        let supreme_caller = caller(Role::SupremeAdmin, None);
        let admin_caller = caller(Role::Admin, Some(Uuid::new_v4()));

        assert!(ensure_user_mutable(&supreme_caller, &supreme_target).is_err());
        assert!(ensure_user_mutable(&admin_caller, &supreme_target).is_err());
    }

    #[test]
    fn admin_target_reads_as_not_found_for_admin_caller() {
        let org = Uuid::new_v4();
        let admin_caller = caller(Role::Admin, Some(org));
        let err = ensure_user_mutable(&admin_caller, &user(Role::Admin, Some(org))).unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn supreme_may_modify_admins() {
        let supreme = caller(Role::SupremeAdmin, None);
        assert!(ensure_user_mutable(&supreme, &user(Role::Admin, Some(Uuid::new_v4()))).is_ok());
    }

    #[test]
    fn ticket_mutation_requires_assignee_creator_or_admin() {
        let assignee = caller(Role::TeamMember, None);
        let creator = caller(Role::Manager, None);
        let bystander = caller(Role::Dean, None);
        let admin = caller(Role::Admin, Some(Uuid::new_v4()));

        let t = ticket(creator.user_id, Some(assignee.user_id));

        assert!(ensure_ticket_mutable(&assignee, &t).is_ok());
        assert!(ensure_ticket_mutable(&creator, &t).is_ok());
        assert!(ensure_ticket_mutable(&admin, &t).is_ok());
        assert!(ensure_ticket_mutable(&bystander, &t).is_err());
    }

    #[test]
    fn ticket_deletion_excludes_plain_assignee() {
        let assignee = caller(Role::TeamMember, None);
        let creator = caller(Role::Manager, None);
        let t = ticket(creator.user_id, Some(assignee.user_id));

        assert!(ensure_ticket_deletable(&creator, &t).is_ok());
        assert!(ensure_ticket_deletable(&assignee, &t).is_err());
        assert!(ensure_ticket_deletable(&caller(Role::Admin, None), &t).is_ok());
    }

    #[test]
    fn organization_scope_covers_own_and_created() {
        let org = Uuid::new_v4();
        let admin = caller(Role::Admin, Some(org));
        let scope = Scope::Org { organization_id: org, caller_id: admin.user_id };

        let own = Organization {
            id: org,
            name: "Own".to_string(),
            org_type: crate::domain::OrgType::Company,
            status: AccountStatus::Active,
            created_by: None,
            parent_organization_id: None,
            settings: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let created = Organization {
            id: Uuid::new_v4(),
            created_by: Some(admin.user_id),
            name: "Created".to_string(),
            ..own.clone()
        };
        let foreign = Organization {
            id: Uuid::new_v4(),
            name: "Foreign".to_string(),
            ..own.clone()
        };

        assert!(scope.permits_organization(&own));
        assert!(scope.permits_organization(&created));
        assert!(!scope.permits_organization(&foreign));
    }
}
