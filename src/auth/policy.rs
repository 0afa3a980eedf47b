//! Authorization Policy
//! Mission: Decide, without I/O, what an identity may do to a resource
//!
//! Route handlers call these functions inline after the access guard has
//! produced (or not produced) an `Identity`.

use crate::auth::models::{Identity, Role, SubscriptionStatus};
use crate::error::ApiError;

/// What the caller is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    /// Subscriber lists and audience stats
    ViewAudience,
}

/// The facts about a resource the policy needs.
#[derive(Debug, Clone, Copy)]
pub struct Resource<'a> {
    pub author_id: Option<&'a str>,
    pub premium: bool,
}

impl<'a> Resource<'a> {
    pub fn authored(author_id: &'a str, premium: bool) -> Self {
        Self {
            author_id: Some(author_id),
            premium,
        }
    }

    /// Resources with no author (collections, dashboards).
    pub fn unowned() -> Self {
        Self {
            author_id: None,
            premium: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
    /// Existence may be confirmed but the body must be withheld
    Redact,
}

/// Single decision point for every protected operation.
pub fn authorize(identity: Option<&Identity>, resource: &Resource<'_>, action: Action) -> Decision {
    match action {
        Action::Read => {
            if can_read_full(identity, resource) {
                Decision::Allow
            } else {
                Decision::Redact
            }
        }
        Action::Create | Action::ViewAudience => match identity {
            Some(id) if is_publisher(id.role) => Decision::Allow,
            _ => Decision::Deny,
        },
        Action::Update | Action::Delete => match (identity, resource.author_id) {
            (Some(id), Some(author)) if can_mutate(id, author) => Decision::Allow,
            _ => Decision::Deny,
        },
    }
}

/// Ownership rule: the author or an admin.
pub fn can_mutate(identity: &Identity, author_id: &str) -> bool {
    identity.id == author_id || identity.role == Role::Admin
}

/// Premium gate: free content for everyone, premium content for the author,
/// publishers and paid subscribers.
pub fn can_read_full(identity: Option<&Identity>, resource: &Resource<'_>) -> bool {
    if !resource.premium {
        return true;
    }

    let Some(identity) = identity else {
        return false;
    };

    resource.author_id == Some(identity.id.as_str())
        || is_publisher(identity.role)
        || identity.subscription_status == SubscriptionStatus::Paid
}

/// Role gate for creator-only operations.
pub fn require_role(identity: &Identity, allowed: &[Role]) -> Result<(), ApiError> {
    if identity.role == Role::Admin || allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Turn a decision into a handler result; `Redact` is not a failure.
pub fn enforce(decision: Decision) -> Result<(), ApiError> {
    match decision {
        Decision::Deny => Err(ApiError::Forbidden),
        Decision::Allow | Decision::Redact => Ok(()),
    }
}

fn is_publisher(role: Role) -> bool {
    matches!(role, Role::Creator | Role::Admin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str, role: Role, status: SubscriptionStatus) -> Identity {
        Identity {
            id: id.to_string(),
            role,
            subscription_status: status,
        }
    }

    #[test]
    fn test_ownership_rule() {
        let author = identity("a", Role::Creator, SubscriptionStatus::Free);
        let other = identity("b", Role::Creator, SubscriptionStatus::Paid);
        let admin = identity("root", Role::Admin, SubscriptionStatus::Free);
        let post = Resource::authored("a", false);

        for action in [Action::Update, Action::Delete] {
            assert_eq!(authorize(Some(&author), &post, action), Decision::Allow);
            assert_eq!(authorize(Some(&other), &post, action), Decision::Deny);
            assert_eq!(authorize(Some(&admin), &post, action), Decision::Allow);
            assert_eq!(authorize(None, &post, action), Decision::Deny);
        }
    }

    #[test]
    fn test_role_gate() {
        let subscriber = identity("s", Role::Subscriber, SubscriptionStatus::Paid);
        let creator = identity("c", Role::Creator, SubscriptionStatus::Free);
        let admin = identity("root", Role::Admin, SubscriptionStatus::Free);

        let target = Resource::unowned();
        assert_eq!(authorize(Some(&subscriber), &target, Action::Create), Decision::Deny);
        assert_eq!(authorize(Some(&creator), &target, Action::Create), Decision::Allow);
        assert_eq!(authorize(Some(&admin), &target, Action::ViewAudience), Decision::Allow);
        assert_eq!(authorize(None, &target, Action::ViewAudience), Decision::Deny);

        assert!(require_role(&creator, &[Role::Creator]).is_ok());
        assert!(require_role(&admin, &[Role::Creator]).is_ok());
        assert!(matches!(
            require_role(&subscriber, &[Role::Creator]),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn test_premium_gate() {
        let premium = Resource::authored("a", true);
        let free_reader = identity("r", Role::Subscriber, SubscriptionStatus::Free);
        let paid_reader = identity("p", Role::Subscriber, SubscriptionStatus::Paid);
        let author = identity("a", Role::Subscriber, SubscriptionStatus::Free);
        let other_creator = identity("c", Role::Creator, SubscriptionStatus::Free);

        assert_eq!(authorize(None, &premium, Action::Read), Decision::Redact);
        assert_eq!(authorize(Some(&free_reader), &premium, Action::Read), Decision::Redact);
        assert_eq!(authorize(Some(&paid_reader), &premium, Action::Read), Decision::Allow);
        assert_eq!(authorize(Some(&author), &premium, Action::Read), Decision::Allow);
        assert_eq!(authorize(Some(&other_creator), &premium, Action::Read), Decision::Allow);
    }

    #[test]
    fn test_free_content_is_public() {
        let free_post = Resource::authored("a", false);
        assert_eq!(authorize(None, &free_post, Action::Read), Decision::Allow);
    }

    #[test]
    fn test_enforce() {
        assert!(enforce(Decision::Allow).is_ok());
        assert!(enforce(Decision::Redact).is_ok());
        assert!(matches!(enforce(Decision::Deny), Err(ApiError::Forbidden)));
    }
}
