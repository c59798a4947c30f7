use uuid::Uuid;

use murmur_types::api::Claims;

/// Identity of the caller for a single request.
///
/// Built from claims the auth collaborator already validated; the core trusts
/// it as-is. Nothing in it outlives the request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub username: String,
}

impl RequestContext {
    pub fn new(user_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

impl From<&Claims> for RequestContext {
    fn from(claims: &Claims) -> Self {
        Self::new(claims.sub, claims.username.clone())
    }
}
