use crate::error::StoreError;
use async_trait::async_trait;
use model::job::Environment;

/// Opaque authenticated session against one environment. Handles are passed
/// by value into each stage that needs one; there is no ambient credential
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub environment: String,
    pub principal: String,
}

/// Establishes sessions against named environments.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn establish_session(&self, env: &Environment) -> Result<SessionHandle, StoreError>;
}

/// Session factory backed by the environment's own property bag: the
/// `principal` property names the identity, defaulting to the environment
/// name. Suitable for local bindings; real deployments substitute their own
/// factory behind the same trait.
#[derive(Debug, Default)]
pub struct PropertySessionFactory;

#[async_trait]
impl SessionFactory for PropertySessionFactory {
    async fn establish_session(&self, env: &Environment) -> Result<SessionHandle, StoreError> {
        if env.name.trim().is_empty() {
            return Err(StoreError::Session("environment has no name".to_string()));
        }
        let principal = env
            .property("principal")
            .unwrap_or(env.name.as_str())
            .to_string();
        Ok(SessionHandle {
            environment: env.name.clone(),
            principal,
        })
    }
}
