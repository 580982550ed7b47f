use std::sync::Arc;

use llmgw_common::error::AuthFailure;
use llmgw_domain::{IdentityRepository, TokenRepository, User};
use time::OffsetDateTime;
use tracing::warn;

use crate::hash;

/// Verifies a presented token against the token store via a two-stage
/// lookup (cheap indexed prefix digest, then one expensive password-hash
/// verification), bounding cost per request to a single expensive hash
/// while avoiding plaintext storage.
pub struct TokenAuthenticator {
    tokens: Arc<dyn TokenRepository>,
    identities: Arc<dyn IdentityRepository>,
    prefix_length: usize,
}

impl TokenAuthenticator {
    pub fn new(
        tokens: Arc<dyn TokenRepository>,
        identities: Arc<dyn IdentityRepository>,
        prefix_length: usize,
    ) -> Self {
        Self {
            tokens,
            identities,
            prefix_length,
        }
    }

    pub async fn authenticate(&self, raw_token: &str) -> Result<User, AuthFailure> {
        let prefix = hash::prefix_hash(raw_token, self.prefix_length)
            .ok_or(AuthFailure::InvalidToken)?;

        let record = self
            .tokens
            .get_by_prefix_hash(&prefix)
            .await
            .map_err(|_| AuthFailure::InvalidToken)?;

        if OffsetDateTime::now_utc() > record.expires_at {
            return Err(AuthFailure::TokenExpired);
        }

        if !hash::verify_token(raw_token, &record.token_hash) {
            return Err(AuthFailure::InvalidToken);
        }

        let tokens = self.tokens.clone();
        let token_id = record.id;
        tokio::spawn(async move {
            if let Err(err) = tokens.touch_last_used(token_id, OffsetDateTime::now_utc()).await {
                warn!(token_id, error = %err, "failed to update token last_used_at");
            }
        });

        self.identities
            .get_user(record.user_id)
            .await
            .map_err(|_| AuthFailure::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llmgw_common::RepoError;
    use llmgw_domain::{ApiToken, AuthProviderKind, Organization};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use time::Duration;

    #[derive(Default)]
    struct FakeTokens {
        by_prefix: Mutex<HashMap<String, ApiToken>>,
    }

    #[async_trait]
    impl TokenRepository for FakeTokens {
        async fn create(&self, token: ApiToken) -> Result<ApiToken, RepoError> {
            self.by_prefix.lock().insert(token.prefix_hash.clone(), token.clone());
            Ok(token)
        }
        async fn get_by_prefix_hash(&self, prefix_hash: &str) -> Result<ApiToken, RepoError> {
            self.by_prefix
                .lock()
                .get(prefix_hash)
                .cloned()
                .ok_or(RepoError::NotFound)
        }
        async fn get(&self, id: i64) -> Result<ApiToken, RepoError> {
            self.by_prefix
                .lock()
                .values()
                .find(|t| t.id == id)
                .cloned()
                .ok_or(RepoError::NotFound)
        }
        async fn list_for_user(&self, _user_id: i64) -> Result<Vec<ApiToken>, RepoError> {
            Ok(self.by_prefix.lock().values().cloned().collect())
        }
        async fn touch_last_used(&self, _id: i64, _at: OffsetDateTime) -> Result<(), RepoError> {
            Ok(())
        }
        async fn revoke(&self, id: i64) -> Result<(), RepoError> {
            self.by_prefix.lock().retain(|_, t| t.id != id);
            Ok(())
        }
    }

    struct FakeIdentities {
        user: User,
    }

    #[async_trait]
    impl IdentityRepository for FakeIdentities {
        async fn create_user(&self, user: User) -> Result<User, RepoError> {
            Ok(user)
        }
        async fn get_user(&self, id: i64) -> Result<User, RepoError> {
            if id == self.user.id {
                Ok(self.user.clone())
            } else {
                Err(RepoError::NotFound)
            }
        }
        async fn get_user_by_email(&self, _email: &str) -> Result<User, RepoError> {
            Ok(self.user.clone())
        }
        async fn get_user_by_external_id(
            &self,
            _provider: AuthProviderKind,
            _external_id: &str,
        ) -> Result<User, RepoError> {
            Ok(self.user.clone())
        }
        async fn list_users_by_organization(&self, _org_id: i64) -> Result<Vec<User>, RepoError> {
            Ok(vec![self.user.clone()])
        }
        async fn update_user(&self, user: User) -> Result<User, RepoError> {
            Ok(user)
        }
        async fn delete_user(&self, _id: i64) -> Result<(), RepoError> {
            Ok(())
        }
        async fn create_organization(&self, org: Organization) -> Result<Organization, RepoError> {
            Ok(org)
        }
        async fn get_organization(&self, _id: i64) -> Result<Organization, RepoError> {
            Err(RepoError::NotFound)
        }
        async fn get_organization_by_name(&self, _name: &str) -> Result<Organization, RepoError> {
            Err(RepoError::NotFound)
        }
        async fn list_organizations(&self) -> Result<Vec<Organization>, RepoError> {
            Ok(vec![])
        }
        async fn update_organization(&self, org: Organization) -> Result<Organization, RepoError> {
            Ok(org)
        }
        async fn delete_organization(&self, _id: i64, _force: bool) -> Result<(), RepoError> {
            Ok(())
        }
        async fn organization_member_count(&self, _id: i64) -> Result<u64, RepoError> {
            Ok(0)
        }
    }

    fn sample_user() -> User {
        User {
            id: 1,
            email: "u1@example.com".to_string(),
            name: "U1".to_string(),
            organization_id: 1,
            external_id: None,
            provider: AuthProviderKind::None,
            system_admin: false,
            created_at: OffsetDateTime::now_utc(),
            last_login: None,
        }
    }

    async fn seed(raw: &str, expires_in: Duration) -> (Arc<FakeTokens>, Arc<FakeIdentities>) {
        let tokens = Arc::new(FakeTokens::default());
        let prefix = hash::prefix_hash(raw, 8).unwrap();
        let encoded = hash::hash_token(raw).unwrap();
        tokens
            .create(ApiToken {
                id: 1,
                user_id: 1,
                description: None,
                prefix_hash: prefix,
                token_hash: encoded,
                created_at: OffsetDateTime::now_utc(),
                expires_at: OffsetDateTime::now_utc() + expires_in,
                last_used_at: None,
            })
            .await
            .unwrap();
        let identities = Arc::new(FakeIdentities { user: sample_user() });
        (tokens, identities)
    }

    #[tokio::test]
    async fn happy_path_resolves_same_user_repeatedly() {
        let raw = hash::generate_raw_token();
        let (tokens, identities) = seed(&raw, Duration::hours(1)).await;
        let auth = TokenAuthenticator::new(tokens, identities, 8);
        let u1 = auth.authenticate(&raw).await.unwrap();
        let u2 = auth.authenticate(&raw).await.unwrap();
        assert_eq!(u1.id, u2.id);
    }

    #[tokio::test]
    async fn one_bit_mutation_is_invalid() {
        let raw = hash::generate_raw_token();
        let (tokens, identities) = seed(&raw, Duration::hours(1)).await;
        let auth = TokenAuthenticator::new(tokens, identities, 8);
        let mut bytes = raw.into_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = String::from_utf8(bytes).unwrap();
        let err = auth.authenticate(&tampered).await.unwrap_err();
        assert_eq!(err, AuthFailure::InvalidToken);
    }

    #[tokio::test]
    async fn expired_token_fails() {
        let raw = hash::generate_raw_token();
        let (tokens, identities) = seed(&raw, Duration::seconds(-1)).await;
        let auth = TokenAuthenticator::new(tokens, identities, 8);
        let err = auth.authenticate(&raw).await.unwrap_err();
        assert_eq!(err, AuthFailure::TokenExpired);
    }
}
