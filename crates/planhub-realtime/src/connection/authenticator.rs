//! Handshake authentication for the in-band `authenticate` message.

use std::sync::Arc;

use planhub_auth::jwt::JwtDecoder;
use planhub_core::error::AppError;
use planhub_core::types::id::UserId;
use planhub_database::repositories::UserRepository;
use planhub_entity::user::User;

/// Resolves the user named in an `authenticate` message.
#[derive(Clone)]
pub struct HandshakeAuthenticator {
    /// User lookup.
    users: Arc<dyn UserRepository>,
    /// JWT decoder.
    decoder: Arc<JwtDecoder>,
    /// Whether a token must accompany the claimed user id.
    require_token: bool,
}

impl std::fmt::Debug for HandshakeAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeAuthenticator")
            .field("require_token", &self.require_token)
            .finish()
    }
}

impl HandshakeAuthenticator {
    /// Creates a new handshake authenticator.
    pub fn new(
        users: Arc<dyn UserRepository>,
        decoder: Arc<JwtDecoder>,
        require_token: bool,
    ) -> Self {
        Self {
            users,
            decoder,
            require_token,
        }
    }

    /// Check the claimed identity and load the user.
    ///
    /// With tokens enforced, the token's subject must equal `user_id`.
    pub async fn authenticate(
        &self,
        user_id: UserId,
        token: Option<&str>,
    ) -> Result<User, AppError> {
        if self.require_token {
            let token = token
                .filter(|t| !t.is_empty())
                .ok_or_else(|| AppError::authentication("Missing access token"))?;
            let claims = self.decoder.decode(token)?;
            if claims.user_id() != user_id {
                return Err(AppError::authentication(
                    "Token subject does not match user_id",
                ));
            }
        }

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::unknown_user(format!("User {user_id} does not exist")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planhub_auth::jwt::{JwtEncoder, TokenRole};
    use planhub_core::config::AuthConfig;
    use planhub_core::error::ErrorKind;
    use planhub_database::MemoryUserRepository;
    use planhub_entity::user::UserRole;

    async fn setup(require_token: bool) -> (HandshakeAuthenticator, JwtEncoder, User) {
        let config = AuthConfig::default();
        let users = Arc::new(MemoryUserRepository::new());
        let user = User::new("eli", UserRole::Member);
        users.insert(&user).await.unwrap();
        let auth = HandshakeAuthenticator::new(
            users,
            Arc::new(JwtDecoder::new(&config)),
            require_token,
        );
        (auth, JwtEncoder::new(&config), user)
    }

    #[tokio::test]
    async fn test_token_subject_must_match() {
        let (auth, encoder, user) = setup(true).await;

        let err = auth.authenticate(user.id, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);

        let (other, _) = encoder.issue(UserId::new(), TokenRole::Member, "x").unwrap();
        let err = auth.authenticate(user.id, Some(&other)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);

        let (own, _) = encoder.issue(user.id, TokenRole::Member, "eli").unwrap();
        assert_eq!(auth.authenticate(user.id, Some(&own)).await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_unknown_user_without_token_policy() {
        let (auth, _, user) = setup(false).await;
        assert!(auth.authenticate(user.id, None).await.is_ok());
        let err = auth.authenticate(UserId::new(), None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownUser);
    }
}
