use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use crate::models::TokenType;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest,
    dev::Payload,
    error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized},
    web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,

    /// Present only if this user has an intern profile
    pub intern_id: Option<u64>,
}

fn from_header(req: &HttpRequest) -> Result<AuthUser, actix_web::Error> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ErrorUnauthorized("Missing token"))?;

    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| ErrorInternalServerError("Config missing"))?;

    let claims =
        verify_token(token, &config.jwt_secret).map_err(|_| ErrorUnauthorized("Invalid token"))?;

    if claims.token_type != TokenType::Access {
        return Err(ErrorUnauthorized("Access token required"));
    }

    let role = Role::from_id(claims.role).ok_or_else(|| ErrorUnauthorized("Invalid role"))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        email: claims.sub,
        role,
        intern_id: claims.intern_id,
    })
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // The middleware has usually decoded the token already
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        ready(from_header(req))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ErrorForbidden("Admin only"))
        }
    }

    /// Admin, supervisor or handler.
    pub fn require_staff(&self) -> actix_web::Result<()> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(ErrorForbidden("Staff only"))
        }
    }

    pub fn is_intern(&self) -> bool {
        self.role == Role::Intern
    }

    /// Staff may act on any intern, an intern only on itself.
    pub fn require_intern_access(&self, intern_id: u64) -> actix_web::Result<()> {
        if self.role.is_staff() || self.intern_id == Some(intern_id) {
            Ok(())
        } else {
            Err(ErrorForbidden("Not allowed to access this intern"))
        }
    }

    /// Admins may act on any user, everyone else only on themselves.
    pub fn require_self_or_admin(&self, user_id: u64) -> actix_web::Result<()> {
        if self.role == Role::Admin || self.user_id == user_id {
            Ok(())
        } else {
            Err(ErrorForbidden("Not allowed to access this user"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, intern_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 12,
            email: "someone@company.ph".into(),
            role,
            intern_id,
        }
    }

    #[test]
    fn interns_only_reach_their_own_records() {
        let intern = user(Role::Intern, Some(7));
        assert!(intern.require_intern_access(7).is_ok());
        assert!(intern.require_intern_access(8).is_err());
        assert!(intern.require_staff().is_err());

        let handler = user(Role::Handler, None);
        assert!(handler.require_intern_access(8).is_ok());
        assert!(handler.require_admin().is_err());
    }

    #[test]
    fn self_or_admin() {
        assert!(user(Role::Supervisor, None).require_self_or_admin(12).is_ok());
        assert!(user(Role::Supervisor, None).require_self_or_admin(13).is_err());
        assert!(user(Role::Admin, None).require_self_or_admin(13).is_ok());
    }
}
