use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::{entities::token::Claims, errors::AuthError};

/// The verified admin behind a request.
///
/// `AuthMiddleware` decodes the token and leaves the claims in the request
/// extensions; this only reads them back. No claims means 401, claims without
/// the admin flag mean 403.
#[derive(Debug)]
pub struct AdminClaims(pub Claims);

impl AdminClaims {
    pub fn username(&self) -> &str {
        &self.0.sub
    }
}

fn admin_claims(req: &HttpRequest) -> Result<AdminClaims, AuthError> {
    let extensions = req.extensions();
    let claims = extensions.get::<Claims>().ok_or(AuthError::MissingCredentials)?;

    if !claims.admin {
        return Err(AuthError::Forbidden("Admin access required".into()));
    }

    Ok(AdminClaims(claims.clone()))
}

impl FromRequest for AdminClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(admin_claims(req).map_err(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn claims(admin: bool) -> Claims {
        Claims { sub: "admin".into(), admin, exp: 0, iat: 0 }
    }

    #[test]
    fn admin_claims_are_extracted() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(claims(true));

        assert_eq!(admin_claims(&req).unwrap().username(), "admin");
    }

    #[test]
    fn missing_claims_are_unauthorized() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(admin_claims(&req), Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn non_admin_claims_are_forbidden() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(claims(false));

        assert!(matches!(admin_claims(&req), Err(AuthError::Forbidden(_))));
    }
}
