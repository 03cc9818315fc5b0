use serde::{Deserialize, Serialize};

/// Claims of a token issued by the external identity provider. The subject is
/// the user's email, which also keys the profile store.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user email
    pub exp: usize,  // expiration time
    pub iat: usize,  // issued at
    pub iss: String, // issuer
    pub aud: String, // audience
}
