use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    config::TidalSettings,
    error::{AuthError, ProviderError},
    providers::http,
    types::{ProviderKind, Token},
};

const PROVIDER: ProviderKind = ProviderKind::Tidal;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user_id: Option<Value>,
    user: Option<TokenUser>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    #[serde(rename = "userId")]
    user_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(rename = "userId")]
    user_id: Option<Value>,
}

/// A token together with the account it belongs to, when the response names it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserLogin {
    pub token: Token,
    pub user_id: Option<String>,
}

/// Obtains an application token with the OAuth2 client-credentials grant.
pub async fn client_credentials(
    client: &Client,
    settings: &TidalSettings,
) -> Result<Token, AuthError> {
    let request = client
        .post(token_url(settings)?)
        .basic_auth(&settings.client_id, Some(&settings.client_secret))
        .form(&[("grant_type", "client_credentials")]);

    let body = send(request).await?;
    Ok(parse_token_response(&body)?.token)
}

/// The login page for the PKCE authorization code flow.
pub fn authorize_url(settings: &TidalSettings, code_challenge: &str) -> Result<Url, ProviderError> {
    let mut url = http::endpoint(PROVIDER, &settings.login_url, &["authorize"])?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &settings.client_id)
        .append_pair("redirect_uri", &settings.redirect_uri)
        .append_pair("scope", &settings.scope)
        .append_pair("code_challenge_method", "S256")
        .append_pair("code_challenge", code_challenge);
    Ok(url)
}

/// Exchanges an authorization code and its PKCE verifier for a user token.
pub async fn exchange_code(
    client: &Client,
    settings: &TidalSettings,
    code: &str,
    verifier: &str,
) -> Result<UserLogin, AuthError> {
    let request = client.post(token_url(settings)?).form(&[
        ("grant_type", "authorization_code"),
        ("client_id", settings.client_id.as_str()),
        ("code", code),
        ("redirect_uri", settings.redirect_uri.as_str()),
        ("code_verifier", verifier),
    ]);

    let body = send(request).await?;
    parse_token_response(&body)
}

/// Renews a user token. Tidal may not rotate the refresh token, in which case
/// the current one is kept.
pub async fn refresh_token(
    client: &Client,
    settings: &TidalSettings,
    refresh_token: &str,
) -> Result<UserLogin, AuthError> {
    let request = client.post(token_url(settings)?).form(&[
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", settings.client_id.as_str()),
        ("client_secret", settings.client_secret.as_str()),
    ]);

    let body = send(request).await?;
    let mut login = parse_token_response(&body)?;
    if login.token.refresh_token.is_none() {
        login.token.refresh_token = Some(refresh_token.to_string());
    }
    Ok(login)
}

/// Looks up the account a user token belongs to, for token responses that
/// do not name it.
pub async fn session_user_id(
    client: &Client,
    settings: &TidalSettings,
    access_token: &str,
) -> Result<String, AuthError> {
    let request = client
        .get(http::endpoint(PROVIDER, &settings.api_url, &["sessions"])?)
        .bearer_auth(access_token);

    let body = http::send_for_text(PROVIDER, request).await?;
    parse_session_response(&body)
}

pub fn parse_session_response(body: &str) -> Result<String, AuthError> {
    let session: SessionResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::malformed(PROVIDER, "sessions", e, body))?;

    session.user_id.as_ref().and_then(id_string).ok_or_else(|| AuthError::Rejected {
        provider: PROVIDER,
        reason: "the session names no user".to_string(),
    })
}

pub fn parse_token_response(body: &str) -> Result<UserLogin, AuthError> {
    let response: TokenResponse = serde_json::from_str(body).map_err(|e| AuthError::Rejected {
        provider: PROVIDER,
        reason: format!("unreadable token response ({e}): {body}"),
    })?;

    let Some(access_token) = response.access_token.filter(|t| !t.is_empty()) else {
        let reason = response
            .error_description
            .or(response.error)
            .unwrap_or_else(|| "no access token in response".to_string());
        return Err(AuthError::Rejected {
            provider: PROVIDER,
            reason,
        });
    };

    let user_id = response
        .user_id
        .as_ref()
        .or(response.user.as_ref().and_then(|u| u.user_id.as_ref()))
        .and_then(id_string);

    Ok(UserLogin {
        token: Token::from_expires_in(access_token, response.refresh_token, response.expires_in),
        user_id,
    })
}

fn token_url(settings: &TidalSettings) -> Result<Url, ProviderError> {
    http::endpoint(PROVIDER, &settings.auth_url, &["oauth2", "token"])
}

/// Sends a token request; a refusal by the token endpoint becomes
/// [`AuthError::Rejected`] rather than a provider error.
async fn send(request: reqwest::RequestBuilder) -> Result<String, AuthError> {
    match http::send_for_text(PROVIDER, request).await {
        Ok(body) => Ok(body),
        Err(ProviderError::HttpStatus { body, .. }) => Err(AuthError::Rejected {
            provider: PROVIDER,
            reason: body,
        }),
        Err(ProviderError::AuthExpired { .. }) => Err(AuthError::Rejected {
            provider: PROVIDER,
            reason: "client credentials were refused".to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
