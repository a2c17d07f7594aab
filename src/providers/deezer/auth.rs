use reqwest::{Client, Url};
use serde_json::Value;

use crate::{
    config::DeezerSettings,
    error::{AuthError, ProviderError},
    providers::http,
    types::{ProviderKind, Token},
};

const PROVIDER: ProviderKind = ProviderKind::Deezer;

/// Permissions requested from the user. `offline_access` yields a token that
/// does not expire.
pub const PERMISSIONS: &str = "basic_access,email,manage_library,offline_access";

/// The page the operator opens to grant radiosync access.
pub fn authorize_url(settings: &DeezerSettings) -> Result<Url, ProviderError> {
    let mut url = http::endpoint(PROVIDER, &settings.connect_url, &["oauth", "auth.php"])?;
    url.query_pairs_mut()
        .append_pair("app_id", &settings.app_id)
        .append_pair("redirect_uri", &settings.redirect_uri)
        .append_pair("perms", PERMISSIONS);
    Ok(url)
}

/// Exchanges the authorization code pasted by the operator for a token.
pub async fn exchange_code(
    client: &Client,
    settings: &DeezerSettings,
    code: &str,
) -> Result<Token, AuthError> {
    let url = http::endpoint(
        PROVIDER,
        &settings.connect_url,
        &["oauth", "access_token.php"],
    )?;
    let request = client.get(url).query(&[
        ("app_id", settings.app_id.as_str()),
        ("secret", settings.app_secret.as_str()),
        ("code", code),
        ("output", "json"),
    ]);

    let body = http::send_for_text(PROVIDER, request).await?;
    parse_token_response(&body)
}

/// Reads `{"access_token": "...", "expires": N}`; `expires` of `0` means the
/// token never expires. Deezer answers an invalid code with plain text.
pub fn parse_token_response(body: &str) -> Result<Token, AuthError> {
    let rejected = || AuthError::Rejected {
        provider: PROVIDER,
        reason: body.trim().to_string(),
    };

    let json: Value = serde_json::from_str(body).map_err(|_| rejected())?;
    let access_token = json["access_token"]
        .as_str()
        .filter(|t| !t.is_empty())
        .ok_or_else(rejected)?
        .to_string();

    let expires_in = match &json["expires"] {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    };

    Ok(Token::from_expires_in(access_token, None, expires_in))
}
