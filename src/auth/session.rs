//! Sign-in, sign-out and session-expiry handling

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiError, ApiRequest};

use super::Credential;

/// Where the user is sent once the session cannot be renewed.
pub const LOGIN_ROUTE: &str = "/login";

const LOGIN_PATH: &str = "/auth/login";

/// Receives the unauthenticated entry point when the session ends.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

/// Terminal rendition of the redirect: tell the user to sign in again.
pub struct LoginPrompt;

impl Navigator for LoginPrompt {
    fn redirect(&self, route: &str) {
        tracing::warn!("Session expired ({}). Run 'pplip login' to sign in again.", route);
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
}

/// Exchange email and password for an access token and store it, along with
/// the refresh cookie the server sets.
pub async fn sign_in(client: &ApiClient, email: &str, password: &str) -> Result<Credential, ApiError> {
    let request = ApiRequest::post(LOGIN_PATH)
        .json(&LoginRequest { email, password })?
        .skip_refresh();
    let response: LoginResponse = client.send_as(request).await?;

    client.credentials().set(&response.access_token);
    client.save_session_cookies();
    client
        .credentials()
        .get()
        .ok_or_else(|| ApiError::Decode("login returned an empty access token".to_string()))
}

/// Log in with email/password, or store a token obtained elsewhere.
pub async fn login(
    client: &ApiClient,
    email: Option<&str>,
    password: Option<&str>,
    token: Option<&str>,
) -> Result<()> {
    let credential = match (token, email, password) {
        (Some(token), _, _) => {
            client.credentials().set(token);
            client
                .credentials()
                .get()
                .context("Refusing to store an empty token")?
        }
        (None, Some(email), Some(password)) => sign_in(client, email, password)
            .await
            .context("Login failed")?,
        _ => anyhow::bail!("Provide --email and --password, or --token"),
    };

    println!("Logged in.");
    if let Some(role) = credential.role {
        println!("Role: {}", role);
    }
    Ok(())
}

/// Forget the stored credential and refresh cookie.
pub async fn logout(client: &ApiClient) -> Result<()> {
    client.credentials().clear();
    println!("Logged out.");
    Ok(())
}

pub async fn status(client: &ApiClient) -> Result<()> {
    match client.credentials().get() {
        Some(credential) => {
            println!("Logged in.");
            println!("Role: {}", credential.role.as_deref().unwrap_or("(unknown)"));
            println!(
                "Refresh cookie: {}",
                if client.credentials().session_cookies().is_some() {
                    "stored"
                } else {
                    "none"
                }
            );
        }
        None => println!("Not logged in. Run 'pplip login'."),
    }
    Ok(())
}
