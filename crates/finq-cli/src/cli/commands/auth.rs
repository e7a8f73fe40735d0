//! Auth command handlers.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use finq_core::config::{Config, paths};
use finq_core::identity::{IdentityClient, hosted_ui};
use finq_core::session::{SessionStore, mask_token};

pub async fn login(config: &Config, username: &str, password: &str) -> Result<()> {
    let identity = IdentityClient::new(config.identity.clone());

    let session = identity
        .sign_in(username, password)
        .await
        .map_err(|e| anyhow::anyhow!("Sign-in failed: {e}"))?;

    SessionStore::new().save(true);

    let user_id = session.user_id.unwrap_or_default();
    println!("✓ Signed in as {}", mask_token(&user_id));
    println!(
        "  Credentials saved to: {}",
        paths::credentials_path().display()
    );
    Ok(())
}

pub async fn login_federated(config: &Config) -> Result<()> {
    let identity = IdentityClient::new(config.identity.clone());

    let pkce = hosted_ui::generate_pkce();
    let oauth_state = uuid::Uuid::new_v4().to_string();
    let auth_url = hosted_ui::build_auth_url(&config.identity, &pkce, &oauth_state);

    println!("To sign in with the hosted federated flow:");
    println!();
    println!("  1. A browser window will open (or visit the URL below)");
    println!("  2. Sign in with your identity provider and authorize access");
    println!("  3. Paste the callback URL or authorization code here");
    println!();
    println!("Authorization URL:");
    println!("  {auth_url}");
    println!();

    // Best effort, skipped in tests
    if std::env::var("FINQ_NO_BROWSER").is_err() {
        let _ = open::that(&auth_url);
    }

    print!("Paste callback URL (or authorization code): ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;

    let (code, provided_state) = hosted_ui::parse_callback_input(&input);
    if let Some(provided) = provided_state
        && provided != oauth_state
    {
        anyhow::bail!("State mismatch");
    }
    let code = code.ok_or_else(|| anyhow::anyhow!("Authorization code cannot be empty"))?;

    println!("Exchanging code for tokens...");
    let credentials = hosted_ui::exchange_code(&config.identity, &code, &pkce.verifier)
        .await
        .map_err(|e| anyhow::anyhow!("Token exchange failed: {e}"))?;

    identity.adopt_credentials(&credentials);
    SessionStore::new().save(true);

    println!();
    println!("✓ Signed in as {}", mask_token(&credentials.user_id));
    println!(
        "  Credentials saved to: {}",
        paths::credentials_path().display()
    );
    Ok(())
}

pub async fn logout(config: &Config) -> Result<()> {
    let identity = IdentityClient::new(config.identity.clone());

    // Remote revocation is best-effort; local state always clears
    let had_creds = identity.sign_out().await;
    SessionStore::new().clear();

    if had_creds {
        println!("✓ Signed out");
        println!(
            "  Credentials removed from: {}",
            paths::credentials_path().display()
        );
    } else {
        println!("Not signed in (no credentials found).");
    }
    Ok(())
}

pub async fn signup(config: &Config, email: &str, password: &str) -> Result<()> {
    let identity = IdentityClient::new(config.identity.clone());

    let pending = identity
        .sign_up(email, password)
        .await
        .map_err(|e| anyhow::anyhow!("Sign-up failed: {e}"))?;

    println!("✓ Account created (user: {})", pending.user_id);
    match pending.delivery {
        Some(destination) => println!("  Verification code sent to {destination}"),
        None => println!("  Check your email for the verification code"),
    }
    println!("  Confirm with: finq confirm --email {email} --code <CODE>");
    Ok(())
}

pub async fn confirm(config: &Config, email: &str, code: &str) -> Result<()> {
    let identity = IdentityClient::new(config.identity.clone());

    identity
        .confirm_sign_up(email, code)
        .await
        .map_err(|e| anyhow::anyhow!("Confirmation failed: {e}"))?;

    println!("✓ Account confirmed");
    println!("  Sign in with: finq login --username {email}");
    Ok(())
}

pub async fn status(config: &Config) -> Result<()> {
    let identity = IdentityClient::new(config.identity.clone());

    match identity.fetch_session().await {
        Ok(session) if session.authenticated => {
            let user_id = session.user_id.unwrap_or_default();
            println!("Signed in as {}", mask_token(&user_id));
            // Attributes are informational; a failure does not change status
            match identity.fetch_user_attributes().await {
                Ok(attrs) => {
                    if let Some(email) = attrs.get("email") {
                        println!("  Email: {email}");
                    }
                }
                Err(e) => tracing::debug!("Could not fetch user attributes: {e}"),
            }
        }
        Ok(_) | Err(_) => {
            println!("Not signed in.");
        }
    }
    Ok(())
}
