//! Login and credential reference command handlers.

use anyhow::{Context, Result};

use opsdeck::auth::write_reference;

use super::common::{build_digest, build_verifier, load_config, prompt, read_line, read_secret};
use super::AuthAction;

/// Prompt for credentials and check them; exits 1 on rejection.
pub(crate) async fn cmd_login() -> Result<()> {
    let config = load_config()?;
    let verifier = build_verifier(&config)?;

    prompt("Username: ")?;
    let identity = read_line()?;
    prompt("Password: ")?;
    let secret = read_secret()?;

    let outcome = verifier.verify(&identity, &secret).with_context(|| {
        format!(
            "Failed to read reference file {}",
            verifier.reference_path().display()
        )
    })?;

    println!("{}", outcome.message());
    if !outcome.is_authenticated() {
        std::process::exit(1);
    }
    Ok(())
}

pub(crate) async fn cmd_auth(action: AuthAction) -> Result<()> {
    let config = load_config()?;
    match action {
        AuthAction::Enroll => {
            let digest = build_digest(&config)?;
            let path = config.auth.reference_path();

            prompt("Username: ")?;
            let identity = read_line()?;
            prompt("Password: ")?;
            let secret = read_secret()?;
            prompt("Confirm password: ")?;
            let confirm = read_secret()?;
            if secret != confirm {
                anyhow::bail!("Passwords do not match");
            }

            write_reference(&path, &digest, &identity, &secret)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Credential reference written to {}", path.display());
        }
        AuthAction::Digest { text } => {
            let digest = build_digest(&config)?;
            println!("{}", digest.transform(&text));
        }
    }
    Ok(())
}
