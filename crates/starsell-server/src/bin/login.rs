//! Interactive session generator. Run once on a trusted machine, sign in
//! with the seller account, and copy the printed STARSELL_SESSION value
//! into the service environment. The server itself never signs in.

use anyhow::{Context, Result, bail};
use grammers_client::{Client, Config, InitParams, SignInError};
use grammers_session::Session;

use starsell_telegram::session::export_session;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let api_id: i32 = std::env::var("STARSELL_API_ID")
        .context("STARSELL_API_ID is not set")?
        .parse()
        .context("STARSELL_API_ID must be numeric")?;
    let api_hash = std::env::var("STARSELL_API_HASH").context("STARSELL_API_HASH is not set")?;

    let client = Client::connect(Config {
        session: Session::new(),
        api_id,
        api_hash,
        params: InitParams::default(),
    })
    .await
    .context("failed to connect to Telegram")?;

    if !client.is_authorized().await? {
        let phone = prompt("Enter your phone number (with country code): ")?;
        let token = client.request_login_code(phone.trim()).await?;
        let code = prompt("Enter the code you received: ")?;

        match client.sign_in(&token, code.trim()).await {
            Ok(user) => println!("Signed in as {}.", user.full_name()),
            Err(SignInError::PasswordRequired(password_token)) => {
                let hint = password_token.hint().unwrap_or("no hint");
                let password = prompt(&format!("Enter your 2FA password (hint: {hint}): "))?;
                let user = client
                    .check_password(password_token, password.trim())
                    .await
                    .context("2FA password rejected")?;
                println!("Signed in as {}.", user.full_name());
            }
            Err(e) => bail!("sign-in failed: {e}"),
        }
    }

    println!();
    println!("Add this to the service environment:");
    println!();
    println!("STARSELL_SESSION={}", export_session(&client));
    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    use std::io::{BufRead, Write};

    print!("{msg}");
    std::io::stdout().flush()?;
    let line = std::io::stdin()
        .lock()
        .lines()
        .next()
        .context("stdin closed")??;
    Ok(line)
}
