//! Interactive send → confirm → resend loop against Twilio Verify

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use phone_verify::adapters::{HeadlessBotFilter, TwilioChallengeProvider};
use phone_verify::config::twilio_options_from_env;
use phone_verify::{PhoneVerificationFlow, VerificationError, VerificationState, VerifyConfig};
use tracing::{debug, warn};
use twilio::TwilioService;

pub async fn run(raw_phone: &str) -> Result<()> {
    let config = VerifyConfig::from_env().context("Failed to load verification config")?;
    let twilio = twilio_options_from_env().context("Failed to load Twilio credentials")?;

    let flow = PhoneVerificationFlow::new(
        Arc::new(TwilioChallengeProvider::new(Arc::new(TwilioService::new(
            twilio,
        )))),
        Arc::new(HeadlessBotFilter::new()),
        config.clone(),
    )
    .with_on_verified(|phone| {
        println!("{}", format!("✅ {phone} verified").bright_green().bold());
    });

    let phone = flow.set_phone_number(raw_phone);
    println!(
        "{} +{} {}",
        "📱 Sending code to".bright_cyan(),
        config.country_code,
        phone
    );

    debug!(country_code = %config.country_code, "Starting verification session");
    let mut result = flow.send_challenge().await;
    loop {
        if let Err(err) = result {
            warn!(?err, state = ?flow.state(), "Verification step failed");
            if err == VerificationError::InvalidPhoneNumber {
                anyhow::bail!("{}", err.user_message());
            }
            println!("{} {}", "⚠️ ".yellow(), err.user_message());
            match next_step(flow.state())? {
                NextStep::Resend => {
                    result = flow.resend().await;
                    continue;
                }
                NextStep::EnterCode => {}
                NextStep::Quit => break,
            }
        }

        if flow.state() == VerificationState::Verified {
            break;
        }

        let code: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Enter the 6-digit code")
            .interact_text()?;

        result = flow.submit_code(code.trim()).await;
    }

    let verified = flow.verified_number();
    flow.teardown();
    if verified.is_none() {
        anyhow::bail!("phone number was not verified");
    }
    Ok(())
}

enum NextStep {
    Resend,
    EnterCode,
    Quit,
}

fn next_step(state: VerificationState) -> Result<NextStep> {
    let mut options = vec![("🔁 Resend code", NextStep::Resend)];
    if state.accepts_code() {
        options.push(("✏️  Enter code again", NextStep::EnterCode));
    }
    options.push(("🛑 Quit", NextStep::Quit));

    let labels: Vec<&str> = options.iter().map(|(label, _)| *label).collect();
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(options.swap_remove(choice).1)
}
