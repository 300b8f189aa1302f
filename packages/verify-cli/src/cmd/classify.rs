//! Provider error classification lookups

use console::style;
use phone_verify::classify::known_codes;
use phone_verify::{classify, ProviderOperation};

pub fn run_classify(code: &str) {
    for operation in [ProviderOperation::Issue, ProviderOperation::Confirm] {
        let error = classify(operation, code);
        println!(
            "{:<8} {} → {:?}  {}",
            format!("{operation:?}"),
            style(code).cyan(),
            style(error).bold(),
            style(error.user_message()).dim()
        );
    }
}

pub fn run_codes() {
    for operation in [ProviderOperation::Issue, ProviderOperation::Confirm] {
        println!("{}", style(format!("{operation:?}")).bold().underlined());
        for (code, error) in known_codes(operation) {
            println!("  {:<28} {:?}", code, error);
        }
        println!("  {:<28} {:?}", "(anything else)", phone_verify::VerificationError::Unknown);
        println!();
    }
}
