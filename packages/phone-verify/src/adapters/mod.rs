pub mod headless;
pub mod twilio;

pub use self::headless::HeadlessBotFilter;
pub use self::twilio::TwilioChallengeProvider;
