/// Verification commands - IO the flow must perform after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationCommand {
    /// Drop leftover handles, render a bot filter and ask the provider for a challenge
    IssueChallenge,

    /// Send the submitted code to the provider
    ConfirmCode,

    /// Dispose of the bot-filter widget
    ReleaseBotFilter,

    /// Forget the challenge handle; it can no longer be confirmed
    DiscardChallenge,

    /// Release the widget and forget the challenge
    ReleaseAll,

    /// Tell the owning form the number is verified
    NotifyVerified,
}
