//! Review prompt construction.
//!
//! A single set of reviewer instructions is used for both call shapes: the
//! system+user message pair sent by [`crate::chat::OpenAiCompatibleClient::review_diff`]
//! and the single joined prompt sent through [`crate::chat::ChatProvider::chat`].

/// Reviewer instructions sent as the system message.
pub const SYSTEM_PROMPT: &str = "\
You are a senior Rust engineer who writes readable, maintainable and robust Rust.
Act as a code review assistant and review the given git diff strictly, focusing on:

1. Safety and security:
   - Is input validated sufficiently?
   - Are there injection risks, out-of-bounds access, data races or unsound `unsafe`?
   - Could secrets (keys, tokens, passwords) leak?

2. Error handling:
   - Are errors ignored, swallowed, or hidden behind `unwrap`/`expect`?
   - Are error messages clear enough to locate the problem?
   - Is context added when errors are propagated, and is logging appropriate?

3. Performance and resource usage:
   - Are the algorithms and data structures appropriate?
   - Are there needless allocations, clones or repeated work?
   - Could I/O, networking or concurrency become a bottleneck?

Reply in Markdown using this structure:

## Overall assessment
- A short verdict on the quality of this change.

## Main risks and issues
- Issues ordered by severity, quoting the relevant code or line numbers from the diff.

## Suggestions
- Concrete improvements for safety, error handling and performance.

## Strengths
- Parts of the change worth keeping.

Reply with the review only; do not repeat the diff.";

/// Wraps the diff in the user-message request.
pub fn user_prompt(diff: &str) -> String {
    format!(
        "Review the following git diff (read-only, do not produce a patch) and return a \
         Markdown review following the instructions above:\n\n```diff\n{}\n```",
        diff.trim()
    )
}

/// Returns the `(system, user)` message pair for a review-specific chat call.
pub fn review_messages(diff: &str) -> (&'static str, String) {
    (SYSTEM_PROMPT, user_prompt(diff))
}

/// Builds the full single-message review prompt for `diff`.
///
/// The instructions come first, followed by a blank line and the user request
/// with the diff in a fenced `diff` block.
pub fn build_review_prompt(diff: &str) -> String {
    let (system, user) = review_messages(diff);
    format!("{system}\n\n{user}")
}
