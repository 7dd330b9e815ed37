//! Token estimation for budget accounting

/// Characters per token in the estimate
pub const CHARS_PER_TOKEN: usize = 4;

/// Tokens added to every estimate for the completion and request framing
pub const REQUEST_OVERHEAD_TOKENS: u64 = 200;

/// Estimate the tokens a call with `prompt` will consume
///
/// # Examples
///
/// ```
/// use verity_scheduler::estimate_tokens;
///
/// assert_eq!(estimate_tokens(""), 200);
/// assert_eq!(estimate_tokens("abcdefgh"), 202);
/// ```
pub fn estimate_tokens(prompt: &str) -> u64 {
    prompt.chars().count().div_ceil(CHARS_PER_TOKEN) as u64 + REQUEST_OVERHEAD_TOKENS
}
