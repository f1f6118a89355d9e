//! Input budgeting for the generation call.
//!
//! The backend's context window covers system prompt + user prompt + output.
//! We reserve a quarter of the window for output and trim the user prompt to
//! whatever remains after the system prompt, cutting at a word boundary. The
//! system prompt is only truncated when it alone exceeds the input budget.

/// Rough chars-per-token ratio for budget arithmetic. Conservative for
/// mixed Latin/Cyrillic corpora.
const CHARS_PER_TOKEN: usize = 3;

/// Fraction of the context window reserved for model output, in percent.
const OUTPUT_RESERVE_PCT: usize = 25;

#[derive(Debug, Clone, Copy)]
pub struct ContextBudget {
    input_chars: usize,
}

impl ContextBudget {
    pub fn for_window(context_window_tokens: u32) -> Self {
        let input_tokens =
            context_window_tokens as usize * (100 - OUTPUT_RESERVE_PCT) / 100;
        Self {
            input_chars: input_tokens * CHARS_PER_TOKEN,
        }
    }

    /// Max output tokens implied by the reserve.
    pub fn output_tokens(context_window_tokens: u32) -> u32 {
        context_window_tokens * OUTPUT_RESERVE_PCT as u32 / 100
    }

    /// Fit `(system, user)` into the input budget. The user prompt is cut
    /// first; the system prompt is touched only when it alone overflows.
    pub fn fit<'a>(&self, system: &'a str, user: &'a str) -> (String, String) {
        if system.len() + user.len() <= self.input_chars {
            return (system.to_string(), user.to_string());
        }

        if system.len() >= self.input_chars {
            // Degenerate case: the system prompt alone blows the budget.
            let system = truncate_at_word(system, self.input_chars);
            return (system, String::new());
        }

        let user_budget = self.input_chars - system.len();
        (system.to_string(), truncate_at_word(user, user_budget))
    }
}

/// Cut `text` to at most `max_chars` bytes of ASCII-safe prefix, preferring
/// the last whitespace before the limit. Always lands on a char boundary.
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text.to_string();
    }
    let mut cut = max_chars;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let prefix = &text[..cut];
    match prefix.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => prefix[..pos].trim_end().to_string(),
        _ => prefix.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_prompts_pass_untouched() {
        let budget = ContextBudget::for_window(8192);
        let (s, u) = budget.fit("system", "user text");
        assert_eq!(s, "system");
        assert_eq!(u, "user text");
    }

    #[test]
    fn user_prompt_is_cut_before_system() {
        let budget = ContextBudget { input_chars: 100 };
        let system = "s".repeat(40);
        let user = format!("{} tail", "word ".repeat(30));
        let (s, u) = budget.fit(&system, &user);
        assert_eq!(s, system);
        assert!(u.len() <= 60);
        assert!(!u.is_empty());
    }

    #[test]
    fn oversized_system_prompt_is_truncated_alone() {
        let budget = ContextBudget { input_chars: 50 };
        let system = "word ".repeat(30);
        let (s, u) = budget.fit(&system, "user");
        assert!(s.len() <= 50);
        assert!(u.is_empty());
    }

    #[test]
    fn truncation_prefers_word_boundary() {
        let cut = truncate_at_word("alpha beta gamma", 12);
        assert_eq!(cut, "alpha beta");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // Cyrillic is two bytes per char; a naive byte slice would panic.
        let text = "привет мир как дела";
        let cut = truncate_at_word(text, 15);
        assert!(cut.len() <= 15);
        assert!(text.starts_with(&cut));
    }

    #[test]
    fn output_reserve_is_a_quarter() {
        assert_eq!(ContextBudget::output_tokens(8192), 2048);
    }
}
