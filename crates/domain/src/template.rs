//! Literal placeholder substitution.
//!
//! Rendering is a plain global find-and-replace: each token is replaced in
//! every occurrence, one token at a time, in the order given. A token that
//! does not occur is not an error; the per-token counts let callers log it.

use serde::Serialize;

/// Number of occurrences replaced for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenReplacement {
    /// Placeholder token.
    pub token: Box<str>,
    /// Occurrences found when this token was processed.
    pub count: usize,
}

/// Output of [`render_placeholders`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    /// Rendered text.
    pub text: String,
    /// Replacement counts in processing order.
    pub replacements: Vec<TokenReplacement>,
}

impl RenderedTemplate {
    /// Total number of replacements across all tokens.
    #[must_use]
    pub fn total_replacements(&self) -> usize {
        self.replacements.iter().map(|entry| entry.count).sum()
    }

    /// Tokens that matched nothing.
    pub fn unmatched_tokens(&self) -> impl Iterator<Item = &str> {
        self.replacements
            .iter()
            .filter(|entry| entry.count == 0)
            .map(|entry| entry.token.as_ref())
    }
}

/// Replace every occurrence of each token with its value, sequentially.
///
/// Values are inserted verbatim. A value containing a later token will be
/// rewritten when that token is processed. Empty tokens are skipped.
pub fn render_placeholders<'a, I>(input: &str, substitutions: I) -> RenderedTemplate
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut text = input.to_owned();
    let mut replacements = Vec::new();

    for (token, value) in substitutions {
        let count = if token.is_empty() {
            0
        } else {
            text.matches(token).count()
        };
        if count > 0 {
            text = text.replace(token, value);
        }
        replacements.push(TokenReplacement {
            token: token.into(),
            count,
        });
    }

    RenderedTemplate { text, replacements }
}

/// Tokens from `tokens` that still occur in `text`.
pub fn remaining_tokens<'a>(text: &str, tokens: &[&'a str]) -> Vec<&'a str> {
    tokens
        .iter()
        .copied()
        .filter(|token| !token.is_empty() && text.contains(token))
        .collect()
}

/// Render `{name}` bindings into each argument of a command line.
///
/// Each argument is scanned once, left to right. Inserted values are never
/// rescanned, so a value containing `{nodes}` is passed through verbatim.
/// Unknown slots are kept as written.
pub fn render_args(args: &[String], bindings: &[(&str, &str)]) -> Vec<String> {
    args.iter().map(|arg| render_slots(arg, bindings)).collect()
}

fn render_slots(arg: &str, bindings: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;

    while let Some(open) = rest.find('{') {
        out.push_str(rest.get(..open).unwrap_or_default());
        let after_open = rest.get(open + 1..).unwrap_or_default();
        let bound = after_open.find('}').and_then(|close| {
            let name = after_open.get(..close)?;
            let (_, value) = bindings.iter().find(|(slot, _)| *slot == name)?;
            Some((*value, close))
        });
        match bound {
            Some((value, close)) => {
                out.push_str(value);
                rest = after_open.get(close + 1..).unwrap_or_default();
            },
            None => {
                out.push('{');
                rest = after_open;
            },
        }
    }

    out.push_str(rest);
    out
}
