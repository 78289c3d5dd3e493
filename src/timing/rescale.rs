use super::factor::RationalFactor;
use super::timestamp::{self, Timestamp};
use crate::error::{PalfixError, Result};
use tracing::debug;

/// Stretch a single timestamp by `factor`, truncating to whole milliseconds.
pub fn rescale_timestamp(ts: Timestamp, factor: &RationalFactor) -> Timestamp {
    Timestamp::from_millis(factor.apply_millis(ts.as_millis()))
}

/// Re-time the first timestamp in `line`.
///
/// Lines without a timestamp come back unchanged. Only the matched span is
/// replaced, and the rewritten timestamp keeps the original number of
/// fractional digits.
pub fn rescale_line(line: &str, factor: &RationalFactor) -> Result<String> {
    let Some(found) = timestamp::find(line) else {
        return Ok(line.to_string());
    };

    let rescaled = rescale_timestamp(found.timestamp()?, factor);

    let mut out = String::with_capacity(line.len() + 2);
    out.push_str(&line[..found.range.start]);
    out.push_str(&rescaled.format_with_precision(found.precision()));
    out.push_str(&line[found.range.end..]);
    Ok(out)
}

/// Re-time every line, one result per input line, in input order.
///
/// A malformed line does not stop the lines after it.
pub fn rescale_stream<'a, I>(lines: I, factor: &RationalFactor) -> Vec<Result<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .map(|line| rescale_line(line, factor))
        .collect()
}

/// Re-times whole chapter or subtitle files.
#[derive(Debug, Clone)]
pub struct Rescaler {
    factor: RationalFactor,
}

/// Outcome of rewriting a whole text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescaledText {
    pub text: String,
    pub lines: usize,
    pub rewritten: usize,
}

impl Rescaler {
    pub fn new(factor: RationalFactor) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> RationalFactor {
        self.factor
    }

    /// Rewrite `text` line by line, keeping line terminators as they were.
    ///
    /// `\n`, `\r\n` and a lone `\r` all end a line. Fails on the first malformed timestamp, reporting its 1-based line
    /// number, without returning partial output.
    pub fn rescale_text(&self, text: &str) -> Result<RescaledText> {
        let mut out = String::with_capacity(text.len() + text.len() / 16);
        let mut lines = 0;
        let mut rewritten = 0;

        for (index, (body, ending)) in split_lines(text).enumerate() {
            let fixed = rescale_line(body, &self.factor).map_err(|e| match e {
                PalfixError::MalformedTimestamp(msg) => {
                    PalfixError::MalformedTimestamp(format!("line {}: {msg}", index + 1))
                }
                other => other,
            })?;

            if fixed != body {
                rewritten += 1;
            }
            lines += 1;

            out.push_str(&fixed);
            out.push_str(ending);
        }

        debug!(
            "Rescaled {} of {} lines by {}",
            rewritten, lines, self.factor
        );

        Ok(RescaledText {
            text: out,
            lines,
            rewritten,
        })
    }
}

/// Split `text` into `(body, terminator)` pairs. The last line's terminator
/// is empty when the text doesn't end with one.
fn split_lines(text: &str) -> impl Iterator<Item = (&str, &str)> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let (body_len, ending_len) = match rest.find(['\r', '\n']) {
            Some(i) if rest[i..].starts_with("\r\n") => (i, 2),
            Some(i) => (i, 1),
            None => (rest.len(), 0),
        };
        let (line, tail) = rest.split_at(body_len + ending_len);
        rest = tail;
        Some(line.split_at(body_len))
    })
}

/// Rewrite a whole text by `factor`. See [`Rescaler::rescale_text`].
pub fn rescale_text(text: &str, factor: &RationalFactor) -> Result<String> {
    Rescaler::new(*factor).rescale_text(text).map(|r| r.text)
}
