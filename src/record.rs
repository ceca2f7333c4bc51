use std::fmt::Write as _;

/// Column names of the audit log, in on-disk order.
pub const LOG_COLUMNS: [&str; 10] = [
    "call_id",
    "project",
    "t",
    "delta_t",
    "url",
    "redirect_url",
    "response_size",
    "response_code",
    "success",
    "error",
];

/// Field delimiter of the audit log.
pub const DELIMITER: char = ';';

/// One row of the audit trail.
#[derive(Clone, Debug, PartialEq)]
pub struct AttemptRecord {
    /// Unique, strictly increasing identifier within the log file.
    pub call_id: u64,
    /// Caller-supplied grouping label.
    pub project: String,
    /// Wall-clock start of the attempt, Unix seconds.
    pub started_at: f64,
    /// Duration of the attempt in seconds.
    pub elapsed: f64,
    pub url: String,
    /// Final URL after redirects; empty if no response was obtained.
    pub redirect_url: String,
    /// Size of the decoded payload; 0 on failure.
    pub response_size: u64,
    pub response_code: Option<u16>,
    /// `true` only when a usable payload was returned to the caller.
    pub success: bool,
    /// Failure classification or diagnostic text; empty on success.
    pub error: String,
}

impl AttemptRecord {
    /// Renders the record as one `;`-delimited line, including the trailing `\n`.
    pub fn to_line(&self) -> String {
        let mut line = String::with_capacity(
            64 + self.project.len() + self.url.len() + self.redirect_url.len() + self.error.len(),
        );
        let code = self
            .response_code
            .map(|code| code.to_string())
            .unwrap_or_default();

        // Writing to a String cannot fail.
        let _ = write!(
            line,
            "{id};{project};{t};{dt};{url};{redirect};{size};{code};{success};{error}",
            id = self.call_id,
            project = sanitize_field(&self.project),
            t = self.started_at,
            dt = self.elapsed,
            url = sanitize_field(&self.url),
            redirect = sanitize_field(&self.redirect_url),
            size = self.response_size,
            success = self.success,
            error = sanitize_field(&self.error),
        );
        line.push('\n');
        line
    }
}

/// Header line of a fresh log file, including the trailing `\n`.
pub fn header_line() -> String {
    let mut line = LOG_COLUMNS.join(";");
    line.push('\n');
    line
}

/// Keeps a free-text field on one line and inside its column.
fn sanitize_field(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            DELIMITER => ',',
            '\r' | '\n' => ' ',
            other => other,
        })
        .collect()
}

/// Extracts the call id from a rendered log line, if the first field is numeric.
pub(crate) fn parse_call_id(line: &str) -> Option<u64> {
    line.split(DELIMITER).next()?.trim().parse().ok()
}
