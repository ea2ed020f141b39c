//! Structured logging with transaction-id tracking.
//!
//! [`Logger`] is the seam application code logs through; [`StdLogger`] is
//! the default implementation, backed by the `log` crate so it plugs into
//! whatever logger (`env_logger`, `fern`, ...) the binary installs.

use rand::Rng;

const TRANSACTION_ID_LEN: usize = 12;
const TRANSACTION_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A 12-character base62 identifier tying a run of related log lines
/// together end to end (one connection, one batch, one request).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(String);

impl TransactionId {
    /// Generates a new random transaction id.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let id = (0..TRANSACTION_ID_LEN)
            .map(|_| {
                let idx = rng.random_range(0..TRANSACTION_ID_ALPHABET.len());
                TRANSACTION_ID_ALPHABET[idx] as char
            })
            .collect();
        TransactionId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One piece of structured context attached to a log line, rendered as
/// `key=value` the way [`CustomLogger`]'s keyword arguments are.
pub type Field<'a> = (&'a str, &'a str);

/// The logging seam every module that needs to log goes through, rather
/// than calling `log::*!` macros directly — this is what lets a caller
/// swap in a transaction-scoped logger without touching call sites.
pub trait Logger {
    fn debug(&self, message: &str, context: &[Field<'_>]);
    fn info(&self, message: &str, context: &[Field<'_>]);
    fn warning(&self, message: &str, context: &[Field<'_>]);
    fn error(&self, message: &str, context: &[Field<'_>]);
    fn critical(&self, message: &str, context: &[Field<'_>]);
}

/// Renders `message` plus `context` key/value pairs exactly as
/// `"{message} | k=v | k2=v2"`, matching the pipe-separated layout
/// `CustomLogger._format_message` produces.
fn format_message(message: &str, context: &[Field<'_>]) -> String {
    if context.is_empty() {
        return message.to_owned();
    }
    let pairs: Vec<String> = context.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{message} | {}", pairs.join(" | "))
}

/// The default [`Logger`], backed by the `log` crate. Every line carries
/// this logger's `transaction_id` as a prefix, mirroring the
/// `TransactionIDFilter` the Python implementation installs on every
/// handler.
#[derive(Clone, Debug)]
pub struct StdLogger {
    transaction_id: TransactionId,
}

impl StdLogger {
    pub fn new(transaction_id: TransactionId) -> Self {
        StdLogger { transaction_id }
    }

    /// Convenience constructor that generates a fresh transaction id.
    pub fn with_generated_id() -> Self {
        StdLogger::new(TransactionId::generate())
    }

    fn prefixed(&self, message: &str, context: &[Field<'_>]) -> String {
        format!(
            "[{}] {}",
            self.transaction_id,
            format_message(message, context)
        )
    }
}

impl Logger for StdLogger {
    fn debug(&self, message: &str, context: &[Field<'_>]) {
        log::debug!("{}", self.prefixed(message, context));
    }

    fn info(&self, message: &str, context: &[Field<'_>]) {
        log::info!("{}", self.prefixed(message, context));
    }

    fn warning(&self, message: &str, context: &[Field<'_>]) {
        log::warn!("{}", self.prefixed(message, context));
    }

    fn error(&self, message: &str, context: &[Field<'_>]) {
        log::error!("{}", self.prefixed(message, context));
    }

    fn critical(&self, message: &str, context: &[Field<'_>]) {
        log::error!("{}", self.prefixed(message, context));
    }
}
