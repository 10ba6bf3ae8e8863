use std::io::{BufRead, Write};

use memeify_adapters::SqliteMediaIndex;
use memeify_application::ConsentBroker;
use memeify_domain::{ModificationIntent, RecoveryToken};

/// Terminal stand-in for the platform's consent dialog: asks on stdin and,
/// on "y", records the grant in the index before reporting success.
pub struct PromptConsentBroker {
    index: SqliteMediaIndex,
}

impl PromptConsentBroker {
    pub fn new(index: SqliteMediaIndex) -> Self {
        Self { index }
    }
}

impl ConsentBroker for PromptConsentBroker {
    fn request_consent(&self, token: &RecoveryToken) -> bool {
        let verb = match token.intent() {
            ModificationIntent::Update => "modify",
            ModificationIntent::Delete => "delete",
        };
        print!("another app owns this image. Allow Memeify to {verb} it? [y/N] ");
        if std::io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        if !answer.trim().eq_ignore_ascii_case("y") {
            return false;
        }

        match self.index.grant_write(token.handle()) {
            Ok(()) => true,
            Err(error) => {
                log::error!("failed to record consent: {error}");
                false
            }
        }
    }
}
