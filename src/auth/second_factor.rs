//! Second-factor code sources.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

/// Supplies second-factor codes when the platform asks for one.
///
/// Interactive applications prompt the user here; returning `None` gives up
/// on the login.
#[async_trait]
pub trait SecondFactorSource: Send + Sync {
    async fn code(&self, reason: &str) -> Option<String>;
}

/// Hands out a fixed sequence of codes, then `None`.
#[derive(Debug, Default)]
pub struct ScriptedSecondFactor {
    codes: Mutex<VecDeque<String>>,
}

impl ScriptedSecondFactor {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: Mutex::new(codes.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl SecondFactorSource for ScriptedSecondFactor {
    async fn code(&self, _reason: &str) -> Option<String> {
        match self.codes.lock() {
            Ok(mut codes) => codes.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        }
    }
}
