//! Video/slideshow classification.
//!
//! The [`Classifier`] holds a priority-ordered list of [`ClassificationRule`]s.
//! Cheap URL-shape rules run before the metadata probe, so links that already
//! say what they are never reach the network.
//!
//! Rules are tried in priority order (`UrlShape` first, then `MetadataProbe`).
//! Within the same priority level, rules are tried in registration order. The
//! first rule that returns a kind wins.

mod rules;

pub use rules::{AudioOnlyProbeRule, SlideshowPathRule};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::auth::{CookieError, CookieJarFile};
use crate::ytdlp::{BackendError, MediaBackend};

/// What a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// A single video, downloaded through the media backend.
    Video,
    /// A multi-image photo post.
    Slideshow,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Slideshow => write!(f, "slideshow"),
        }
    }
}

/// Rule evaluation order. Lower values run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RulePriority {
    /// Decides from the URL alone, no network.
    UrlShape = 0,
    /// Needs a metadata probe through the media backend.
    MetadataProbe = 1,
}

/// Errors raised while classifying a link.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The metadata probe failed; the kind is not guessed.
    #[error("metadata probe failed for {url}: {source}")]
    MetadataProbe {
        /// The link being classified.
        url: String,
        /// The backend failure.
        #[source]
        source: BackendError,
    },

    /// The cookie jar a rule needed could not be written.
    #[error(transparent)]
    Cookies(#[from] CookieError),

    /// No registered rule reached a decision.
    #[error("link is neither a video nor a slideshow: {url}")]
    Undetermined {
        /// The link being classified.
        url: String,
    },
}

/// One classification rule.
#[async_trait]
pub trait ClassificationRule: Send + Sync {
    /// Rule name for logs.
    fn name(&self) -> &'static str;

    /// Evaluation priority.
    fn priority(&self) -> RulePriority;

    /// Returns a kind when this rule decides, `None` to defer to later rules.
    ///
    /// Rules that hand cookies to the media backend resolve `cookie_jar`
    /// themselves; the jar is written on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError`] when the rule cannot be evaluated.
    async fn evaluate(
        &self,
        url: &str,
        cookie_jar: &CookieJarFile,
    ) -> Result<Option<ContentKind>, ClassifyError>;
}

/// Priority-ordered rule list.
#[derive(Default)]
pub struct Classifier {
    rules: Vec<Box<dyn ClassificationRule>>,
}

impl Classifier {
    /// Creates a classifier with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard rule set: slideshow path marker, then audio-only probe.
    #[must_use]
    pub fn with_default_rules(backend: Arc<dyn MediaBackend>) -> Self {
        let mut classifier = Self::new();
        classifier.register(Box::new(SlideshowPathRule));
        classifier.register(Box::new(AudioOnlyProbeRule::new(backend)));
        classifier
    }

    /// Adds a rule.
    pub fn register(&mut self, rule: Box<dyn ClassificationRule>) {
        debug!(name = rule.name(), priority = ?rule.priority(), "Registering classification rule");
        self.rules.push(rule);
        // Stable sort keeps registration order within a priority.
        self.rules.sort_by_key(|rule| rule.priority());
    }

    /// Number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Rule names in evaluation order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Classifies `url`.
    ///
    /// # Errors
    ///
    /// Returns the first rule error, or [`ClassifyError::Undetermined`] when no
    /// rule decides.
    #[instrument(skip(self, cookie_jar), fields(url = %url))]
    pub async fn classify(
        &self,
        url: &str,
        cookie_jar: &CookieJarFile,
    ) -> Result<ContentKind, ClassifyError> {
        for rule in &self.rules {
            if let Some(kind) = rule.evaluate(url, cookie_jar).await? {
                info!(rule = rule.name(), kind = %kind, "Classified link");
                return Ok(kind);
            }
            debug!(rule = rule.name(), "rule deferred");
        }
        Err(ClassifyError::Undetermined {
            url: url.to_string(),
        })
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.rule_names())
            .finish()
    }
}
