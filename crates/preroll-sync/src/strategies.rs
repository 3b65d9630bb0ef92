//! The request shapes media servers have accepted over the years.
//!
//! Each strategy tries its variants in order and stops at the first success.
//! When every variant fails it reports the most informative failure it saw.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::chain::informativeness;
use crate::client::{HttpReply, MediaServerClient};
use crate::error::SyncError;
use crate::strategy::{StrategyOutcome, SyncPayload, SyncStrategy};
use crate::xml;

/// Preference keys tried by the `global-preference` strategy.
pub const GLOBAL_PREFERENCE_KEYS: &[&str] = &[
    "preroll",
    "Preroll",
    "trailerID",
    "TrailerID",
    "cinemaTrailersPrerollID",
];

/// Preference keys tried with the URL-form pool.
pub const URL_PREFERENCE_KEYS: &[&str] = &[
    "CinemaTrailersPrerollID",
    "cinemaTrailersPrerollID",
    "PrerollID",
    "prerollID",
    "preroll",
    "Preroll",
];

/// Upload endpoints tried by `upload-reference`, in order.
pub const UPLOAD_ENDPOINTS: &[&str] = &[
    "/library/upload",
    "/library/upload?sectionId=prerolls",
    "/library/upload?type=18",
];

/// Preference keys that receive an uploaded item's rating key.
pub const RATING_KEY_PREFERENCE_KEYS: &[&str] = &[
    "CinemaTrailersPrerollID",
    "cinemaTrailersPrerollID",
    "PrerollID",
    "prerollID",
];

/// Keeps the most informative failure out of a strategy's variants.
#[derive(Default)]
struct Failures {
    best: Option<(u8, StrategyOutcome)>,
}

impl Failures {
    fn push(&mut self, err: &SyncError) {
        let outcome = StrategyOutcome::failed(err);
        let StrategyOutcome::Failed {
            http_status,
            message,
        } = &outcome
        else {
            return;
        };
        let score = informativeness(*http_status, message);
        if self.best.as_ref().map_or(true, |(best, _)| score > *best) {
            self.best = Some((score, outcome));
        }
    }

    fn into_outcome(self, fallback: &str) -> StrategyOutcome {
        self.best.map(|(_, o)| o).unwrap_or(StrategyOutcome::Failed {
            http_status: None,
            message: fallback.to_string(),
        })
    }
}

fn succeeded(reply: &HttpReply, detail: String) -> StrategyOutcome {
    StrategyOutcome::Succeeded {
        http_status: Some(reply.status),
        detail,
    }
}

/// Which encoding of the pool a [`PreferenceStrategy`] sends.
#[derive(Debug, Clone)]
pub enum PoolForm {
    Paths,
    /// `{public_url}/files/{category}/{file}`; `None` disables the strategy.
    Urls { public_url: Option<String> },
}

/// `PUT /:/prefs?{key}=<pool>` for each key in turn.
pub struct PreferenceStrategy {
    name: String,
    client: Arc<MediaServerClient>,
    keys: Vec<String>,
    form: PoolForm,
}

impl PreferenceStrategy {
    pub fn new(
        name: impl Into<String>,
        client: Arc<MediaServerClient>,
        keys: &[&str],
        form: PoolForm,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            keys: keys.iter().map(|k| k.to_string()).collect(),
            form,
        }
    }
}

#[async_trait]
impl SyncStrategy for PreferenceStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, payload: &SyncPayload) -> StrategyOutcome {
        let pool = match &self.form {
            PoolForm::Paths => payload.path_pool().to_string(),
            PoolForm::Urls { public_url: None } => {
                return StrategyOutcome::skipped("library.public_url not configured");
            }
            PoolForm::Urls {
                public_url: Some(base),
            } => match payload.url_pool(base) {
                Some(pool) => pool,
                None => return StrategyOutcome::skipped("assets have no category directory"),
            },
        };

        let mut failures = Failures::default();
        for key in &self.keys {
            match self.client.put_preference(key, &pool).await {
                Ok(reply) => return succeeded(&reply, format!("preference {key} updated")),
                Err(e) => {
                    debug!(strategy = %self.name, key = %key, err = %e, "preference key rejected");
                    failures.push(&e);
                }
            }
        }
        failures.into_outcome("no preference keys configured")
    }
}

/// Per-section preference on every movie library until one accepts it.
pub struct LibrarySectionStrategy {
    client: Arc<MediaServerClient>,
}

impl LibrarySectionStrategy {
    pub const NAME: &'static str = "library-section";

    pub fn new(client: Arc<MediaServerClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SyncStrategy for LibrarySectionStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn attempt(&self, payload: &SyncPayload) -> StrategyOutcome {
        let sections = match self.client.library_sections().await {
            Ok(sections) => sections,
            Err(e) => return StrategyOutcome::failed(&e),
        };
        let movies: Vec<_> = sections.into_iter().filter(|s| s.is_movie()).collect();
        if movies.is_empty() {
            return StrategyOutcome::skipped("no movie library section discovered");
        }

        let mut failures = Failures::default();
        for section in &movies {
            match self
                .client
                .put_section_preference(&section.key, "prerollID", payload.path_pool())
                .await
            {
                Ok(reply) => {
                    return succeeded(
                        &reply,
                        format!("section {} ({}) updated", section.key, section.title),
                    )
                }
                Err(e) => {
                    debug!(section = %section.key, err = %e, "section preference rejected");
                    failures.push(&e);
                }
            }
        }
        failures.into_outcome("every movie section rejected the preference")
    }
}

/// Upload the first asset, then point the preroll preferences at the
/// rating key the server assigned to it.
pub struct UploadReferenceStrategy {
    client: Arc<MediaServerClient>,
}

impl UploadReferenceStrategy {
    pub const NAME: &'static str = "upload-reference";

    pub fn new(client: Arc<MediaServerClient>) -> Self {
        Self { client }
    }

    async fn upload(&self, payload: &SyncPayload) -> Result<String, Failures> {
        let mut failures = Failures::default();
        let Some(asset) = payload.first() else {
            return Err(failures);
        };
        for endpoint in UPLOAD_ENDPOINTS {
            match self.client.upload(endpoint, &asset.absolute_path).await {
                Ok(reply) => match xml::extract_rating_key(&reply.body) {
                    Some(key) => return Ok(key),
                    None => failures.push(&SyncError::Api {
                        status: reply.status,
                        message: format!("{endpoint} accepted the upload but returned no ratingKey"),
                    }),
                },
                Err(e) => {
                    debug!(endpoint, err = %e, "upload rejected");
                    failures.push(&e);
                }
            }
        }
        Err(failures)
    }
}

#[async_trait]
impl SyncStrategy for UploadReferenceStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn attempt(&self, payload: &SyncPayload) -> StrategyOutcome {
        match payload.first() {
            Some(asset) if asset.absolute_path.is_file() => {}
            _ => return StrategyOutcome::skipped("first asset is not readable"),
        }

        let rating_key = match self.upload(payload).await {
            Ok(key) => key,
            Err(failures) => return failures.into_outcome("upload failed"),
        };

        let mut failures = Failures::default();
        for key in RATING_KEY_PREFERENCE_KEYS {
            match self.client.put_preference(key, &rating_key).await {
                Ok(reply) => {
                    return succeeded(&reply, format!("{key} set to uploaded item {rating_key}"))
                }
                Err(e) => failures.push(&e),
            }
        }
        failures.into_outcome("no preference accepted the uploaded item")
    }
}
