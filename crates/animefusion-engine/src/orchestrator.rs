use std::sync::Arc;
use std::thread;

use animefusion_contracts::ids::{now_millis, time_id};
use animefusion_contracts::{
    build_prompt, generation_label, CharacterConfig, Credential, DiagnosticLog, GeneratedImage,
    LogLevel, ViewAngle,
};
use chrono::Utc;

use crate::{GenerationError, ImageRequest, ImageService, MISSING_CREDENTIAL_MESSAGE};

/// Turns a config into one (or three) image service calls and a history record.
pub struct Orchestrator {
    service: Arc<dyn ImageService>,
    model: String,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn ImageService>, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Runs one generation. `multi_view` renders front, side and back
    /// concurrently and succeeds only if all three do.
    ///
    /// Progress and failures are recorded in `log`; the full primary prompt is
    /// logged before any service call is made.
    pub fn generate(
        &self,
        config: &CharacterConfig,
        multi_view: bool,
        credential: Option<&Credential>,
        log: &mut DiagnosticLog,
    ) -> Result<GeneratedImage, GenerationError> {
        let Some(credential) = credential else {
            log.error(MISSING_CREDENTIAL_MESSAGE, None);
            return Err(GenerationError::MissingCredential);
        };

        let started_at = Utc::now();
        let id = time_id(started_at);
        let primary_prompt = build_prompt(config);
        log.info("Starting generation process...");
        log.append(
            format!("Prompt [Main]: {primary_prompt}"),
            LogLevel::Info,
            Some(primary_prompt),
        );

        let views: Vec<CharacterConfig> = if multi_view {
            log.warning("360° Mode enabled. Generating 3 views (Front, Side, Back)...");
            ViewAngle::ROTATION
                .iter()
                .map(|view| config.with_view(*view))
                .collect()
        } else {
            vec![config.clone()]
        };

        let mut urls = match self.render_all(&views, credential) {
            Ok(urls) => urls,
            Err(err) => {
                log.error(
                    format!("Generation Failed: {err}"),
                    err.detail().map(str::to_string),
                );
                return Err(err);
            }
        };

        let rotation_set = if multi_view {
            let set = <[String; 3]>::try_from(urls.clone()).map_err(|partial| {
                GenerationError::UnknownFailure {
                    message: format!("expected 3 views, got {}", partial.len()),
                    detail: None,
                }
            });
            match set {
                Ok(set) => {
                    log.success("Successfully generated all 360° views.");
                    Some(set)
                }
                Err(err) => {
                    log.error(format!("Generation Failed: {err}"), None);
                    return Err(err);
                }
            }
        } else {
            log.success("Image generated successfully.");
            None
        };

        Ok(GeneratedImage {
            id,
            url: urls.swap_remove(0),
            prompt: generation_label(config, multi_view),
            created_at: now_millis(),
            rotation_set,
        })
    }

    /// One service call per config, all in flight at once. Results come back
    /// in input order; any failure fails the whole batch.
    fn render_all(
        &self,
        views: &[CharacterConfig],
        credential: &Credential,
    ) -> Result<Vec<String>, GenerationError> {
        let requests: Vec<ImageRequest> = views
            .iter()
            .map(|view_config| ImageRequest {
                prompt: build_prompt(view_config),
                model: self.model.clone(),
                api_key: credential.key.clone(),
                view: view_config.view,
            })
            .collect();

        let results: Vec<Result<String, GenerationError>> = thread::scope(|scope| {
            let handles: Vec<_> = requests
                .iter()
                .map(|request| scope.spawn(move || self.service.generate(request)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(Ok(payload)) => Ok(payload.to_data_uri()),
                    Ok(Err(err)) => Err(GenerationError::from(err)),
                    Err(panic) => Err(GenerationError::from_panic(panic)),
                })
                .collect()
        });

        let mut urls = Vec::with_capacity(results.len());
        let mut first_failure: Option<GenerationError> = None;
        let mut other_failures = Vec::new();
        for (request, result) in requests.iter().zip(results) {
            match result {
                Ok(url) => urls.push(url),
                Err(err) if first_failure.is_none() => first_failure = Some(err),
                Err(err) => other_failures.push(format!("{} view: {err}", request.view.id())),
            }
        }

        match first_failure {
            Some(err) if other_failures.is_empty() => Err(err),
            Some(err) => Err(err.with_extra_detail(&other_failures.join("\n"))),
            None => Ok(urls),
        }
    }
}
