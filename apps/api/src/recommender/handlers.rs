//! Axum route handlers for the recommendation form.

use axum::{
    extract::{Path, State},
    response::Html,
    Form, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::recommender::controller::{self, lock, FormView, SubmitError};
use crate::recommender::profile::{FormField, GpaBand, Grade};
use crate::recommender::throttle::THROTTLE_ALERT;
use crate::render::render_page;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct FormOptions {
    pub grades: Vec<&'static str>,
    pub gpa_bands: Vec<&'static str>,
}

/// The whole form as posted by the rendered page.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FormSubmission {
    pub grade: String,
    pub gpa: String,
    pub location: String,
    pub major: String,
    pub achievements: String,
    pub hobby: String,
}

impl FormSubmission {
    fn fields(&self) -> [(FormField, &str); 6] {
        [
            (FormField::Grade, self.grade.as_str()),
            (FormField::Gpa, self.gpa.as_str()),
            (FormField::Location, self.location.as_str()),
            (FormField::Major, self.major.as_str()),
            (FormField::Achievements, self.achievements.as_str()),
            (FormField::Hobby, self.hobby.as_str()),
        ]
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// ────────────────────────────────────────────────────────────────────────────
// JSON API
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/form
pub async fn handle_get_form(State(state): State<AppState>) -> Json<FormView> {
    Json(lock(&state.controller).view())
}

/// GET /api/v1/form/options
pub async fn handle_form_options() -> Json<FormOptions> {
    Json(FormOptions {
        grades: Grade::ALL.iter().map(|g| g.label()).collect(),
        gpa_bands: GpaBand::ALL.iter().map(|b| b.label()).collect(),
    })
}

/// PUT /api/v1/form/fields/:field
///
/// Change handler for one input. Overwrites the slot verbatim.
pub async fn handle_set_field(
    State(state): State<AppState>,
    Path(field): Path<String>,
    Json(update): Json<FieldUpdate>,
) -> Result<Json<FormView>, AppError> {
    let field: FormField = field.parse()?;
    let mut controller = lock(&state.controller);
    controller.set_field(field, &update.value)?;
    Ok(Json(controller.view()))
}

/// POST /api/v1/form/reset
///
/// Returns the form to its mount state. A submission still in flight is
/// discarded when it completes.
pub async fn handle_reset(State(state): State<AppState>) -> Json<FormView> {
    let mut controller = lock(&state.controller);
    controller.reset();
    info!("Form reset");
    Json(controller.view())
}

/// POST /api/v1/form/submit
///
/// 200 with the updated view once a submission is accepted, even when the
/// completion call failed. Validation, throttle and in-flight rejections map
/// to 400, 429 and 409.
pub async fn handle_submit(State(state): State<AppState>) -> Result<Json<FormView>, AppError> {
    let view = controller::submit(&state.controller, state.completion.as_ref(), now_ms())
        .await
        .map_err(|e| {
            warn!("Submission rejected: {e}");
            AppError::from(e)
        })?;
    Ok(Json(view))
}

// ────────────────────────────────────────────────────────────────────────────
// Rendered page
// ────────────────────────────────────────────────────────────────────────────

/// GET /
pub async fn handle_page(State(state): State<AppState>) -> Html<String> {
    let view = lock(&state.controller).view();
    Html(render_page(&view, None))
}

/// POST /
///
/// Applies the posted fields through their change handlers, submits, and
/// re-renders. A rejected value leaves every field untouched and is shown as
/// a banner; submit rejections become inline messages or a banner.
pub async fn handle_page_submit(
    State(state): State<AppState>,
    Form(submission): Form<FormSubmission>,
) -> Html<String> {
    let rejected = lock(&state.controller)
        .set_fields(submission.fields())
        .err();
    if let Some(err) = rejected {
        warn!("Form post rejected: {err}");
        let view = lock(&state.controller).view();
        return Html(render_page(&view, Some(&err.to_string())));
    }

    let alert = match controller::submit(&state.controller, state.completion.as_ref(), now_ms())
        .await
    {
        Ok(_) | Err(SubmitError::Validation(_)) => None,
        Err(SubmitError::Throttled { .. }) => Some(THROTTLE_ALERT.to_string()),
        Err(e @ SubmitError::InFlight) => Some(e.to_string()),
    };

    let view = lock(&state.controller).view();
    Html(render_page(&view, alert.as_deref()))
}
