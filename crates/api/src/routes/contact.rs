//! Contact-form email relay.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{Mailer, OutboundMail};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
}

#[derive(Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: &'static str,
}

/// POST /api/contact/send-email — relay a contact-form submission to the
/// operator. Unlike the order notice, a transport failure here is
/// surfaced to the caller.
#[tracing::instrument(skip(state, req))]
pub async fn send_email<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    Json(req): Json<ContactRequest>,
) -> Result<Json<ContactResponse>, ApiError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.message.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Please provide name, email, and message".to_string(),
        ));
    }

    let phone_line = req
        .phone
        .as_deref()
        .map(|phone| format!("<p><strong>Phone:</strong> {phone}</p>"))
        .unwrap_or_default();
    let mail = OutboundMail {
        subject: format!("New Contact Form Submission from {}", req.name),
        html_body: format!(
            "<h2>New Contact Form Submission</h2>\
             <p><strong>Name:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             {phone_line}\
             <p><strong>Message:</strong></p>\
             <p>{}</p>",
            req.name, req.email, req.message,
        ),
        reply_to: Some(req.email),
    };

    state
        .mailer
        .send(mail)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to send email: {e}")))?;

    Ok(Json(ContactResponse {
        success: true,
        message: "Email sent successfully",
    }))
}
