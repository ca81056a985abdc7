use crate::html::HtmlPresenter;

use foodie_core::{Error as CoreError, Outcome, Presenter};
use foodie_search::SearchFetchError;

use axum::{
	extract::multipart::MultipartError,
	http::StatusCode,
	response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ServerError {
	#[error(transparent)]
	Core(#[from] CoreError),
	#[error("malformed upload: {0}")]
	Multipart(#[from] MultipartError),
	#[error("no file was uploaded")]
	MissingUpload,
	#[error("image search is disabled")]
	SearchDisabled,
	#[error("picked picture was not offered by a recent search")]
	UnknownPick,
	#[error(transparent)]
	Candidate(#[from] SearchFetchError),
	#[error("background task failed: {0}")]
	Task(#[from] JoinError),
}

impl ServerError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Multipart(_) | Self::MissingUpload => StatusCode::BAD_REQUEST,
			Self::UnknownPick | Self::Candidate(_) => StatusCode::UNPROCESSABLE_ENTITY,
			Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::SearchDisabled => StatusCode::NOT_FOUND,
			Self::Core(e) if e.is_input_error() => StatusCode::UNPROCESSABLE_ENTITY,
			Self::Core(e) if e.is_classifier_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
			Self::Core(CoreError::Search(_)) => StatusCode::BAD_GATEWAY,
			Self::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn user_message(&self) -> String {
		match self {
			Self::Core(e) => e.user_message(),
			Self::UnknownPick => {
				"That picture is no longer on offer, please search again.".to_string()
			}
			Self::Candidate(_) => {
				"Couldn't get that picture anymore, please pick another one.".to_string()
			}
			e => format!("{e}, please try again."),
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let status = self.status();
		if status.is_server_error() {
			error!("Request failed: {self}");
		} else {
			warn!("Rejected request: {self}");
		}

		let page = HtmlPresenter::default().render(&Outcome::Failed(&self.user_message()));

		(status, Html(page)).into_response()
	}
}
