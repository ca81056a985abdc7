use crate::{Error, Node, Outcome, PredictionResult, Presenter};

use foodie_images::InputImage;

use std::mem;

use tracing::debug;

/// Where a single classification request stands.
///
/// `AwaitingInput -> ImageReceived -> Classified -> Rendered`, a failed classification goes
/// back to `AwaitingInput`.
#[derive(Debug, Default)]
pub enum RequestState {
	#[default]
	AwaitingInput,
	ImageReceived(InputImage),
	Classified(PredictionResult),
	Rendered(String),
}

impl RequestState {
	#[must_use]
	pub const fn name(&self) -> &'static str {
		match self {
			Self::AwaitingInput => "awaiting input",
			Self::ImageReceived(_) => "image received",
			Self::Classified(_) => "classified",
			Self::Rendered(_) => "rendered",
		}
	}
}

#[derive(Debug, Default)]
pub struct Request {
	state: RequestState,
}

impl Request {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub const fn state(&self) -> &RequestState {
		&self.state
	}

	pub fn receive(&mut self, image: InputImage) -> Result<(), Error> {
		match self.state {
			RequestState::AwaitingInput => {
				self.state = RequestState::ImageReceived(image);
				Ok(())
			}
			ref other => Err(Error::InvalidTransition {
				from: other.name(),
				to: "image received",
			}),
		}
	}

	pub async fn classify(&mut self, node: &Node) -> Result<(), Error> {
		let image = match mem::take(&mut self.state) {
			RequestState::ImageReceived(image) => image,
			other => {
				let from = other.name();
				self.state = other;
				return Err(Error::InvalidTransition {
					from,
					to: "classified",
				});
			}
		};

		// On failure the state stays at AwaitingInput, ready for another image
		let prediction = node.classify(image).await?;
		self.state = RequestState::Classified(prediction);

		Ok(())
	}

	pub fn render(&mut self, presenter: &dyn Presenter) -> Result<(), Error> {
		let rendered = match &self.state {
			RequestState::Classified(prediction) => {
				presenter.render(&Outcome::Predicted(prediction))
			}
			other => {
				return Err(Error::InvalidTransition {
					from: other.name(),
					to: "rendered",
				})
			}
		};

		self.state = RequestState::Rendered(rendered);

		Ok(())
	}

	#[must_use]
	pub const fn prediction(&self) -> Option<&PredictionResult> {
		match &self.state {
			RequestState::Classified(prediction) => Some(prediction),
			_ => None,
		}
	}

	/// Consumes the request, yielding the rendered text once it got that far
	#[must_use]
	pub fn into_rendered(self) -> Option<String> {
		match self.state {
			RequestState::Rendered(text) => Some(text),
			_ => None,
		}
	}
}

impl Node {
	/// Runs one request end to end and renders whatever it ended in, failures included
	pub async fn handle(&self, input: Option<InputImage>, presenter: &dyn Presenter) -> String {
		let Some(image) = input else {
			return presenter.render(&Outcome::AwaitingInput);
		};

		let mut request = Request::new();
		let res = match request.receive(image) {
			Ok(()) => request.classify(self).await,
			Err(e) => Err(e),
		};

		if let Err(e) = res {
			debug!("Request failed: {e}");
			return presenter.render(&Outcome::Failed(&e.user_message()));
		}

		if let Err(e) = request.render(presenter) {
			return presenter.render(&Outcome::Failed(&e.user_message()));
		}

		request.into_rendered().unwrap_or_default()
	}
}
