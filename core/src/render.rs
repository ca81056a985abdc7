use crate::PredictionResult;

use std::fmt::Write;

/// What a presenter is asked to show for one request
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
	AwaitingInput,
	Predicted(&'a PredictionResult),
	Failed(&'a str),
}

/// Turns an [`Outcome`] into text for a specific front end.
///
/// Implementations are pure, the same outcome always renders the same way.
pub trait Presenter: Send + Sync {
	fn render(&self, outcome: &Outcome<'_>) -> String;
}

/// Line oriented rendering for terminals and logs
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextPresenter;

impl Presenter for PlainTextPresenter {
	fn render(&self, outcome: &Outcome<'_>) -> String {
		match outcome {
			Outcome::AwaitingInput => "Upload a food photo to get started.".to_string(),
			Outcome::Failed(message) => format!("Error: {message}"),
			Outcome::Predicted(prediction) => {
				let mut out = format!("Prediction: {}\n", prediction.label);

				let Some(record) = &prediction.record else {
					out.push_str("No food card for this label.\n");
					return out;
				};

				// Writing into a String can't fail
				let _ = writeln!(out, "Calories: {}", record.calories);
				let _ = writeln!(out, "Main nutrients: {}", record.nutrients);
				let _ = writeln!(out, "Description: {}", record.description);
				if !record.pairings.is_empty() {
					let _ = writeln!(out, "Pairings: {}", record.pairings.join(", "));
				}
				if !record.music.is_empty() {
					let _ = writeln!(out, "Music: {}", record.music);
				}
				if !record.movie.is_empty() {
					let _ = writeln!(out, "Movie: {}", record.movie);
				}

				out
			}
		}
	}
}
