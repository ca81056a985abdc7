use foodie_core::{Outcome, Presenter};
use foodie_images::DynamicImage;

use std::{fmt::Write, io::Cursor};

use base64::{engine::general_purpose, Engine};
use image::ImageOutputFormat;
use tracing::debug;
use url::Url;
use uuid::Uuid;

const PREVIEW_SIZE: u32 = 320;

const STYLE: &str = "body{font-family:sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem}\
	.card{border:1px solid #ddd;border-radius:.5rem;padding:1rem 1.5rem}\
	.error{color:#b00020}\
	.thumbs{display:flex;flex-wrap:wrap;gap:1rem}\
	.thumbs form{display:flex;flex-direction:column;gap:.25rem}\
	.thumbs img{width:160px;height:160px;object-fit:cover}\
	figure{margin:1rem 0}figure img{max-width:100%;border-radius:.5rem}";

/// Renders outcomes as full HTML pages, upload and search forms included
#[derive(Debug, Default, Clone)]
pub struct HtmlPresenter {
	preview: Option<String>,
}

impl HtmlPresenter {
	/// Shows the classified photo above its food card, `preview` being a data URL
	pub fn with_preview(preview: Option<String>) -> Self {
		Self { preview }
	}
}

impl Presenter for HtmlPresenter {
	fn render(&self, outcome: &Outcome<'_>) -> String {
		let body = match outcome {
			Outcome::AwaitingInput => {
				"<p>Upload a food photo to get started.</p>".to_string()
			}
			Outcome::Failed(message) => {
				format!("<p class=\"error\">{}</p>", escape(message))
			}
			Outcome::Predicted(prediction) => {
				let mut card = String::new();
				if let Some(preview) = &self.preview {
					let _ = write!(
						card,
						"<figure><img src=\"{}\" alt=\"Uploaded photo\">\
						 <figcaption>Uploaded photo</figcaption></figure>",
						escape(preview)
					);
				}
				let _ = write!(
					card,
					"<article class=\"card\"><h2>{}</h2>",
					escape(&prediction.label)
				);

				match &prediction.record {
					None => card.push_str("<p>No food card for this label.</p>"),
					Some(record) => {
						card.push_str("<dl>");
						let mut field = |name: &str, value: &str| {
							if !value.is_empty() {
								// Writing into a String can't fail
								let _ = write!(card, "<dt>{name}</dt><dd>{}</dd>", escape(value));
							}
						};
						field("Calories", &record.calories.to_string());
						field("Main nutrients", &record.nutrients);
						field("Description", &record.description);
						field("Pairings", &record.pairings.join(", "));
						field("Music", &record.music);
						field("Movie", &record.movie);
						card.push_str("</dl>");
					}
				}

				card.push_str("</article>");
				card
			}
		};

		page(&body)
	}
}

/// Wraps `body` with the shared layout
pub fn page(body: &str) -> String {
	format!(
		"<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
		 <title>Foodie</title><style>{STYLE}</style></head><body>\
		 <h1>Foodie</h1>\
		 <form action=\"/classify\" method=\"post\" enctype=\"multipart/form-data\">\
		 <input type=\"file\" name=\"file\" accept=\"image/*\" required> \
		 <button type=\"submit\">Classify</button></form>\
		 <form action=\"/search\" method=\"get\">\
		 <input type=\"search\" name=\"q\" placeholder=\"No photo? Search for one\"> \
		 <button type=\"submit\">Search</button></form>\
		 <main>{body}</main></body></html>"
	)
}

/// A small JPEG of `image` as a data URL, `None` if it can't be encoded
pub fn preview(image: &DynamicImage) -> Option<String> {
	let mut bytes = Cursor::new(Vec::new());

	if let Err(e) = image
		.thumbnail(PREVIEW_SIZE, PREVIEW_SIZE)
		.to_rgb8()
		.write_to(&mut bytes, ImageOutputFormat::Jpeg(85))
	{
		debug!("Couldn't encode photo preview: {e}");
		return None;
	}

	Some(format!(
		"data:image/jpeg;base64,{}",
		general_purpose::STANDARD.encode(bytes.into_inner())
	))
}

/// Lists search candidates, each one a button classifying that picture by its offer id
pub fn search_results(query: &str, offers: &[(Uuid, Url)]) -> String {
	if offers.is_empty() {
		return page(&format!(
			"<p>No usable pictures found for \u{201c}{}\u{201d}, try other words.</p>",
			escape(query)
		));
	}

	let mut body = format!(
		"<p>Pick the picture that looks like \u{201c}{}\u{201d}:</p><div class=\"thumbs\">",
		escape(query)
	);
	for (id, url) in offers {
		let _ = write!(
			body,
			"<form action=\"/classify/pick\" method=\"post\">\
			 <img src=\"{}\" alt=\"\" referrerpolicy=\"no-referrer\">\
			 <input type=\"hidden\" name=\"pick\" value=\"{id}\">\
			 <button type=\"submit\">Classify this one</button></form>",
			escape(url.as_str())
		);
	}
	body.push_str("</div>");

	page(&body)
}

pub fn escape(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			c => escaped.push(c),
		}
	}
	escaped
}
