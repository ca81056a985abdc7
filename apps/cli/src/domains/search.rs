use crate::{context::Context, domains::classify::print_prediction, print_output};

use foodie_core::Node;

use anyhow::{anyhow, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

#[derive(Args, Debug)]
pub struct SearchArgs {
	/// What the picture should show, e.g. "kimchi stew"
	pub query: String,

	/// Classify the n-th picture found, counting from 1
	#[arg(long, value_name = "N")]
	pub classify: Option<usize>,
}

#[derive(Debug, Serialize)]
struct Candidate {
	url: String,
	width: u32,
	height: u32,
}

pub async fn run(ctx: &Context, args: SearchArgs) -> Result<()> {
	let node = Node::new(&ctx.config).await?;
	let search = node
		.search()
		.ok_or_else(|| anyhow!("Image search is disabled in the configuration"))?;

	let thumbnails = search
		.candidates(&args.query)
		.await
		.map_err(foodie_core::Error::from)?;

	if let Some(n) = args.classify {
		let found = thumbnails.len();
		let thumbnail = n
			.checked_sub(1)
			.and_then(|i| thumbnails.into_iter().nth(i))
			.ok_or_else(|| anyhow!("Asked for picture {n} but only {found} were found"))?;

		info!(url = %thumbnail.url, "Classifying search result");
		let prediction = node.classify(thumbnail.image).await?;

		return print_prediction(ctx, &prediction);
	}

	let candidates = thumbnails
		.iter()
		.map(|thumbnail| {
			let (width, height) = thumbnail.image.dimensions();
			Candidate {
				url: thumbnail.url.to_string(),
				width,
				height,
			}
		})
		.collect::<Vec<_>>();

	print_output!(ctx, &candidates, |candidates: &Vec<Candidate>| {
		if candidates.is_empty() {
			println!("No usable pictures found, try other words");
			return;
		}

		for (i, candidate) in candidates.iter().enumerate() {
			println!(
				"{}. {} ({}x{})",
				i + 1,
				candidate.url,
				candidate.width,
				candidate.height
			);
		}
		println!();
		println!("Run again with --classify <N> to classify one of them");
	});

	Ok(())
}
