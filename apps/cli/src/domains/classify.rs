use crate::{context::Context, print_output};

use foodie_core::{Node, Outcome, PlainTextPresenter, PredictionResult, Presenter};
use foodie_images::open_image;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
	/// Photo to classify
	pub path: PathBuf,
}

pub async fn run(ctx: &Context, args: ClassifyArgs) -> Result<()> {
	// A file we can't read should not cost a weights download
	let image = open_image(&args.path).map_err(foodie_core::Error::from)?;

	let node = Node::new(&ctx.config).await?;
	let prediction = node.classify(image).await?;

	print_prediction(ctx, &prediction)
}

pub fn print_prediction(ctx: &Context, prediction: &PredictionResult) -> Result<()> {
	print_output!(ctx, prediction, |p: &PredictionResult| {
		print!("{}", PlainTextPresenter.render(&Outcome::Predicted(p)));
	});

	Ok(())
}
