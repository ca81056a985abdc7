use crate::{context::Context, print_output};

use foodie_core::load_catalog;

use anyhow::Result;

pub fn run(ctx: &Context) -> Result<()> {
	let catalog = load_catalog(&ctx.config)?;

	print_output!(ctx, catalog.labels(), |labels: &[String]| {
		for (index, label) in labels.iter().enumerate() {
			let card = if catalog.lookup(label).is_some() {
				""
			} else {
				"  (no card)"
			};
			println!("{index:>3}  {label}{card}");
		}
	});

	Ok(())
}
