//! Dispatches a parsed command line into the matching generator run.

use anyhow::Result;
use tracing::{debug, info};

use crate::core::cli::{CliArgs, Command};
use crate::core::config;
use crate::data::UfoGenerator;
use crate::font::Font;
use crate::kerning::{DistanceRebalancer, KerningClassBuilder};

/// Run one build according to the CLI arguments.
pub fn run(args: CliArgs) -> Result<()> {
    let instructions = config::load_instructions(args.instructions())?;
    debug!(
        "the font source folder is {:?}",
        instructions.font.folder.as_deref()
    );

    match &args.command {
        Command::Font { .. } => {
            info!("generating a font from the instructions");
            let font = Font::from_folder(&instructions)?;
            let mut generator = UfoGenerator::new(&instructions, font);
            generator.generate(&args.output_dir)?;
        }
        Command::Classes { left, right, .. } => {
            info!("generating classes for kerning: left is {left}, right is {right}");
            let font = Font::from_folder(&instructions)?;
            let mut generator = KerningClassBuilder::new(&instructions, font);
            generator.set_left_edge(*left);
            generator.set_right_edge(*right);
            generator.generate(&args.output_dir)?;
        }
        Command::Dist {
            add,
            remove,
            class,
            ..
        } => {
            info!("rebalancing the distances");
            // The glyph files are not needed to move kerning around.
            let font = Font::new(&instructions);
            let mut generator = DistanceRebalancer::new(&instructions, font);
            generator.set_class(class)?;
            generator.set_delta(add - remove);
            generator.generate(&args.output_dir)?;
        }
    }
    info!("OK");
    Ok(())
}
