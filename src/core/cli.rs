//! Command line interface for the grid font builder.
//!
//! Handles parsing command line arguments and validates user inputs
//! before anything touches the filesystem.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// gridfont CLI arguments
///
/// Examples:
///   gridfont font demo/font.json              # Build the UFO font
///   gridfont classes -l 2 -r 1 demo/font.json # Derive kerning classes
///   gridfont dist -A 3 @_1R_2_4N2Y demo/font.json
///                                             # Move 3 units of kerning
///                                             # into the class distance
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "gridfont",
    version,
    about = "Builds vector fonts from pixel-grid glyph sources",
    long_about = "gridfont turns pixel-grid glyph descriptions into vector outlines \
with optionally rounded corners and writes them as a UFO package. It also derives \
kerning classes from matching glyph edges and rebalances kerning between class \
distances and explicit pairs."
)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: Command,

    /// Print more status messages; repeat for even more
    #[clap(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print only errors
    #[clap(short, long, global = true)]
    pub quiet: bool,

    /// Directory the generated files are written to
    #[clap(long, global = true, default_value = "generated")]
    pub output_dir: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a UFO font from the instructions
    Font {
        /// The instructions JSON file describing the font
        instructions: PathBuf,
    },
    /// Derive kerning classes from matching glyph edges
    Classes {
        /// Width of the left edge (these classes later sit on the right
        /// side of a kerning pair); 0 skips the left side
        #[clap(short, long, default_value_t = 1)]
        left: usize,
        /// Width of the right edge (these classes later sit on the left
        /// side of a kerning pair); 0 skips the right side
        #[clap(short, long, default_value_t = 1)]
        right: usize,
        /// The instructions JSON file describing the font
        instructions: PathBuf,
    },
    /// Move kerning between a class's distance and its explicit pairs
    ///
    /// The given amount is added to the class's distance value (its
    /// contribution to member glyphs' side bearing) and removed from all
    /// possible kerning partners, so the rendered kerning stays the same.
    Dist {
        /// Amount to add to the class's distance
        #[clap(short = 'A', long, default_value_t = 0)]
        add: i32,
        /// Amount to remove from the class's distance
        #[clap(short = 'R', long, default_value_t = 0)]
        remove: i32,
        /// The kerning class to work on
        class: String,
        /// The instructions JSON file describing the font
        instructions: PathBuf,
    },
}

impl CliArgs {
    /// The instructions path of whichever subcommand was given.
    pub fn instructions(&self) -> &PathBuf {
        match &self.command {
            Command::Font { instructions }
            | Command::Classes { instructions, .. }
            | Command::Dist { instructions, .. } => instructions,
        }
    }

    /// Validate the CLI arguments after parsing.
    ///
    /// This ensures the instructions file exists before the run starts,
    /// giving a clear error message for the most common mistake.
    pub fn validate(&self) -> Result<(), String> {
        let path = self.instructions();
        if !path.exists() {
            return Err(format!(
                "Instructions file does not exist: {}\nMake sure the path is correct.",
                path.display()
            ));
        }
        if !path.is_file() {
            return Err(format!(
                "Instructions path is not a file: {}",
                path.display()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_classes_subcommand() {
        let args =
            CliArgs::parse_from(["gridfont", "classes", "-l", "2", "-r", "0", "font.json"]);
        match args.command {
            Command::Classes { left, right, instructions } => {
                assert_eq!(left, 2);
                assert_eq!(right, 0);
                assert_eq!(instructions, PathBuf::from("font.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_the_dist_subcommand() {
        let args = CliArgs::parse_from([
            "gridfont", "dist", "-A", "5", "-R", "2", "@_1R_1_3N", "font.json",
        ]);
        match args.command {
            Command::Dist { add, remove, class, .. } => {
                assert_eq!(add, 5);
                assert_eq!(remove, 2);
                assert_eq!(class, "@_1R_1_3N");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_apply_after_the_subcommand() {
        let args = CliArgs::parse_from([
            "gridfont",
            "font",
            "font.json",
            "-vv",
            "--output-dir",
            "out",
        ]);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn missing_instructions_fail_validation() {
        let args = CliArgs::parse_from(["gridfont", "font", "no/such/file.json"]);
        assert!(args.validate().is_err());
    }
}
