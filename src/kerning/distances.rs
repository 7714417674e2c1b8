//! Rebalancing between a kerning class's distance and its pairs.
//!
//! A number is added to the distance value (the side bearing every
//! member glyph inherits from the class) and removed from the class's
//! kerning pairs against every possible partner, or vice versa. The
//! visible kerning of any glyph pair stays the same; only where the
//! value lives changes. Useful to thin out the pair list for
//! environments that render side bearings but ignore kerning.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde_json::json;
use tracing::{debug, info};

use crate::core::config::{GeneratorConfig, Instructions, KernPair};
use crate::core::error::BuildError;
use crate::data::artifacts::write_json;
use crate::font::{Font, Side};

/// Moves a signed amount between one class's distance-table entry and
/// its kerning pairs.
pub struct DistanceRebalancer {
    font: Font,
    data: GeneratorConfig,
    class: Option<String>,
    delta: i32,
}

impl DistanceRebalancer {
    pub fn new(instructions: &Instructions, font: Font) -> Self {
        DistanceRebalancer {
            font,
            data: instructions.generator.clone(),
            class: None,
            delta: 0,
        }
    }

    /// Select the class to work on.
    ///
    /// The class must be defined and its name must start with one of the
    /// side indicators; anything else fails before any mutation.
    pub fn set_class(&mut self, name: &str) -> Result<(), BuildError> {
        if !self.font.features.kerning_classes.contains_key(name) {
            return Err(BuildError::Lookup(format!(
                "kerning class {name:?} is not defined"
            )));
        }
        if self.font.side_of(name).is_none() {
            return Err(BuildError::Config(format!(
                "cannot determine the side of class {name:?}"
            )));
        }
        self.class = Some(name.to_string());
        Ok(())
    }

    /// The amount added to the class's distance entry (and removed from
    /// its pairs).
    pub fn set_delta(&mut self, delta: i32) {
        self.delta = delta;
    }

    /// Apply the rebalance to the font's features.
    ///
    /// Returns `false` for the no-op cases (no class selected, zero
    /// delta). The conservation invariant: for every partner class,
    /// `old pair value + old distance == new pair value + new distance`.
    pub fn rebalance(&mut self) -> Result<bool, BuildError> {
        let Some(class) = self.class.clone() else {
            info!("nothing to do");
            return Ok(false);
        };
        if self.delta == 0 {
            info!("nothing to do");
            return Ok(false);
        }
        let side = self
            .font
            .side_of(&class)
            .ok_or_else(|| {
                BuildError::Config(format!("cannot determine the side of class {class:?}"))
            })?;
        info!("altering the {side:?} sided class {class} by {}", self.delta);

        let partners = self.possible_partners(&class, side);
        debug!("there are {} possible kerning partners", partners.len());
        let existing = self.existing_pairs(&class, side);
        debug!(
            "there are {} existing kerning pairs among {} pairs in total",
            existing.len(),
            self.font.features.kern.len()
        );

        // What is added to the distance is removed from the pairs.
        let change = -self.delta;
        let mut deleted = 0;
        let mut added = 0;
        let mut altered = 0;
        for partner in partners {
            let mut value = change;
            let mut extra = Vec::new();
            let had_pair = existing.contains_key(&partner);
            if let Some(old) = existing.get(&partner) {
                value += old.value;
                extra = old.extra.clone();
                let position = self
                    .font
                    .features
                    .kern
                    .iter()
                    .position(|pair| pair == old)
                    .expect("existing pair came from the kern table");
                self.font.features.kern.remove(position);
            }
            if value != 0 {
                let pair = match side {
                    Side::Left => KernPair {
                        right: partner,
                        left: class.clone(),
                        value,
                        extra,
                    },
                    Side::Right => KernPair {
                        right: class.clone(),
                        left: partner,
                        value,
                        extra,
                    },
                };
                self.font.features.kern.push(pair);
                if had_pair {
                    altered += 1;
                } else {
                    added += 1;
                }
            } else {
                deleted += 1;
            }
        }
        debug!("deleted: {deleted}, added: {added}, altered: {altered}");

        let new_total = self.font.features.distances.get(&class).copied().unwrap_or(0)
            + self.delta;
        if new_total == 0 {
            self.font.features.distances.remove(&class);
            info!("removed {class} from the distances, the value is 0");
        } else {
            self.font
                .features
                .distances
                .insert(class.clone(), new_total);
            info!("the value of {class} in the distances is now {new_total}");
        }
        Ok(true)
    }

    /// Apply the rebalance and write the kerning artifact.
    pub fn generate(&mut self, output_dir: &Path) -> Result<()> {
        if !self.rebalance()? {
            return Ok(());
        }
        let file_name = format!(
            "{}_{}",
            self.font.data.file_name, self.data.generated_kerning_file
        );
        write_json(
            &output_dir.join(file_name),
            &json!({
                "features": {
                    "distances": self.font.features.distances,
                    "kern": self.font.features.kern,
                    "kerningClasses": self.font.features.kerning_classes,
                }
            }),
        )
    }

    /// Read access to the features, for callers inspecting the result.
    pub fn features(&self) -> &crate::core::config::Features {
        &self.font.features
    }

    /// Every defined class on the opposite side.
    fn possible_partners(&self, class: &str, side: Side) -> Vec<String> {
        let opposite = self.font.indicator(side.opposite());
        self.font
            .features
            .kerning_classes
            .keys()
            .filter(|name| name.as_str() != class && name.starts_with(opposite))
            .cloned()
            .collect()
    }

    /// Existing kern entries of the class, keyed by partner.
    fn existing_pairs(&self, class: &str, side: Side) -> HashMap<String, KernPair> {
        let mut pairs = HashMap::new();
        for pair in &self.font.features.kern {
            let (own, partner) = match side {
                Side::Left => (&pair.left, &pair.right),
                Side::Right => (&pair.right, &pair.left),
            };
            if own == class {
                pairs.insert(partner.clone(), pair.clone());
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn instructions() -> Instructions {
        let mut instructions = Instructions::default();
        let classes = &mut instructions.features.kerning_classes;
        classes.insert("@_1R_1_3N".to_string(), "a b".to_string());
        classes.insert("@_1R_1_3Y".to_string(), "c".to_string());
        classes.insert("@_2L_1_3N".to_string(), "a".to_string());
        instructions.features.kern.push(KernPair {
            right: "@_1R_1_3N".to_string(),
            left: "@_2L_1_3N".to_string(),
            value: 10,
            extra: vec![Value::Bool(true)],
        });
        instructions
    }

    fn rebalancer(instructions: &Instructions) -> DistanceRebalancer {
        let font = Font::new(instructions);
        DistanceRebalancer::new(instructions, font)
    }

    #[test]
    fn moves_value_from_pairs_to_the_distance_table() {
        let instructions = instructions();
        let mut rebalancer = rebalancer(&instructions);
        rebalancer.set_class("@_1R_1_3N").unwrap();
        rebalancer.set_delta(3);
        assert!(rebalancer.rebalance().unwrap());

        let features = rebalancer.features();
        assert_eq!(features.distances.get("@_1R_1_3N"), Some(&3));
        let pair = features
            .kern
            .iter()
            .find(|pair| pair.left == "@_2L_1_3N")
            .unwrap();
        // Conservation: 10 + 0 == 7 + 3.
        assert_eq!(pair.value, 7);
        // The opaque tail survives the rewrite.
        assert_eq!(pair.extra, vec![Value::Bool(true)]);
    }

    #[test]
    fn a_pair_driven_to_zero_is_deleted() {
        let instructions = instructions();
        let mut rebalancer = rebalancer(&instructions);
        rebalancer.set_class("@_1R_1_3N").unwrap();
        rebalancer.set_delta(10);
        assert!(rebalancer.rebalance().unwrap());
        assert!(rebalancer.features().kern.is_empty());
        assert_eq!(rebalancer.features().distances.get("@_1R_1_3N"), Some(&10));
    }

    #[test]
    fn missing_pairs_are_created_with_the_inverse_delta() {
        let mut instructions = instructions();
        instructions.features.kern.clear();
        let mut rebalancer = rebalancer(&instructions);
        rebalancer.set_class("@_2L_1_3N").unwrap();
        rebalancer.set_delta(-4);
        assert!(rebalancer.rebalance().unwrap());

        let features = rebalancer.features();
        // Both right-side classes are partners of the left-side class.
        assert_eq!(features.kern.len(), 2);
        for pair in &features.kern {
            assert_eq!(pair.left, "@_2L_1_3N");
            assert_eq!(pair.value, 4);
        }
        assert_eq!(features.distances.get("@_2L_1_3N"), Some(&-4));
    }

    #[test]
    fn a_distance_returning_to_zero_leaves_the_table() {
        let mut instructions = instructions();
        instructions
            .features
            .distances
            .insert("@_1R_1_3N".to_string(), 5);
        let mut rebalancer = rebalancer(&instructions);
        rebalancer.set_class("@_1R_1_3N").unwrap();
        rebalancer.set_delta(-5);
        assert!(rebalancer.rebalance().unwrap());
        assert!(!rebalancer.features().distances.contains_key("@_1R_1_3N"));
    }

    #[test]
    fn unknown_class_fails_without_mutating() {
        let instructions = instructions();
        let mut rebalancer = rebalancer(&instructions);
        assert!(matches!(
            rebalancer.set_class("@_1R_unknown"),
            Err(BuildError::Lookup(_))
        ));
        assert_eq!(rebalancer.features(), &instructions.features);
    }

    #[test]
    fn sideless_class_fails_without_mutating() {
        let mut instructions = instructions();
        instructions
            .features
            .kerning_classes
            .insert("nirvana".to_string(), "a".to_string());
        let mut rebalancer = rebalancer(&instructions);
        assert!(matches!(
            rebalancer.set_class("nirvana"),
            Err(BuildError::Config(_))
        ));
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let instructions = instructions();
        let mut rebalancer = rebalancer(&instructions);
        rebalancer.set_class("@_1R_1_3N").unwrap();
        rebalancer.set_delta(0);
        assert!(!rebalancer.rebalance().unwrap());
        assert_eq!(rebalancer.features(), &instructions.features);
    }
}
