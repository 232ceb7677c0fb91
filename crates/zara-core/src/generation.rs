//! Image-generation request contract.
//!
//! Only what the credit ledger gates is modelled here; how the request is
//! sent to an image service is up to the caller.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::persona::DEFAULT_IMAGE_MODEL;

/// Exclusive upper bound of random seeds.
pub const SEED_RANGE: u32 = 1_000_000;

/// Style value meaning "no style prefix".
pub const NO_STYLE: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    Square,
    Landscape,
    Portrait,
    Standard,
    Tall,
}

impl AspectRatio {
    /// Parses `"16:9"`-style labels. Unknown labels fall back to square.
    pub fn parse(label: &str) -> Self {
        match label.trim() {
            "16:9" => AspectRatio::Landscape,
            "9:16" => AspectRatio::Portrait,
            "4:3" => AspectRatio::Standard,
            "3:4" => AspectRatio::Tall,
            _ => AspectRatio::Square,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Standard => "4:3",
            AspectRatio::Tall => "3:4",
        }
    }

    /// Pixel `(width, height)`.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            AspectRatio::Square => (1024, 1024),
            AspectRatio::Landscape => (1280, 720),
            AspectRatio::Portrait => (720, 1280),
            AspectRatio::Standard => (1024, 768),
            AspectRatio::Tall => (768, 1024),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub model: String,
    pub aspect_ratio: AspectRatio,
    pub width: u32,
    pub height: u32,
    pub seed: u32,
}

impl ImageRequest {
    /// New request with a random seed. An empty model means the default.
    pub fn new(prompt: impl Into<String>, model: &str, aspect_ratio: AspectRatio) -> Self {
        let seed = rand::thread_rng().gen_range(0..SEED_RANGE);
        Self::with_seed(prompt, model, aspect_ratio, seed)
    }

    pub fn with_seed(
        prompt: impl Into<String>,
        model: &str,
        aspect_ratio: AspectRatio,
        seed: u32,
    ) -> Self {
        let (width, height) = aspect_ratio.dimensions();
        let model = if model.trim().is_empty() {
            DEFAULT_IMAGE_MODEL
        } else {
            model
        };
        Self {
            prompt: prompt.into(),
            model: model.to_string(),
            aspect_ratio,
            width,
            height,
            seed,
        }
    }
}

/// Folds the chosen style and the persona prompt into the user's prompt.
///
/// Empty parts and the `"none"` style are skipped.
pub fn compose_prompt(user_prompt: &str, style: Option<&str>, system_prompt: &str) -> String {
    let style = style.filter(|style| !style.eq_ignore_ascii_case(NO_STYLE));
    [Some(user_prompt), style, Some(system_prompt)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_dimensions() {
        assert_eq!(AspectRatio::parse("16:9").dimensions(), (1280, 720));
        assert_eq!(AspectRatio::parse("9:16").dimensions(), (720, 1280));
        assert_eq!(AspectRatio::parse("4:3").dimensions(), (1024, 768));
        assert_eq!(AspectRatio::parse("3:4").dimensions(), (768, 1024));
        assert_eq!(AspectRatio::parse("21:9"), AspectRatio::Square);
        assert_eq!(AspectRatio::Landscape.to_string(), "16:9");
    }

    #[test]
    fn test_seed_in_range_and_model_default() {
        for _ in 0..50 {
            let request = ImageRequest::new("cat", "", AspectRatio::Square);
            assert!(request.seed < SEED_RANGE);
            assert_eq!(request.model, "flux");
            assert_eq!((request.width, request.height), (1024, 1024));
        }
    }

    #[test]
    fn test_compose_prompt() {
        assert_eq!(
            compose_prompt("a cat", Some("watercolor"), "soft light"),
            "a cat, watercolor, soft light"
        );
        assert_eq!(compose_prompt("a cat", Some("none"), "soft light"), "a cat, soft light");
        assert_eq!(compose_prompt("a cat", None, ""), "a cat");
    }
}
