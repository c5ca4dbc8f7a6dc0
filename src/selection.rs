//! Picks one displayable image out of a page of search candidates.
//!
//! Rules:
//! - A candidate resolves to its original variant when present, else to its
//!   large variant; a candidate with neither resolves to nothing.
//! - Up to `candidates.len()` uniform draws (with replacement) look for a
//!   landscape image taken from an original variant and stop at the first hit.
//!   A large-only landscape does not stop the draws, so a landscape original
//!   elsewhere on the page still wins over it.
//! - When the draws miss, a scan in result order returns the best-ranked
//!   candidate: original landscape, then large landscape, then anything that
//!   resolves at all.
//! - A candidate without any URL is never returned.

use rand::Rng;

use crate::provider::{Candidate, ImageVariant};

/// The chosen, display-ready image. `url` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl From<ImageVariant<'_>> for SelectedImage {
    fn from(v: ImageVariant<'_>) -> Self {
        Self {
            url: v.url.to_owned(),
            width: v.width,
            height: v.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    OriginalLandscape,
    LargeLandscape,
    Other,
}

fn ranked(candidate: &Candidate) -> Option<(Rank, ImageVariant<'_>)> {
    if let Some(original) = candidate.original() {
        let rank = if original.is_landscape() {
            Rank::OriginalLandscape
        } else {
            Rank::Other
        };
        return Some((rank, original));
    }
    let large = candidate.large()?;
    let rank = if large.is_landscape() {
        Rank::LargeLandscape
    } else {
        Rank::Other
    };
    Some((rank, large))
}

/// Resolve a candidate to an image, preferring the original variant.
#[must_use]
pub fn resolve(candidate: &Candidate) -> Option<SelectedImage> {
    ranked(candidate).map(|(_, variant)| variant.into())
}

/// Select an image from `candidates`; `None` only if no candidate resolves.
pub fn select_image<R: Rng + ?Sized>(
    candidates: &[Candidate],
    rng: &mut R,
) -> Option<SelectedImage> {
    if candidates.is_empty() {
        return None;
    }
    for _ in 0..candidates.len() {
        let drawn = &candidates[rng.random_range(0..candidates.len())];
        if let Some((Rank::OriginalLandscape, variant)) = ranked(drawn) {
            return Some(variant.into());
        }
    }
    fallback(candidates)
}

/// Deterministic best-ranked pick in result order.
fn fallback(candidates: &[Candidate]) -> Option<SelectedImage> {
    let mut best: Option<(Rank, ImageVariant<'_>)> = None;
    for (rank, variant) in candidates.iter().filter_map(ranked) {
        if best.is_none_or(|(best_rank, _)| rank < best_rank) {
            best = Some((rank, variant));
        }
        if rank == Rank::OriginalLandscape {
            break;
        }
    }
    best.map(|(_, variant)| variant.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn original(url: &str, width: u32, height: u32) -> Candidate {
        Candidate {
            url_o: Some(url.into()),
            width_o: Some(width),
            height_o: Some(height),
            ..Candidate::default()
        }
    }

    fn large(url: &str, width: u32, height: u32) -> Candidate {
        Candidate {
            url_l: Some(url.into()),
            width_l: Some(width),
            height_l: Some(height),
            ..Candidate::default()
        }
    }

    fn bare() -> Candidate {
        Candidate::default()
    }

    #[test]
    fn original_variant_wins_over_large() {
        let both = Candidate {
            url_l: Some("l.jpg".into()),
            width_l: Some(1024),
            height_l: Some(768),
            ..original("o.jpg", 4000, 3000)
        };
        let image = resolve(&both).unwrap();
        assert_eq!(image.url, "o.jpg");
        assert_eq!((image.width, image.height), (4000, 3000));

        let mut rng = StdRng::seed_from_u64(11);
        let picked = select_image(std::slice::from_ref(&both), &mut rng).unwrap();
        assert_eq!((picked.width, picked.height), (4000, 3000));
    }

    #[test]
    fn large_variant_used_when_original_absent() {
        let image = resolve(&large("l.jpg", 1024, 768)).unwrap();
        assert_eq!(image.url, "l.jpg");
        assert!(resolve(&bare()).is_none());
    }

    #[test]
    fn empty_slice_selects_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(select_image(&[], &mut rng).is_none());
    }

    #[test]
    fn candidates_without_urls_select_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(select_image(&[bare(), bare(), bare()], &mut rng).is_none());
    }

    #[test]
    fn url_is_non_empty_whenever_any_candidate_resolves() {
        let candidates = vec![bare(), bare(), large("only.jpg", 300, 900), bare()];
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let image = select_image(&candidates, &mut rng).unwrap();
            assert_eq!(image.url, "only.jpg");
        }
    }

    #[test]
    fn fallback_skips_empty_first_candidate() {
        let candidates = vec![
            bare(),
            original("p1.jpg", 600, 900),
            original("p2.jpg", 700, 900),
        ];
        let mut rng = StdRng::seed_from_u64(5);
        let image = select_image(&candidates, &mut rng).unwrap();
        assert_eq!(image.url, "p1.jpg");
    }

    #[test]
    fn single_landscape_among_portraits_is_always_found() {
        for position in [0usize, 7, 19] {
            let mut candidates: Vec<Candidate> = (0..20)
                .map(|i| original(&format!("portrait-{i}.jpg"), 800, 1200))
                .collect();
            candidates[position] = original("landscape.jpg", 1600, 900);
            for seed in 0..50 {
                let mut rng = StdRng::seed_from_u64(seed);
                let image = select_image(&candidates, &mut rng).unwrap();
                assert!(image.width > image.height, "seed {seed} position {position}");
                assert_eq!(image.url, "landscape.jpg");
            }
        }
    }

    #[test]
    fn random_draws_spread_across_landscape_candidates() {
        let candidates: Vec<Candidate> = (0..10)
            .map(|i| original(&format!("wide-{i}.jpg"), 1600, 900))
            .collect();
        let mut rng = StdRng::seed_from_u64(99);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(select_image(&candidates, &mut rng).unwrap().url);
        }
        assert!(seen.len() > 5, "selection should not collapse to one candidate");
    }

    #[test]
    fn ocean_scenario_prefers_landscape_original_for_every_seed() {
        let candidates = vec![
            large("large-only.jpg", 800, 600),
            bare(),
            original("original.jpg", 1920, 1080),
        ];
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let image = select_image(&candidates, &mut rng).unwrap();
            assert_eq!(image.url, "original.jpg", "seed {seed}");
            assert_eq!((image.width, image.height), (1920, 1080));
        }
    }

    #[test]
    fn large_landscape_beats_portrait_original_in_fallback() {
        let candidates = vec![
            original("tall.jpg", 900, 1600),
            large("wide.jpg", 1024, 683),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(select_image(&candidates, &mut rng).unwrap().url, "wide.jpg");
    }
}
