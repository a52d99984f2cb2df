//! Genre guess from tempo, timbre and dynamics
//!
//! Every genre scores a handful of weighted feature checks; the best total
//! wins and doubles as the confidence.

/// Features the genre scorers look at
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenreFeatures {
    pub bpm: f32,
    pub energy: f32,
    /// Hz
    pub spectral_centroid: f32,
    /// dB
    pub dynamic_range: f32,
    pub zero_crossing_rate: f32,
}

/// Scorers in tie-break order
const GENRES: [(&str, fn(&GenreFeatures) -> f32); 10] = [
    ("House", house),
    ("Techno", techno),
    ("Drum & Bass", drum_and_bass),
    ("Trance", trance),
    ("Dubstep", dubstep),
    ("Hip Hop", hip_hop),
    ("Rock", rock),
    ("Pop", pop),
    ("Ambient", ambient),
    ("Jazz", jazz),
];

/// Best matching genre and its score (0.0 - 1.0)
///
/// Ties go to the genre listed first.
pub fn classify_genre(features: &GenreFeatures) -> (&'static str, f32) {
    GENRES
        .iter()
        .map(|(name, score)| (*name, score(features)))
        .fold(("House", f32::MIN), |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        })
}

fn weigh(checks: &[(bool, f32)]) -> f32 {
    checks.iter().filter(|(hit, _)| *hit).map(|(_, w)| w).sum()
}

fn between(value: f32, lo: f32, hi: f32) -> bool {
    (lo..=hi).contains(&value)
}

fn house(f: &GenreFeatures) -> f32 {
    weigh(&[
        (between(f.bpm, 118.0, 130.0), 0.3),
        (f.spectral_centroid > 2000.0 && f.spectral_centroid < 5000.0, 0.2),
        (f.energy > 0.3, 0.2),
        (f.dynamic_range < 30.0, 0.2),
        (f.zero_crossing_rate > 0.05, 0.1),
    ])
}

fn techno(f: &GenreFeatures) -> f32 {
    weigh(&[
        (between(f.bpm, 120.0, 150.0), 0.3),
        (f.spectral_centroid > 3000.0, 0.2),
        (f.energy > 0.4, 0.2),
        (f.dynamic_range < 25.0, 0.2),
        (f.zero_crossing_rate > 0.08, 0.1),
    ])
}

fn drum_and_bass(f: &GenreFeatures) -> f32 {
    weigh(&[
        (between(f.bpm, 160.0, 180.0), 0.4),
        (f.energy > 0.5, 0.2),
        (f.spectral_centroid > 4000.0, 0.15),
        (f.dynamic_range > 35.0, 0.15),
        (f.zero_crossing_rate > 0.1, 0.1),
    ])
}

fn trance(f: &GenreFeatures) -> f32 {
    weigh(&[
        (between(f.bpm, 128.0, 145.0), 0.3),
        (f.energy > 0.35, 0.2),
        (f.dynamic_range > 30.0, 0.2),
        (f.spectral_centroid > 2500.0, 0.15),
    ])
}

fn dubstep(f: &GenreFeatures) -> f32 {
    weigh(&[
        (between(f.bpm, 135.0, 145.0), 0.25),
        (f.spectral_centroid > 5000.0, 0.2),
        (f.dynamic_range > 40.0, 0.2),
        (f.zero_crossing_rate > 0.12, 0.2),
        (f.energy > 0.6, 0.15),
    ])
}

fn hip_hop(f: &GenreFeatures) -> f32 {
    weigh(&[
        (between(f.bpm, 80.0, 110.0), 0.3),
        (f.dynamic_range > 35.0, 0.2),
        (f.spectral_centroid < 2500.0, 0.2),
        (f.zero_crossing_rate < 0.06, 0.15),
        (f.energy < 0.3, 0.15),
    ])
}

fn rock(f: &GenreFeatures) -> f32 {
    weigh(&[
        (between(f.bpm, 100.0, 140.0), 0.25),
        (f.energy > 0.45, 0.25),
        (f.dynamic_range > 35.0, 0.2),
        (f.spectral_centroid > 3000.0, 0.15),
        (f.zero_crossing_rate > 0.07, 0.15),
    ])
}

fn pop(f: &GenreFeatures) -> f32 {
    weigh(&[
        (between(f.bpm, 100.0, 130.0), 0.3),
        (f.energy > 0.3 && f.energy < 0.6, 0.25),
        (f.dynamic_range < 35.0, 0.2),
        (f.spectral_centroid > 2000.0 && f.spectral_centroid < 4500.0, 0.15),
        (f.zero_crossing_rate > 0.04, 0.1),
    ])
}

fn ambient(f: &GenreFeatures) -> f32 {
    weigh(&[
        (f.energy < 0.2, 0.4),
        (f.dynamic_range < 25.0, 0.25),
        (f.spectral_centroid < 2000.0, 0.2),
        (f.zero_crossing_rate < 0.03, 0.15),
    ])
}

fn jazz(f: &GenreFeatures) -> f32 {
    weigh(&[
        (between(f.bpm, 60.0, 120.0), 0.3),
        (f.dynamic_range > 30.0, 0.25),
        (f.spectral_centroid < 3000.0, 0.2),
        (f.zero_crossing_rate < 0.05, 0.15),
    ])
}
