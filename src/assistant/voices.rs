/// Voice id used whenever a (voice, style) pair has no table entry.
pub const FALLBACK_VOICE_ID: &str = "sarah";

/// Voice family → style → synthesis voice id.
const VOICES: &[(&str, &[(&str, &str)])] = &[
    (
        "male",
        &[("casual", "2BJW5coyhAzSr8STdHbE"), ("formal", "c6SfcYrb2t09NHXiT80T")],
    ),
    (
        "female",
        &[("casual", "ZIlrSGI4jZqobxRKprJz"), ("formal", "sarah")],
    ),
    (
        "calm",
        &[("casual", "pFZP5JQG7iQjIQuC4Bku"), ("formal", "EXAVITQu4vr4xnSDxMaL")],
    ),
    (
        "energetic",
        &[("casual", "TX3LPaxmHKxFdv7VOQHJ"), ("formal", "onwK4e9ZLuTAKqWW03F9")],
    ),
];

/// Look up the voice id for a family/style pair. Matching is exact.
pub fn lookup(voice: &str, style: &str) -> Option<&'static str> {
    VOICES
        .iter()
        .find(|(family, _)| *family == voice)
        .and_then(|(_, styles)| styles.iter().find(|(name, _)| *name == style))
        .map(|(_, id)| *id)
}

/// Resolve a voice id, falling back to [`FALLBACK_VOICE_ID`] for any unknown pair.
pub fn resolve(voice: &str, style: &str) -> &'static str {
    lookup(voice, style).unwrap_or(FALLBACK_VOICE_ID)
}
