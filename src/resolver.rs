use crate::platform::{CatalogAdapter, PlatformResult};
use crate::track::Track;

/// Maps a generic track description to a platform-native track via the target
/// catalog's own search.
pub struct TrackResolver;

impl TrackResolver {
    /// One query, first hit wins. No scoring and no disambiguation: resolution
    /// quality is bounded by the target platform's search relevance, and a
    /// second-guessing layer here would only hide that. Zero results means the
    /// track is unresolved, never an error.
    pub async fn resolve(
        target: &dyn CatalogAdapter,
        track: &Track,
    ) -> PlatformResult<Option<Track>> {
        target.search_track(&Self::search_term(track)).await
    }

    /// Query shape is `"<name> <artist>"`, passed through unescaped. Operator
    /// characters in names are the upstream search engine's problem.
    pub fn search_term(track: &Track) -> String {
        format!("{} {}", track.name, track.artist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_term_is_name_then_artist() {
        let track = Track::new(
            "Song A".to_string(),
            "Artist X".to_string(),
            "Album Z".to_string(),
        );
        assert_eq!(TrackResolver::search_term(&track), "Song A Artist X");
    }

    #[test]
    fn test_search_term_keeps_operator_characters() {
        let track = Track::new(
            "AC/DC: \"Back\" (in Black)".to_string(),
            "AC/DC".to_string(),
            "".to_string(),
        );
        assert_eq!(
            TrackResolver::search_term(&track),
            "AC/DC: \"Back\" (in Black) AC/DC"
        );
    }
}
