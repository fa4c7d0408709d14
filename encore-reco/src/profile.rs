use std::collections::HashSet;

use encore_shared::models::profile::MusicProfile;

/// Derived, per-request taste sets for one user. Everything is lowercased.
/// Nothing here is persisted; the profile is rebuilt on every scoring pass.
#[derive(Debug, Clone, Default)]
pub struct TasteProfile {
    pub artists: HashSet<String>,
    pub genres: HashSet<String>,
    pub songs: HashSet<String>,
    /// Broad keyword bag for fuzzy text matching. Holds the tokens pulled
    /// from free-text bio fields plus every collected artist and genre and
    /// the word tokens of every collected song.
    pub bio_keywords: HashSet<String>,
}

/// Split a comma-separated favorites string.
fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

/// Split a free-text bio answer into name phrases. People write things like
/// "Daft Punk and Justice" or "house, techno with a bit of disco".
fn split_phrases(raw: &str) -> Vec<String> {
    let mut phrases = vec![raw.to_string()];
    for delimiter in [",", " and ", " with "] {
        phrases = phrases
            .into_iter()
            .flat_map(|p| {
                p.split(delimiter)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
    }
    phrases
        .into_iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Tokenize free text for the keyword bag: split on anything
/// non-alphanumeric, keep tokens longer than two characters.
fn keyword_tokens(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_lowercase)
}

impl TasteProfile {
    pub fn from_music_profile(profile: &MusicProfile) -> Self {
        let mut taste = TasteProfile::default();

        if let Some(raw) = &profile.favorite_artists {
            taste.artists.extend(split_list(raw));
        }
        if let Some(raw) = &profile.favorite_genres {
            taste.genres.extend(split_list(raw));
        }
        if let Some(raw) = &profile.favorite_songs {
            taste.songs.extend(split_list(raw));
        }

        // Streaming top-lists arrive already name-normalized
        taste
            .artists
            .extend(profile.top_artists.iter().map(|a| a.to_lowercase()));
        taste
            .songs
            .extend(profile.top_tracks.iter().map(|t| t.to_lowercase()));
        taste
            .genres
            .extend(profile.top_genres.iter().map(|g| g.to_lowercase()));

        if let Some(raw) = &profile.music_taste {
            taste.genres.extend(split_phrases(raw));
        }
        if let Some(raw) = &profile.dream_concert {
            taste.artists.extend(split_phrases(raw));
        }
        if let Some(raw) = &profile.go_to_song {
            taste.songs.extend(split_phrases(raw));
        }

        for raw in [&profile.first_song, &profile.must_listen_album, &profile.favorite_albums]
            .into_iter()
            .flatten()
        {
            taste.bio_keywords.extend(keyword_tokens(raw));
        }

        // Direct preference terms count toward fuzzy text matching too. The
        // length filter applies only to the tokenized bio text above, so
        // short names stay eligible for the exact set checks.
        taste.bio_keywords.extend(taste.artists.iter().cloned());
        taste.bio_keywords.extend(taste.genres.iter().cloned());
        for song in &taste.songs {
            taste
                .bio_keywords
                .extend(song.split_whitespace().map(str::to_string));
        }

        taste
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
            && self.genres.is_empty()
            && self.songs.is_empty()
            && self.bio_keywords.is_empty()
    }
}
