use serde::{Deserialize, Serialize};

/// Raw music-preference record for one user, as stored.
///
/// Manual favorites are comma-separated free text; the streaming top-lists
/// arrive already name-normalized from the linked service. The remaining
/// fields are free-text bio answers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MusicProfile {
    pub favorite_artists: Option<String>,
    pub favorite_genres: Option<String>,
    pub favorite_songs: Option<String>,
    pub favorite_albums: Option<String>,
    #[serde(default)]
    pub top_artists: Vec<String>,
    #[serde(default)]
    pub top_tracks: Vec<String>,
    #[serde(default)]
    pub top_genres: Vec<String>,
    pub music_taste: Option<String>,
    pub dream_concert: Option<String>,
    pub go_to_song: Option<String>,
    pub first_song: Option<String>,
    pub must_listen_album: Option<String>,
}
