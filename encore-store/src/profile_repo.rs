use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use encore_core::repository::ProfileRepository;
use encore_shared::models::profile::MusicProfile;

pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MusicProfileRow {
    favorite_artists: Option<String>,
    favorite_genres: Option<String>,
    favorite_songs: Option<String>,
    favorite_albums: Option<String>,
    top_artists: Option<Vec<String>>,
    top_tracks: Option<Vec<String>>,
    top_genres: Option<Vec<String>>,
    music_taste: Option<String>,
    dream_concert: Option<String>,
    go_to_song: Option<String>,
    first_song: Option<String>,
    must_listen_album: Option<String>,
}

impl From<MusicProfileRow> for MusicProfile {
    fn from(row: MusicProfileRow) -> Self {
        MusicProfile {
            favorite_artists: row.favorite_artists,
            favorite_genres: row.favorite_genres,
            favorite_songs: row.favorite_songs,
            favorite_albums: row.favorite_albums,
            top_artists: row.top_artists.unwrap_or_default(),
            top_tracks: row.top_tracks.unwrap_or_default(),
            top_genres: row.top_genres.unwrap_or_default(),
            music_taste: row.music_taste,
            dream_concert: row.dream_concert,
            go_to_song: row.go_to_song,
            first_song: row.first_song,
            must_listen_album: row.must_listen_album,
        }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn music_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<MusicProfile>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, MusicProfileRow>(
            "SELECT favorite_artists, favorite_genres, favorite_songs, favorite_albums, \
                    top_artists, top_tracks, top_genres, music_taste, dream_concert, \
                    go_to_song, first_song, must_listen_album \
             FROM music_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MusicProfile::from))
    }
}
