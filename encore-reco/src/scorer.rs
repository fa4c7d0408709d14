use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::profile::TasteProfile;
use encore_catalog::event::Event;
use encore_core::repository::UsageReporter;
use encore_shared::models::usage::ImpressionUsageEvent;
use encore_store::app_config::ScoringConfig;

/// Personalized relevance scoring for catalog events.
pub struct EventScorer {
    config: ScoringConfig,
    telemetry: Option<Arc<dyn UsageReporter>>,
}

impl EventScorer {
    pub fn new(config: ScoringConfig, telemetry: Option<Arc<dyn UsageReporter>>) -> Self {
        Self { config, telemetry }
    }

    /// Relevance of one event for one taste profile. Pure and deterministic;
    /// an empty profile scores zero for every event.
    pub fn score(&self, event: &Event, profile: &TasteProfile) -> f64 {
        if profile.is_empty() {
            return 0.0;
        }

        let mut score = 0.0;

        for artist in &event.tags_artists {
            if profile.artists.contains(&artist.to_lowercase()) {
                score += self.config.artist_weight;
            }
        }

        for genre in &event.tags_genres {
            let genre = genre.to_lowercase();
            if profile.genres.contains(&genre) {
                score += self.config.genre_weight;
                // A genre the user also volunteered in free text counts
                // again at half the bio weight
                if profile.bio_keywords.contains(&genre) {
                    score += self.config.bio_weight * 0.5;
                }
            }
        }

        for song in &event.tags_songs {
            if profile.songs.contains(&song.to_lowercase()) {
                score += self.config.song_weight;
            }
        }

        // Fuzzy pass over title + description. Substring containment, not
        // word boundaries; tokens of three characters or more only.
        let event_text = format!(
            "{} {}",
            event.title,
            event.description.as_deref().unwrap_or("")
        )
        .to_lowercase();
        for keyword in &profile.bio_keywords {
            if keyword.len() > 2 && event_text.contains(keyword.as_str()) {
                score += self.config.bio_weight * 0.2;
            }
        }

        score
    }

    /// Sort events by descending relevance (stable, so upstream order holds
    /// for ties) and report one impression event for the ranked list.
    pub async fn rank(&self, events: &mut Vec<Event>, profile: &TasteProfile, user_id: Option<Uuid>) {
        let mut scored: Vec<(Event, f64)> = events
            .drain(..)
            .map(|event| {
                let score = self.score(&event, profile);
                (event, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        *events = scored.into_iter().map(|(event, _)| event).collect();

        if let Some(ref tel) = self.telemetry {
            let impression = ImpressionUsageEvent {
                user_id,
                event_ids: events.iter().map(|e| e.id).collect(),
                timestamp: Utc::now().timestamp(),
            };
            let _ = tel.report_impression_usage(impression).await;
        }
    }
}
