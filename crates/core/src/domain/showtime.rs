// Showtime Domain Model (the entity fronted by the side-cache)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type ShowtimeId = u64;

/// A screening of a film in a hall
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Showtime {
    pub id: ShowtimeId,
    pub film_title: String,
    pub starts_at: NaiveDateTime,
    pub hall_id: u64,
}

/// Showtime fields supplied by a caller; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShowtime {
    pub film_title: String,
    pub starts_at: NaiveDateTime,
    pub hall_id: u64,
}

impl NewShowtime {
    pub fn into_showtime(self, id: ShowtimeId) -> Showtime {
        Showtime {
            id,
            film_title: self.film_title,
            starts_at: self.starts_at,
            hall_id: self.hall_id,
        }
    }
}
