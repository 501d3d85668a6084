use serde::{Deserialize, Deserializer};

/// One catalog entry.
///
/// Deserializes from a search result. Fields the server leaves out or sends
/// as `null` keep their default; both the classic field names and the v3
/// ones (`title`, `release_date`, `vote_average`, ...) are understood.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Movie {
  pub id: i64,
  #[serde(deserialize_with = "nullable")]
  pub imdb_id: String,
  #[serde(alias = "title", deserialize_with = "nullable")]
  pub name: String,
  #[serde(alias = "original_title", deserialize_with = "nullable")]
  pub original_name: String,
  #[serde(deserialize_with = "nullable")]
  pub alternative_name: String,
  #[serde(rename = "type", alias = "media_type", deserialize_with = "nullable")]
  pub kind: String,
  #[serde(alias = "original_language", deserialize_with = "nullable")]
  pub language: String,
  #[serde(deserialize_with = "nullable")]
  pub overview: String,
  /// Release date as sent, normally `YYYY-MM-DD`.
  #[serde(alias = "release_date", deserialize_with = "nullable")]
  pub released: String,
  #[serde(deserialize_with = "nullable")]
  pub certification: String,
  #[serde(deserialize_with = "nullable")]
  pub url: String,
  pub adult: bool,
  pub translated: bool,
  pub score: f64,
  pub popularity: f64,
  #[serde(alias = "vote_average")]
  pub rating: f64,
  #[serde(alias = "vote_count")]
  pub votes: u32,
  #[serde(deserialize_with = "nullable")]
  pub last_modified: String,
  pub version: u32,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn search_result_fields() {
    let movie: Movie = serde_json::from_str(
      r#"{
        "id": 78,
        "title": "Blade Runner",
        "original_title": "Blade Runner",
        "original_language": "en",
        "release_date": "1982-06-25",
        "vote_average": 7.9,
        "vote_count": 14000,
        "popularity": 64.2,
        "adult": false,
        "poster_path": null,
        "genre_ids": [878, 18]
      }"#,
    )
    .unwrap();

    assert_eq!(movie.id, 78);
    assert_eq!(movie.name, "Blade Runner");
    assert_eq!(movie.language, "en");
    assert_eq!(movie.released, "1982-06-25");
    assert_eq!(movie.votes, 14000);
    assert!((movie.rating - 7.9).abs() < f64::EPSILON);
    assert!(movie.overview.is_empty());
  }

  #[test]
  fn null_strings_become_empty() {
    let movie: Movie =
      serde_json::from_str(r#"{"id": 1, "imdb_id": null, "overview": null}"#).unwrap();
    assert_eq!(movie.imdb_id, "");
    assert_eq!(movie.overview, "");
  }

  #[test]
  fn classic_names() {
    let movie: Movie = serde_json::from_str(
      r#"{"name": "Alien", "type": "movie", "released": "1979-05-25", "votes": 3, "rating": 8.0}"#,
    )
    .unwrap();
    assert_eq!(movie.name, "Alien");
    assert_eq!(movie.kind, "movie");
    assert_eq!(movie.votes, 3);
  }
}
